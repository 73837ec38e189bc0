//! API integration tests
//!
//! These run against a live server backed by a database.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:3000/api";

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// Create a member and return its id and username
async fn create_member(client: &Client, password: &str) -> (String, String) {
    let username = unique("member");
    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "username": username,
            "password": password,
            "name": "Integration Member",
            "email": format!("{}@example.org", username)
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    let id = body["user"]["id"].as_str().expect("No user id").to_string();
    (id, username)
}

/// Create a book with the given number of copies and return its id
async fn create_book(client: &Client, copies: i32) -> String {
    let response = client
        .post(format!("{}/libros", BASE_URL))
        .json(&json!({
            "title": "Cien años de soledad",
            "author": "Gabriel García Márquez",
            "isbn": unique("isbn"),
            "totalCopies": copies
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["book"]["id"].as_str().expect("No book id").to_string()
}

async fn book_stock(client: &Client, book_id: &str) -> i64 {
    let body: Value = client
        .get(format!("{}/libros/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    body["book"]["stock"].as_i64().expect("No stock")
}

async fn borrow(client: &Client, book_id: &str, user_id: &str) -> reqwest::Response {
    client
        .post(format!("{}/prestamos", BASE_URL))
        .json(&json!({
            "bookId": book_id,
            "userId": user_id,
            "dueDate": "2099-01-01"
        }))
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();
    let (_, username) = create_member(&client, "secreto").await;

    let response = client
        .post(format!("{}/login", BASE_URL))
        .json(&json!({ "username": username, "password": "secreto" }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["username"], username.as_str());
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();
    let (_, username) = create_member(&client, "secreto").await;

    let response = client
        .post(format!("{}/login", BASE_URL))
        .json(&json!({ "username": username, "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_isbn_rejected() {
    let client = Client::new();
    let isbn = unique("isbn");
    let payload = json!({ "title": "Ficciones", "author": "Jorge Luis Borges", "isbn": isbn });

    let first = client
        .post(format!("{}/libros", BASE_URL))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = client
        .post(format!("{}/libros", BASE_URL))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);

    let body: Value = second.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Error: El ISBN ya existe en la base de datos.");
}

/// Exercises the two database guards: checkout only decrements while
/// `stock > 0`, and a return only restocks while `status <> 'returned'`.
#[tokio::test]
#[ignore]
async fn test_loan_lifecycle_conserves_stock() {
    let client = Client::new();
    let (user_id, _) = create_member(&client, "secreto").await;
    let book_id = create_book(&client, 1).await;

    let response = borrow(&client, &book_id, &user_id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["loan"]["id"].as_str().expect("No loan id").to_string();
    assert_eq!(body["loan"]["status"], "active");
    assert_eq!(book_stock(&client, &book_id).await, 0);

    // No copies left
    let response = borrow(&client, &book_id, &user_id).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Libro no disponible");

    let response = client
        .put(format!("{}/prestamos/{}/return", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["loan"]["status"], "returned");
    assert!(body["loan"]["returnDate"].is_string());
    assert_eq!(book_stock(&client, &book_id).await, 1);

    // Returning twice does not restock
    let response = client
        .put(format!("{}/prestamos/{}/return", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(book_stock(&client, &book_id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_member_loans_are_scoped() {
    let client = Client::new();
    let (member_a, _) = create_member(&client, "secreto").await;
    let (member_b, _) = create_member(&client, "secreto").await;
    let book_id = create_book(&client, 2).await;

    assert_eq!(borrow(&client, &book_id, &member_a).await.status(), StatusCode::OK);
    assert_eq!(borrow(&client, &book_id, &member_b).await.status(), StatusCode::OK);

    let body: Value = client
        .get(format!("{}/prestamos?userId={}&role=user", BASE_URL, member_a))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let loans = body["loans"].as_array().expect("No loans array");
    assert!(!loans.is_empty());
    assert!(loans.iter().all(|l| l["userId"]["id"] == member_a.as_str()));
}

#[tokio::test]
#[ignore]
async fn test_delete_unknown_book() {
    let client = Client::new();

    let response = client
        .delete(format!("{}/libros/{}", BASE_URL, Uuid::new_v4()))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_loans_listed_oldest_first() {
    let client = Client::new();
    let (member, _) = create_member(&client, "secreto").await;
    let first_book = create_book(&client, 1).await;
    let second_book = create_book(&client, 1).await;

    assert_eq!(borrow(&client, &first_book, &member).await.status(), StatusCode::OK);
    assert_eq!(borrow(&client, &second_book, &member).await.status(), StatusCode::OK);

    let body: Value = client
        .get(format!("{}/prestamos?userId={}&role=user", BASE_URL, member))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let loans = body["loans"].as_array().expect("No loans array");
    assert_eq!(loans.len(), 2);
    assert_eq!(loans[0]["bookId"]["id"], first_book.as_str());
    assert_eq!(loans[1]["bookId"]["id"], second_book.as_str());
}
