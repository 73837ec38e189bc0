//! Book catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::book::{Book, CreateBook, UpdateBook},
};

use super::{ApiJson, MessageResponse};

/// Book list response
#[derive(Serialize, ToSchema)]
pub struct BooksResponse {
    pub success: bool,
    pub books: Vec<Book>,
}

/// Single book response
#[derive(Serialize, ToSchema)]
pub struct BookResponse {
    pub success: bool,
    pub book: Book,
}

/// List all books
#[utoipa::path(
    get,
    path = "/libros",
    tag = "books",
    responses(
        (status = 200, description = "List of books", body = BooksResponse)
    )
)]
pub async fn list_books(State(state): State<crate::AppState>) -> AppResult<Json<BooksResponse>> {
    let books = state.services.catalog.list_books().await?;

    Ok(Json(BooksResponse {
        success: true,
        books,
    }))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/libros/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<BookResponse>> {
    let book = state.services.catalog.get_book(&id).await?;

    Ok(Json(BookResponse {
        success: true,
        book,
    }))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/libros",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Invalid input or ISBN already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    ApiJson(book): ApiJson<CreateBook>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    let created = state.services.catalog.create_book(book).await?;

    Ok((
        StatusCode::CREATED,
        Json(BookResponse {
            success: true,
            book: created,
        }),
    ))
}

/// Update an existing book
#[utoipa::path(
    put,
    path = "/libros/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 400, description = "Invalid input or ISBN already exists", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    ApiJson(book): ApiJson<UpdateBook>,
) -> AppResult<Json<BookResponse>> {
    let updated = state.services.catalog.update_book(&id, book).await?;

    Ok(Json(BookResponse {
        success: true,
        book: updated,
    }))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/libros/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.catalog.delete_book(&id).await?;

    Ok(Json(MessageResponse::ok("Libro eliminado exitosamente")))
}
