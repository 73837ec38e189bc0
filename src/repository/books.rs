//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, UpdateBook},
};

/// Message returned when an ISBN is already catalogued
pub const DUPLICATE_ISBN_MESSAGE: &str = "Error: El ISBN ya existe en la base de datos.";

/// Persistence operations on the books collection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksStore: Send + Sync {
    /// List all books
    async fn list(&self) -> AppResult<Vec<Book>>;

    /// Get book by ID
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Book>>;

    /// Insert a new book
    async fn create(&self, book: &Book) -> AppResult<Book>;

    /// Apply a partial update; `None` when the book does not exist
    async fn update(&self, id: Uuid, book: &UpdateBook) -> AppResult<Option<Book>>;

    /// Delete a book, returning whether a row was removed
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BooksStore for BooksRepository {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    async fn create(&self, book: &Book) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                id, title, author, isbn, category, publish_year,
                total_copies, stock, description, cover_image, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.category)
        .bind(book.publish_year)
        .bind(book.total_copies)
        .bind(book.stock)
        .bind(&book.description)
        .bind(&book.cover_image)
        .bind(book.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_ISBN_MESSAGE))
    }

    async fn update(&self, id: Uuid, book: &UpdateBook) -> AppResult<Option<Book>> {
        let mut sets: Vec<String> = Vec::new();
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(book.title, "title");
        add_field!(book.author, "author");
        add_field!(book.isbn, "isbn");
        add_field!(book.category, "category");
        add_field!(book.publish_year, "publish_year");
        add_field!(book.total_copies, "total_copies");
        add_field!(book.stock, "stock");
        add_field!(book.description, "description");
        add_field!(book.cover_image, "cover_image");

        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        let query = format!("UPDATE books SET {} WHERE id = $1 RETURNING *", sets.join(", "));

        let mut builder = sqlx::query_as::<_, Book>(&query).bind(id);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(book.title);
        bind_field!(book.author);
        bind_field!(book.isbn);
        bind_field!(book.category);
        bind_field!(book.publish_year);
        bind_field!(book.total_copies);
        bind_field!(book.stock);
        bind_field!(book.description);
        bind_field!(book.cover_image);

        builder
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_ISBN_MESSAGE))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
