//! Catalog (books) management service

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, CreateBook, UpdateBook},
    repository::Repository,
};

use super::parse_id;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List all books
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: &str) -> AppResult<Book> {
        let Some(id) = parse_id(id) else {
            return Err(book_not_found());
        };

        self.repository
            .books
            .get_by_id(id)
            .await?
            .ok_or_else(book_not_found)
    }

    /// Add a book to the catalog
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let record = Book {
            id: Uuid::new_v4(),
            total_copies: book.total_copies(),
            stock: book.initial_stock(),
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            category: book.category,
            publish_year: book.publish_year,
            description: book.description,
            cover_image: book.cover_image,
            created_at: Utc::now(),
        };

        let created = self.repository.books.create(&record).await?;
        tracing::info!(book_id = %created.id, isbn = %created.isbn, "Book created");

        Ok(created)
    }

    /// Update an existing book; absent fields are kept
    pub async fn update_book(&self, id: &str, update: UpdateBook) -> AppResult<Book> {
        update
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let Some(id) = parse_id(id) else {
            return Err(book_not_found());
        };

        self.repository
            .books
            .update(id, &update)
            .await?
            .ok_or_else(book_not_found)
    }

    /// Remove a book from the catalog
    pub async fn delete_book(&self, id: &str) -> AppResult<()> {
        let Some(id) = parse_id(id) else {
            return Err(book_not_found());
        };

        if !self.repository.books.delete(id).await? {
            return Err(book_not_found());
        }

        tracing::info!(book_id = %id, "Book deleted");
        Ok(())
    }
}

fn book_not_found() -> AppError {
    AppError::NotFound("Libro no encontrado".to_string())
}
