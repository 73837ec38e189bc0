//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: Option<String>,
    pub publish_year: Option<i32>,
    pub total_copies: i32,
    /// Copies currently available for loan
    pub stock: i32,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.stock > 0
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "author is required"))]
    pub author: String,
    #[validate(length(min = 1, max = 32, message = "isbn is required"))]
    pub isbn: String,
    pub category: Option<String>,
    pub publish_year: Option<i32>,
    #[validate(range(min = 0, message = "totalCopies cannot be negative"))]
    pub total_copies: Option<i32>,
    #[validate(range(min = 0, message = "stock cannot be negative"))]
    pub stock: Option<i32>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
}

impl CreateBook {
    /// Total copies, one when not given
    pub fn total_copies(&self) -> i32 {
        self.total_copies.unwrap_or(1)
    }

    /// Initial stock, all copies available when not given
    pub fn initial_stock(&self) -> i32 {
        self.stock.unwrap_or_else(|| self.total_copies())
    }
}

/// Partial book update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "author cannot be empty"))]
    pub author: Option<String>,
    #[validate(length(min = 1, max = 32, message = "isbn cannot be empty"))]
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub publish_year: Option<i32>,
    #[validate(range(min = 0, message = "totalCopies cannot be negative"))]
    pub total_copies: Option<i32>,
    #[validate(range(min = 0, message = "stock cannot be negative"))]
    pub stock: Option<i32>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_book_defaults() {
        let book: CreateBook = serde_json::from_value(serde_json::json!({
            "title": "Cien años de soledad",
            "author": "Gabriel García Márquez",
            "isbn": "978-0307474728"
        }))
        .unwrap();
        assert_eq!(book.total_copies(), 1);
        assert_eq!(book.initial_stock(), 1);
        assert!(book.validate().is_ok());
    }

    #[test]
    fn test_create_book_stock_follows_total_copies() {
        let book: CreateBook = serde_json::from_value(serde_json::json!({
            "title": "Rayuela",
            "author": "Julio Cortázar",
            "isbn": "978-8437604572",
            "totalCopies": 4,
            "publishYear": 1963
        }))
        .unwrap();
        assert_eq!(book.initial_stock(), 4);
        assert_eq!(book.publish_year, Some(1963));
    }

    #[test]
    fn test_create_book_validation() {
        let book: CreateBook = serde_json::from_value(serde_json::json!({
            "title": "",
            "author": "Anon",
            "isbn": "123",
            "stock": -1
        }))
        .unwrap();
        let errors = book.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("stock"));
    }

    #[test]
    fn test_create_book_requires_isbn() {
        let result = serde_json::from_value::<CreateBook>(serde_json::json!({
            "title": "Ficciones",
            "author": "Jorge Luis Borges"
        }));
        assert!(result.is_err());
    }
}
