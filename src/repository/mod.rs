//! Repository layer for database operations

pub mod books;
pub mod loans;
pub mod users;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub use books::{BooksRepository, BooksStore};
pub use loans::{Checkout, LoansRepository, LoansStore};
pub use users::{UsersRepository, UsersStore};

/// Handle on the three collections, shared by all services
#[derive(Clone)]
pub struct Repository {
    pub users: Arc<dyn UsersStore>,
    pub books: Arc<dyn BooksStore>,
    pub loans: Arc<dyn LoansStore>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: Arc::new(UsersRepository::new(pool.clone())),
            books: Arc::new(BooksRepository::new(pool.clone())),
            loans: Arc::new(LoansRepository::new(pool)),
        }
    }

    /// Assemble a repository from individual stores
    pub fn from_stores(
        users: Arc<dyn UsersStore>,
        books: Arc<dyn BooksStore>,
        loans: Arc<dyn LoansStore>,
    ) -> Self {
        Self { users, books, loans }
    }
}
