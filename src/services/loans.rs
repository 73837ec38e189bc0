//! Loan management service

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::loan::{CreateLoan, LoanDetails, LoanQuery, LoanStatus, NewLoan},
    repository::{Checkout, Repository},
};

use super::parse_id;

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List loans, scoped to the requesting user when their role is `user`
    pub async fn list_loans(&self, query: &LoanQuery) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list(query.scope()).await
    }

    /// Get a loan with its book and borrower
    pub async fn get_loan(&self, id: &str) -> AppResult<LoanDetails> {
        let Some(id) = parse_id(id) else {
            return Err(loan_not_found());
        };

        self.repository
            .loans
            .get_details(id)
            .await?
            .ok_or_else(loan_not_found)
    }

    /// Create a new loan (borrow a book)
    pub async fn create_loan(&self, request: CreateLoan) -> AppResult<LoanDetails> {
        let book = match parse_id(&request.book_id) {
            Some(id) => self.repository.books.get_by_id(id).await?,
            None => None,
        };
        let user = match parse_id(&request.user_id) {
            Some(id) => self.repository.users.get_by_id(id).await?,
            None => None,
        };

        let Some(book) = book else {
            return Err(AppError::BadRequest("Libro no encontrado".to_string()));
        };
        let Some(user) = user else {
            return Err(AppError::BadRequest("Usuario no encontrado".to_string()));
        };

        if !book.is_available() {
            return Err(book_not_available());
        }

        let loan = NewLoan {
            id: Uuid::new_v4(),
            book_id: book.id,
            user_id: user.id,
            loan_date: Utc::now(),
            due_date: request.due_date,
        };

        let loan = match self.repository.loans.checkout(&loan).await? {
            Checkout::Created(loan) => loan,
            // Another request took the last copy after the availability check
            Checkout::OutOfStock => return Err(book_not_available()),
        };

        tracing::info!(
            loan_id = %loan.id,
            book_id = %loan.book_id,
            user_id = %loan.user_id,
            "Book borrowed"
        );

        self.details(loan.id).await
    }

    /// Return a borrowed book
    pub async fn return_loan(&self, id: &str) -> AppResult<LoanDetails> {
        let Some(id) = parse_id(id) else {
            return Err(loan_not_found());
        };

        let loan = self
            .repository
            .loans
            .get_by_id(id)
            .await?
            .ok_or_else(loan_not_found)?;

        if loan.status == LoanStatus::Returned {
            return Err(already_returned());
        }

        let loan = self
            .repository
            .loans
            .mark_returned(id, Utc::now())
            .await?
            .ok_or_else(already_returned)?;

        tracing::info!(loan_id = %loan.id, book_id = %loan.book_id, "Book returned");

        self.details(loan.id).await
    }

    /// Delete a loan record
    pub async fn delete_loan(&self, id: &str) -> AppResult<()> {
        let Some(id) = parse_id(id) else {
            return Err(loan_not_found());
        };

        if !self.repository.loans.delete(id).await? {
            return Err(loan_not_found());
        }

        tracing::info!(loan_id = %id, "Préstamo eliminado");
        Ok(())
    }

    async fn details(&self, id: Uuid) -> AppResult<LoanDetails> {
        self.repository
            .loans
            .get_details(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Loan {} vanished after write", id)))
    }
}

fn loan_not_found() -> AppError {
    AppError::NotFound("Préstamo no encontrado".to_string())
}

fn book_not_available() -> AppError {
    AppError::BadRequest("Libro no disponible".to_string())
}

fn already_returned() -> AppError {
    AppError::BadRequest("El préstamo ya fue devuelto".to_string())
}
