//! Loans repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book::Book,
        loan::{Loan, LoanDetails, LoanRow, LoanScope, LoanStatus, NewLoan},
        user::UserShort,
    },
};

/// Outcome of a checkout attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Checkout {
    /// Stock was reserved and the loan recorded
    Created(Loan),
    /// No copy left; nothing was written
    OutOfStock,
}

/// Persistence operations on the loans collection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoansStore: Send + Sync {
    /// List loans with their book and borrower
    async fn list(&self, scope: LoanScope) -> AppResult<Vec<LoanDetails>>;

    /// Get loan by ID
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Loan>>;

    /// Get loan by ID with its book and borrower
    async fn get_details(&self, id: Uuid) -> AppResult<Option<LoanDetails>>;

    /// Take one copy out of stock and record the loan, atomically
    async fn checkout(&self, loan: &NewLoan) -> AppResult<Checkout>;

    /// Mark an active loan returned and give the copy back to stock.
    /// `None` when no active loan with this ID exists.
    async fn mark_returned(&self, id: Uuid, returned_at: DateTime<Utc>) -> AppResult<Option<Loan>>;

    /// Delete a loan, restocking the book if the loan was active.
    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

const DETAILS_SELECT: &str = r#"
    SELECT l.*,
           b.id AS b_id, b.title AS b_title, b.author AS b_author, b.isbn AS b_isbn,
           b.category AS b_category, b.publish_year AS b_publish_year,
           b.total_copies AS b_total_copies, b.stock AS b_stock,
           b.description AS b_description, b.cover_image AS b_cover_image,
           b.created_at AS b_created_at,
           u.id AS u_id, u.name AS u_name, u.username AS u_username, u.email AS u_email
    FROM loans l
    LEFT JOIN books b ON b.id = l.book_id
    LEFT JOIN users u ON u.id = l.user_id
"#;

/// Listing query for a scope, oldest loan first; `None` when nothing can match
fn list_query(scope: LoanScope) -> Option<String> {
    match scope {
        LoanScope::All => Some(format!("{} ORDER BY l.created_at, l.id", DETAILS_SELECT)),
        LoanScope::User(_) => Some(format!(
            "{} WHERE l.user_id = $1 ORDER BY l.created_at, l.id",
            DETAILS_SELECT
        )),
        LoanScope::Nobody => None,
    }
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Build loan details from a joined row; dangling references become `None`
    fn details_from_row(row: &PgRow) -> Result<LoanDetails, sqlx::Error> {
        let loan = Loan::from(LoanRow {
            id: row.try_get("id")?,
            loan_date: row.try_get("loan_date")?,
            due_date: row.try_get("due_date")?,
            return_date: row.try_get("return_date")?,
            status: row.try_get("status")?,
            user_id: row.try_get("user_id")?,
            book_id: row.try_get("book_id")?,
            created_at: row.try_get("created_at")?,
        });

        let book = match row.try_get::<Option<Uuid>, _>("b_id")? {
            Some(id) => Some(Book {
                id,
                title: row.try_get("b_title")?,
                author: row.try_get("b_author")?,
                isbn: row.try_get("b_isbn")?,
                category: row.try_get("b_category")?,
                publish_year: row.try_get("b_publish_year")?,
                total_copies: row.try_get("b_total_copies")?,
                stock: row.try_get("b_stock")?,
                description: row.try_get("b_description")?,
                cover_image: row.try_get("b_cover_image")?,
                created_at: row.try_get("b_created_at")?,
            }),
            None => None,
        };

        let user = match row.try_get::<Option<Uuid>, _>("u_id")? {
            Some(id) => Some(UserShort {
                id,
                name: row.try_get("u_name")?,
                username: row.try_get("u_username")?,
                email: row.try_get("u_email")?,
            }),
            None => None,
        };

        Ok(LoanDetails::new(loan, book, user))
    }
}

#[async_trait]
impl LoansStore for LoansRepository {
    async fn list(&self, scope: LoanScope) -> AppResult<Vec<LoanDetails>> {
        let Some(query) = list_query(scope) else {
            return Ok(Vec::new());
        };

        let rows = match scope {
            LoanScope::User(user_id) => sqlx::query(&query).bind(user_id).fetch_all(&self.pool).await?,
            _ => sqlx::query(&query).fetch_all(&self.pool).await?,
        };

        let loans = rows
            .iter()
            .map(Self::details_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(loans)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Loan>> {
        let row = sqlx::query_as::<_, LoanRow>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Loan::from))
    }

    async fn get_details(&self, id: Uuid) -> AppResult<Option<LoanDetails>> {
        let query = format!("{} WHERE l.id = $1", DETAILS_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(Self::details_from_row).transpose()?)
    }

    async fn checkout(&self, loan: &NewLoan) -> AppResult<Checkout> {
        let mut tx = self.pool.begin().await?;

        // Conditional decrement: concurrent checkouts cannot overdraw stock
        let reserved = sqlx::query("UPDATE books SET stock = stock - 1 WHERE id = $1 AND stock > 0")
            .bind(loan.book_id)
            .execute(&mut *tx)
            .await?;

        if reserved.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(Checkout::OutOfStock);
        }

        let row = sqlx::query_as::<_, LoanRow>(
            r#"
            INSERT INTO loans (id, loan_date, due_date, return_date, status, user_id, book_id, created_at)
            VALUES ($1, $2, $3, NULL, $4, $5, $6, $2)
            RETURNING *
            "#,
        )
        .bind(loan.id)
        .bind(loan.loan_date)
        .bind(loan.due_date)
        .bind(LoanStatus::Active.as_str())
        .bind(loan.user_id)
        .bind(loan.book_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Checkout::Created(row.into()))
    }

    async fn mark_returned(&self, id: Uuid, returned_at: DateTime<Utc>) -> AppResult<Option<Loan>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, LoanRow>(
            r#"
            UPDATE loans SET return_date = $2, status = $3
            WHERE id = $1 AND status <> $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(returned_at)
        .bind(LoanStatus::Returned.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        let loan = Loan::from(row);

        // Best-effort: a deleted book simply matches no row
        let restocked = sqlx::query("UPDATE books SET stock = stock + 1 WHERE id = $1")
            .bind(loan.book_id)
            .execute(&mut *tx)
            .await?;

        if restocked.rows_affected() == 0 {
            tracing::warn!(loan_id = %loan.id, book_id = %loan.book_id, "Returned loan references a missing book");
        }

        tx.commit().await?;

        Ok(Some(loan))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("DELETE FROM loans WHERE id = $1 RETURNING book_id, status")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(false);
        };

        let book_id: Uuid = row.try_get("book_id")?;
        let status: String = row.try_get("status")?;

        if status == LoanStatus::Active.as_str() {
            sqlx::query("UPDATE books SET stock = stock + 1 WHERE id = $1")
                .bind(book_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_keeps_insertion_order() {
        let all = list_query(LoanScope::All).unwrap();
        assert!(all.trim_end().ends_with("ORDER BY l.created_at, l.id"));
        assert!(!all.contains("DESC"));

        let scoped = list_query(LoanScope::User(Uuid::new_v4())).unwrap();
        assert!(scoped.contains("WHERE l.user_id = $1"));
        assert!(scoped.trim_end().ends_with("ORDER BY l.created_at, l.id"));

        assert!(list_query(LoanScope::Nobody).is_none());
    }
}
