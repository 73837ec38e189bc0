//! Loan (borrow) model and related types

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::book::Book;
use super::user::UserShort;

/// Loan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    #[default]
    Active,
    Returned,
    /// Declared for compatibility with stored records; never assigned
    Overdue,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Returned => "returned",
            LoanStatus::Overdue => "overdue",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(LoanStatus::Active),
            "returned" => Ok(LoanStatus::Returned),
            "overdue" => Ok(LoanStatus::Overdue),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

/// Internal row structure for database queries (status stored as text)
#[derive(Debug, Clone, FromRow)]
pub struct LoanRow {
    pub id: Uuid,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: String,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<LoanRow> for Loan {
    fn from(row: LoanRow) -> Self {
        Loan {
            id: row.id,
            loan_date: row.loan_date,
            due_date: row.due_date,
            return_date: row.return_date,
            status: row.status.parse().unwrap_or_default(),
            user_id: row.user_id,
            book_id: row.book_id,
            created_at: row.created_at,
        }
    }
}

/// Loan model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: Uuid,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }
}

/// Loan enriched with the referenced book and borrower.
///
/// References are serialized under `bookId` / `userId`, replaced by the
/// referenced record, or `null` when it no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanDetails {
    pub id: Uuid,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    #[serde(rename = "userId")]
    pub user: Option<UserShort>,
    #[serde(rename = "bookId")]
    pub book: Option<Book>,
    pub created_at: DateTime<Utc>,
}

impl LoanDetails {
    pub fn new(loan: Loan, book: Option<Book>, user: Option<UserShort>) -> Self {
        LoanDetails {
            id: loan.id,
            loan_date: loan.loan_date,
            due_date: loan.due_date,
            return_date: loan.return_date,
            status: loan.status,
            user,
            book,
            created_at: loan.created_at,
        }
    }
}

/// Create loan request
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateLoan {
    /// Book identifier
    pub book_id: String,
    /// Borrower identifier
    pub user_id: String,
    /// Due date (RFC 3339 timestamp or `YYYY-MM-DD`)
    #[serde(deserialize_with = "deserialize_due_date")]
    pub due_date: DateTime<Utc>,
}

/// Parse a due date given either as a full timestamp or as a calendar day (midnight UTC)
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| format!("invalid dueDate: {}", raw))
}

fn deserialize_due_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_due_date(&raw).map_err(serde::de::Error::custom)
}

/// Validated loan ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoan {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

/// Query parameters for loan listing
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LoanQuery {
    /// Requesting user (used when role is `user`)
    pub user_id: Option<String>,
    /// Requesting user's role; `user` scopes the list to `userId`
    pub role: Option<String>,
}

/// Resolved loan listing filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanScope {
    All,
    User(Uuid),
    /// Scoped to a user that cannot exist
    Nobody,
}

impl LoanQuery {
    pub fn scope(&self) -> LoanScope {
        if self.role.as_deref() != Some("user") {
            return LoanScope::All;
        }

        self.user_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok())
            .map(LoanScope::User)
            .unwrap_or(LoanScope::Nobody)
    }
}
