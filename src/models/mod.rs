//! Data models for Biblio

pub mod book;
pub mod loan;
pub mod user;

pub use book::Book;
pub use loan::{Loan, LoanDetails, LoanStatus};
pub use user::{Role, User, UserShort};
