//! Loan (issue) model and the lending rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::book::BookShort;

/// Loan record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub book_id: i32,
    pub reader_id: Uuid,
    pub issue_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub is_returned: bool,
}

/// Loan with the borrowed book, for reader history and the return desk
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub book: BookShort,
    pub reader_id: Uuid,
    pub issue_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub is_returned: bool,
}

/// Flat row behind `LoanDetails`
#[derive(Debug, Clone, FromRow)]
pub struct LoanDetailsRow {
    id: i32,
    book_id: i32,
    book_title: String,
    book_ubno: String,
    reader_id: Uuid,
    issue_date: DateTime<Utc>,
    return_date: Option<DateTime<Utc>>,
    is_returned: bool,
}

impl From<LoanDetailsRow> for LoanDetails {
    fn from(row: LoanDetailsRow) -> Self {
        LoanDetails {
            id: row.id,
            book: BookShort {
                id: row.book_id,
                title: row.book_title,
                ubno: row.book_ubno,
            },
            reader_id: row.reader_id,
            issue_date: row.issue_date,
            return_date: row.return_date,
            is_returned: row.is_returned,
        }
    }
}

/// Issue request: the reader may be designated by card token or phone
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLoan {
    pub reader: String,
    pub book_id: i32,
}

/// State observed under lock before issuing a book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueCheck {
    /// Active loans currently held by the reader
    pub active_loans: i64,
    pub issue_limit: i32,
    /// Whether the reader already holds an active loan of this book
    pub already_holding: bool,
    pub available_copies: i32,
}

impl IssueCheck {
    /// Quota first, then duplicate, then stock.
    pub fn verify(&self) -> AppResult<()> {
        if self.active_loans >= i64::from(self.issue_limit) {
            return Err(AppError::QuotaExceeded {
                active: self.active_loans,
                limit: self.issue_limit,
            });
        }
        if self.already_holding {
            return Err(AppError::DuplicateLoan);
        }
        if self.available_copies <= 0 {
            return Err(AppError::OutOfStock);
        }
        Ok(())
    }
}

/// Verify a loan can be closed
pub fn verify_returnable(loan: &Loan) -> AppResult<()> {
    if loan.is_returned {
        return Err(AppError::AlreadyReturned(loan.id));
    }
    Ok(())
}
