//! Loans repository: the issue and return transactions

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{clamp_available, Book},
        loan::{verify_returnable, IssueCheck, Loan, LoanDetails, LoanDetailsRow},
    },
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Loans of a reader, newest first. `active_only` keeps books still out.
    pub async fn get_reader_loans(&self, reader_id: Uuid, active_only: bool) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query_as::<_, LoanDetailsRow>(
            r#"
            SELECT l.id, l.book_id, b.title as book_title, b.ubno as book_ubno,
                   l.reader_id, l.issue_date, l.return_date, l.is_returned
            FROM loans l
            JOIN books b ON b.id = l.book_id
            WHERE l.reader_id = $1 AND (NOT $2 OR NOT l.is_returned)
            ORDER BY l.issue_date DESC, l.id DESC
            "#,
        )
        .bind(reader_id)
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LoanDetails::from).collect())
    }

    /// Issue a book to a reader.
    ///
    /// Locks the reader row then the book row, so concurrent issues for the
    /// same reader or the same book are serialized. The loan insert and the
    /// copy decrement commit together.
    pub async fn issue(&self, reader_id: Uuid, book_id: i32) -> AppResult<(Loan, Book)> {
        let mut tx = self.pool.begin().await?;

        let issue_limit: i32 =
            sqlx::query_scalar("SELECT issue_limit FROM readers WHERE library_id = $1 FOR UPDATE")
                .bind(reader_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Reader {} not found", reader_id)))?;

        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        let (active_loans, already_holding): (i64, bool) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(BOOL_OR(book_id = $2), FALSE)
            FROM loans
            WHERE reader_id = $1 AND NOT is_returned
            "#,
        )
        .bind(reader_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        IssueCheck {
            active_loans,
            issue_limit,
            already_holding,
            available_copies: book.available_copies,
        }
        .verify()?;

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (book_id, reader_id, issue_date, is_returned)
            VALUES ($1, $2, $3, FALSE)
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(reader_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::on_unique_violation(e, |_| AppError::DuplicateLoan))?;

        let book = sqlx::query_as::<_, Book>(
            "UPDATE books SET available_copies = $1 WHERE id = $2 RETURNING *",
        )
        .bind(clamp_available(book.available_copies - 1, book.total_copies))
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((loan, book))
    }

    /// Close an active loan and put the copy back on the shelf, atomically.
    pub async fn return_loan(&self, loan_id: i32) -> AppResult<(Loan, Book)> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        verify_returnable(&loan)?;

        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(loan.book_id)
            .fetch_one(&mut *tx)
            .await?;

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET is_returned = TRUE, return_date = $1
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(Utc::now())
        .bind(loan_id)
        .fetch_one(&mut *tx)
        .await?;

        let book = sqlx::query_as::<_, Book>(
            "UPDATE books SET available_copies = $1 WHERE id = $2 RETURNING *",
        )
        .bind(clamp_available(book.available_copies + 1, book.total_copies))
        .bind(book.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((loan, book))
    }
}
