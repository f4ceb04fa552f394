//! Loan management service

use crate::{
    error::AppResult,
    models::{
        book::Book,
        loan::{CreateLoan, Loan},
        reader::ReaderKey,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_loan(&self, id: i32) -> AppResult<Loan> {
        self.repository.loans.get_by_id(id).await
    }

    /// Issue a book to a reader designated by card token or phone
    pub async fn issue(&self, request: CreateLoan) -> AppResult<(Loan, Book)> {
        let reader = self.repository.readers.get(&ReaderKey::parse(&request.reader)).await?;

        let result = self
            .repository
            .loans
            .issue(reader.library_id, request.book_id)
            .await;

        match &result {
            Ok((loan, book)) => tracing::info!(
                loan_id = loan.id,
                reader_id = %reader.library_id,
                book_id = book.id,
                available = book.available_copies,
                "Book issued"
            ),
            Err(e) => tracing::debug!(
                reader_id = %reader.library_id,
                book_id = request.book_id,
                "Issue refused: {}",
                e
            ),
        }

        result
    }

    /// Return a loaned book
    pub async fn return_loan(&self, loan_id: i32) -> AppResult<(Loan, Book)> {
        let (loan, book) = self.repository.loans.return_loan(loan_id).await?;
        tracing::info!(
            loan_id = loan.id,
            book_id = book.id,
            available = book.available_copies,
            "Book returned"
        );
        Ok((loan, book))
    }
}
