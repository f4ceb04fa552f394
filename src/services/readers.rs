//! Reader registry service

use validator::Validate;

use crate::{
    config::PoliciesConfig,
    error::{AppError, AppResult},
    models::{
        loan::LoanDetails,
        reader::{ActiveReader, CreateReader, Membership, Reader, ReaderKey, ReaderMatch, ReaderQuery},
    },
    repository::Repository,
};

/// Matches returned by the quick reader lookup
pub const LOOKUP_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct ReadersService {
    repository: Repository,
    policies: PoliciesConfig,
}

impl ReadersService {
    pub fn new(repository: Repository, policies: PoliciesConfig) -> Self {
        Self { repository, policies }
    }

    /// Resolve a reader from a library card token or phone number
    pub async fn get(&self, key: &str) -> AppResult<Reader> {
        self.repository.readers.get(&ReaderKey::parse(key)).await
    }

    /// Register a new reader; phone and email must be unused
    pub async fn create_reader(&self, data: CreateReader) -> AppResult<Reader> {
        let data = data.trimmed();
        data.validate()?;

        if self.repository.readers.phone_exists(&data.phone).await? {
            return Err(AppError::Validation("Phone number already exists".to_string()));
        }
        if self.repository.readers.email_exists(&data.email).await? {
            return Err(AppError::Validation("Email already exists".to_string()));
        }

        let reader = self.repository.readers.create(&data).await?;
        tracing::info!(reader_id = %reader.library_id, membership = %reader.membership, "Reader registered");
        Ok(reader)
    }

    /// Page through readers matching a substring of name, phone or email
    pub async fn search(&self, query: &ReaderQuery) -> AppResult<(Vec<Reader>, i64)> {
        self.repository.readers.search(query).await
    }

    /// Quick lookup for the issue desk
    pub async fn lookup(&self, term: &str) -> AppResult<Vec<ReaderMatch>> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.repository.readers.lookup(term, LOOKUP_LIMIT).await
    }

    /// Change a reader's membership; the issue limit follows the new tier
    pub async fn change_membership(&self, key: &str, membership: Membership) -> AppResult<Reader> {
        let reader = self.get(key).await?;
        let updated = self
            .repository
            .readers
            .update_membership(reader.library_id, membership)
            .await?;
        tracing::info!(
            reader_id = %updated.library_id,
            from = %reader.membership,
            to = %updated.membership,
            issue_limit = updated.issue_limit,
            "Membership changed"
        );
        Ok(updated)
    }

    /// Full loan history of a reader, newest first
    pub async fn history(&self, key: &str) -> AppResult<(Reader, Vec<LoanDetails>)> {
        let reader = self.get(key).await?;
        let loans = self.repository.loans.get_reader_loans(reader.library_id, false).await?;
        Ok((reader, loans))
    }

    /// Books currently held by a reader
    pub async fn active_loans(&self, key: &str) -> AppResult<(Reader, Vec<LoanDetails>)> {
        let reader = self.get(key).await?;
        let loans = self.repository.loans.get_reader_loans(reader.library_id, true).await?;
        Ok((reader, loans))
    }

    /// Readers holding at least one book
    pub async fn active_readers(&self) -> AppResult<Vec<ActiveReader>> {
        self.repository.readers.active_readers().await
    }

    /// Delete a reader, applying the configured policy to their loan history
    pub async fn delete_reader(&self, key: &str) -> AppResult<()> {
        let reader = self.get(key).await?;
        let removed = self
            .repository
            .readers
            .delete(reader.library_id, self.policies.reader_loans)
            .await?;
        tracing::info!(reader_id = %reader.library_id, loans_removed = removed, "Reader deleted");
        Ok(())
    }
}
