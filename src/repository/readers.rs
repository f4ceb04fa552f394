//! Readers repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    config::DeletePolicy,
    error::{AppError, AppResult},
    models::reader::{ActiveReader, CreateReader, Membership, Reader, ReaderKey, ReaderMatch, ReaderQuery},
};

fn contact_taken(constraint: Option<&str>) -> AppError {
    match constraint {
        Some("readers_email_key") => AppError::Validation("Email already exists".to_string()),
        _ => AppError::Validation("Phone number already exists".to_string()),
    }
}

/// `%term%` pattern for ILIKE with the wildcard characters escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[derive(Clone)]
pub struct ReadersRepository {
    pool: Pool<Postgres>,
}

impl ReadersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get reader by library card token or, failing that, by phone
    pub async fn get(&self, key: &ReaderKey) -> AppResult<Reader> {
        let reader = match key {
            ReaderKey::LibraryId(id) => {
                sqlx::query_as::<_, Reader>("SELECT * FROM readers WHERE library_id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            ReaderKey::Phone(phone) => {
                sqlx::query_as::<_, Reader>("SELECT * FROM readers WHERE phone = $1")
                    .bind(phone)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        reader.ok_or_else(|| AppError::NotFound(format!("Reader {} not found", key)))
    }

    /// Check if a phone number is already registered
    pub async fn phone_exists(&self, phone: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM readers WHERE phone = $1)")
            .bind(phone)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Check if an email is already registered
    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM readers WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Register a new reader with a fresh library card token
    pub async fn create(&self, reader: &CreateReader) -> AppResult<Reader> {
        let membership = reader.membership.unwrap_or_default();

        sqlx::query_as::<_, Reader>(
            r#"
            INSERT INTO readers (library_id, name, phone, email, address, membership, issue_limit)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&reader.name)
        .bind(&reader.phone)
        .bind(&reader.email)
        .bind(&reader.address)
        .bind(membership)
        .bind(membership.issue_limit())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::on_unique_violation(e, contact_taken))
    }

    /// Search readers page by page; an empty term lists everyone
    pub async fn search(&self, query: &ReaderQuery) -> AppResult<(Vec<Reader>, i64)> {
        let pattern = like_pattern(query.q.as_deref().unwrap_or(""));

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM readers
            WHERE name ILIKE $1 OR phone ILIKE $1 OR email ILIKE $1
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let readers = sqlx::query_as::<_, Reader>(
            r#"
            SELECT * FROM readers
            WHERE name ILIKE $1 OR phone ILIKE $1 OR email ILIKE $1
            ORDER BY name, library_id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(query.per_page())
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((readers, total))
    }

    /// Quick lookup returning (id, name, phone) triples
    pub async fn lookup(&self, term: &str, limit: i64) -> AppResult<Vec<ReaderMatch>> {
        let matches = sqlx::query_as::<_, ReaderMatch>(
            r#"
            SELECT library_id as id, name, phone FROM readers
            WHERE name ILIKE $1 OR phone ILIKE $1 OR email ILIKE $1
            ORDER BY name, library_id
            LIMIT $2
            "#,
        )
        .bind(like_pattern(term))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(matches)
    }

    /// Change membership; the issue limit always follows the tier
    pub async fn update_membership(&self, id: Uuid, membership: Membership) -> AppResult<Reader> {
        sqlx::query_as::<_, Reader>(
            r#"
            UPDATE readers SET membership = $1, issue_limit = $2
            WHERE library_id = $3
            RETURNING *
            "#,
        )
        .bind(membership)
        .bind(membership.issue_limit())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Reader {} not found", id)))
    }

    /// Readers holding at least one active loan, with their active-loan count
    pub async fn active_readers(&self) -> AppResult<Vec<ActiveReader>> {
        let readers = sqlx::query_as::<_, ActiveReader>(
            r#"
            SELECT r.library_id, r.name, r.phone, r.membership, r.issue_limit,
                   COUNT(l.id) as active_loans
            FROM readers r
            JOIN loans l ON l.reader_id = r.library_id AND NOT l.is_returned
            GROUP BY r.library_id
            ORDER BY r.name, r.library_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(readers)
    }

    /// Delete a reader according to the given policy for their loan history.
    /// Refused while the reader still holds a book.
    pub async fn delete(&self, id: Uuid, policy: DeletePolicy) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, Uuid>("SELECT library_id FROM readers WHERE library_id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reader {} not found", id)))?;

        let (active, history): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE NOT is_returned), COUNT(*)
            FROM loans WHERE reader_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if active > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete reader. {} books are still issued to them.",
                active
            )));
        }

        if history > 0 && policy == DeletePolicy::Restrict {
            return Err(AppError::Conflict(format!(
                "Cannot delete reader. {} loans are recorded in their history.",
                history
            )));
        }

        let removed = sqlx::query("DELETE FROM loans WHERE reader_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM readers WHERE library_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(removed)
    }
}
