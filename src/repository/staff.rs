//! Staff accounts repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::staff::StaffAccount,
};

#[derive(Clone)]
pub struct StaffRepository {
    pool: Pool<Postgres>,
}

impl StaffRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get staff account by username (case-insensitive)
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<StaffAccount>> {
        let account = sqlx::query_as::<_, StaffAccount>(
            "SELECT * FROM staff WHERE LOWER(username) = LOWER($1)",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM staff")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Create an active staff account from an already-hashed password
    pub async fn create(&self, username: &str, password_hash: &str) -> AppResult<StaffAccount> {
        sqlx::query_as::<_, StaffAccount>(
            r#"
            INSERT INTO staff (username, password_hash, is_active, is_staff)
            VALUES ($1, $2, TRUE, TRUE)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::on_unique_violation(e, |_| {
                AppError::Validation(format!("Staff account {} already exists", username))
            })
        })
    }
}
