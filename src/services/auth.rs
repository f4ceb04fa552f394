//! Staff authentication service

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rand::rngs::OsRng;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::staff::{StaffAccount, StaffClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate a staff member and return a JWT token with its lifetime in seconds
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(String, i64)> {
        let account = self
            .repository
            .staff
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !verify_password(&account.password_hash, password)? {
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        if !account.is_active {
            return Err(AppError::Authentication("Your account is inactive".to_string()));
        }

        if !account.is_staff {
            return Err(AppError::Authorization(
                "You are not authorised to access staff panel".to_string(),
            ));
        }

        let expires_in = self.config.jwt_expiration_hours as i64 * 3600;
        let token = self.create_token(&account, expires_in)?;

        tracing::info!(staff_id = account.id, username = %account.username, "Staff login");
        Ok((token, expires_in))
    }

    fn create_token(&self, account: &StaffAccount, expires_in: i64) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = StaffClaims {
            sub: account.username.clone(),
            staff_id: account.id,
            is_staff: account.is_staff,
            exp: now + expires_in,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Create the configured bootstrap account when no staff account exists yet
    pub async fn ensure_bootstrap_account(&self) -> AppResult<()> {
        let (Some(username), Some(password)) = (
            self.config.bootstrap_username.as_deref(),
            self.config.bootstrap_password.as_deref(),
        ) else {
            return Ok(());
        };

        if self.repository.staff.count().await? > 0 {
            return Ok(());
        }

        let account = self.repository.staff.create(username, &hash_password(password)?).await?;
        tracing::warn!(username = %account.username, "Created bootstrap staff account; change its password");
        Ok(())
    }
}

/// Hash a password with argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against an argon2 hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
