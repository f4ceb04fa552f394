//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    /// Unique catalog number
    pub ubno: String,
    pub category_id: i32,
    pub total_copies: i32,
    pub available_copies: i32,
}

/// Book with its category name, for list views
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookDetails {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub ubno: String,
    pub category_id: i32,
    pub category_name: String,
    pub total_copies: i32,
    pub available_copies: i32,
}

/// Short book representation embedded in loan listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub ubno: String,
}

/// Book list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    pub category_id: Option<i32>,
    /// Only books with at least one copy on the shelf
    pub available_only: Option<bool>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 200, message = "Author must be 1-200 characters"))]
    pub author: String,
    #[validate(length(min = 1, max = 50, message = "Catalog number must be 1-50 characters"))]
    pub ubno: String,
    pub category_id: i32,
    #[validate(range(min = 0, message = "Total copies cannot be negative"))]
    pub total_copies: i32,
}

/// Update book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Author must be 1-200 characters"))]
    pub author: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Catalog number must be 1-50 characters"))]
    pub ubno: Option<String>,
    pub category_id: Option<i32>,
    #[validate(range(min = 0, message = "Total copies cannot be negative"))]
    pub total_copies: Option<i32>,
}

impl CreateBook {
    /// Trim every text field; validation runs on the trimmed values
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            ubno: self.ubno.trim().to_string(),
            ..self
        }
    }
}

impl UpdateBook {
    pub fn trimmed(self) -> Self {
        let trim = |value: Option<String>| value.map(|v| v.trim().to_string());
        Self {
            title: trim(self.title),
            author: trim(self.author),
            ubno: trim(self.ubno),
            ..self
        }
    }
}

/// Clamp an available-copies value into `[0, total]`.
pub fn clamp_available(available: i32, total: i32) -> i32 {
    available.clamp(0, total.max(0))
}

/// Copies left on the shelf for a given stock and number of active loans.
pub fn available_for(total: i32, active_loans: i64) -> i32 {
    let on_loan = i32::try_from(active_loans).unwrap_or(i32::MAX);
    clamp_available(total.saturating_sub(on_loan), total)
}
