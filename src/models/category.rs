//! Category model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Category record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

/// Category with the number of books it owns
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CategoryWithCount {
    pub id: i32,
    pub name: String,
    pub nb_books: i64,
}

/// Create category request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 100, message = "Category name must be 1-100 characters"))]
    pub name: String,
}

/// Normalize a category name the way it is stored: trimmed, inner whitespace
/// collapsed, and every letter that follows a non-letter capitalized, so
/// `"sci-fi"` becomes `"Sci-Fi"`.
pub fn normalize_name(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut name = String::with_capacity(collapsed.len());
    let mut after_letter = false;
    for c in collapsed.chars() {
        if after_letter {
            name.extend(c.to_lowercase());
        } else {
            name.extend(c.to_uppercase());
        }
        after_letter = c.is_alphabetic();
    }
    name
}
