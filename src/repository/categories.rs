//! Categories repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    config::DeletePolicy,
    error::{AppError, AppResult},
    models::category::{Category, CategoryWithCount},
};

#[derive(Clone)]
pub struct CategoriesRepository {
    pool: Pool<Postgres>,
}

impl CategoriesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List categories with their book counts, ordered by name
    pub async fn list(&self) -> AppResult<Vec<CategoryWithCount>> {
        let categories = sqlx::query_as::<_, CategoryWithCount>(
            r#"
            SELECT c.id, c.name,
                   (SELECT COUNT(*) FROM books b WHERE b.category_id = c.id) as nb_books
            FROM categories c
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Check if a category name already exists (case-insensitive)
    pub async fn name_exists(&self, name: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE LOWER(name) = LOWER($1))",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a category; the name is expected to be normalized already
    pub async fn create(&self, name: &str) -> AppResult<Category> {
        sqlx::query_as::<_, Category>("INSERT INTO categories (name) VALUES ($1) RETURNING *")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::on_unique_violation(e, |_| {
                    AppError::Validation("Category already exists".to_string())
                })
            })
    }

    /// Delete a category according to the given policy for its books.
    ///
    /// The category's books are locked for the duration of the transaction so
    /// that no loan can be issued against them while the delete is decided.
    pub async fn delete(&self, id: i32, policy: DeletePolicy) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, i32>("SELECT id FROM categories WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category with id {} not found", id)))?;

        let book_ids: Vec<i32> =
            sqlx::query_scalar("SELECT id FROM books WHERE category_id = $1 ORDER BY id FOR UPDATE")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        if !book_ids.is_empty() {
            let active: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM loans WHERE book_id = ANY($1) AND NOT is_returned",
            )
            .bind(&book_ids)
            .fetch_one(&mut *tx)
            .await?;

            if active > 0 {
                return Err(AppError::Conflict(format!(
                    "Cannot delete category. {} of its books are currently issued.",
                    active
                )));
            }

            if policy == DeletePolicy::Restrict {
                return Err(AppError::Conflict(format!(
                    "Cannot delete category. It still holds {} books.",
                    book_ids.len()
                )));
            }

            sqlx::query("DELETE FROM loans WHERE book_id = ANY($1)")
                .bind(&book_ids)
                .execute(&mut *tx)
                .await?;

            sqlx::query("DELETE FROM books WHERE id = ANY($1)")
                .bind(&book_ids)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(book_ids.len() as u64)
    }
}
