//! Books repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{available_for, Book, BookDetails, BookQuery, CreateBook, UpdateBook},
};

fn ubno_taken(constraint: Option<&str>) -> AppError {
    match constraint {
        Some("books_ubno_key") | None => AppError::Validation("Book already exists".to_string()),
        Some(other) => AppError::Validation(format!("Duplicate value violates {}", other)),
    }
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// List books with their category name
    pub async fn list(&self, query: &BookQuery) -> AppResult<Vec<BookDetails>> {
        let books = sqlx::query_as::<_, BookDetails>(
            r#"
            SELECT b.id, b.title, b.author, b.ubno, b.category_id, c.name as category_name,
                   b.total_copies, b.available_copies
            FROM books b
            JOIN categories c ON c.id = b.category_id
            WHERE ($1::int IS NULL OR b.category_id = $1)
              AND (NOT $2 OR b.available_copies > 0)
            ORDER BY b.title, b.id
            "#,
        )
        .bind(query.category_id)
        .bind(query.available_only.unwrap_or(false))
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Check if a catalog number is already used by another book
    pub async fn ubno_exists(&self, ubno: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE ubno = $1 AND ($2::int IS NULL OR id != $2))",
        )
        .bind(ubno)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a book with every copy on the shelf
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let category_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(book.category_id)
                .fetch_one(&self.pool)
                .await?;

        if !category_exists {
            return Err(AppError::Validation(format!(
                "Category with id {} does not exist",
                book.category_id
            )));
        }

        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, ubno, category_id, total_copies, available_copies)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.ubno)
        .bind(book.category_id)
        .bind(book.total_copies)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::on_unique_violation(e, ubno_taken))
    }

    /// Update a book. Available copies are recomputed from the active loans
    /// under the book's row lock, never taken from the request.
    pub async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        if let Some(category_id) = data.category_id {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                    .bind(category_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if !exists {
                return Err(AppError::Validation(format!(
                    "Category with id {} does not exist",
                    category_id
                )));
            }
        }

        let active: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE book_id = $1 AND NOT is_returned")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        let total = data.total_copies.unwrap_or(current.total_copies);
        if i64::from(total) < active {
            return Err(AppError::Validation(format!(
                "Total copies cannot be lower than the {} copies currently issued",
                active
            )));
        }

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author = $2, ubno = $3, category_id = $4,
                total_copies = $5, available_copies = $6
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(data.title.as_deref().unwrap_or(&current.title))
        .bind(data.author.as_deref().unwrap_or(&current.author))
        .bind(data.ubno.as_deref().unwrap_or(&current.ubno))
        .bind(data.category_id.unwrap_or(current.category_id))
        .bind(total)
        .bind(available_for(total, active))
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::on_unique_violation(e, ubno_taken))?;

        tx.commit().await?;

        Ok(book)
    }

    /// Delete a book and its returned loan history. Refused while a copy is out.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, i32>("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        let issued: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE book_id = $1 AND NOT is_returned)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if issued {
            return Err(AppError::Conflict(
                "Cannot delete book. It is currently issued.".to_string(),
            ));
        }

        sqlx::query("DELETE FROM loans WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
