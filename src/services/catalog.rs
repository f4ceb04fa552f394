//! Catalog management service: categories and books

use validator::Validate;

use crate::{
    config::PoliciesConfig,
    error::{AppError, AppResult},
    models::{
        book::{Book, BookDetails, BookQuery, CreateBook, UpdateBook},
        category::{normalize_name, Category, CategoryWithCount, CreateCategory},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    policies: PoliciesConfig,
}

impl CatalogService {
    pub fn new(repository: Repository, policies: PoliciesConfig) -> Self {
        Self { repository, policies }
    }

    pub async fn list_categories(&self) -> AppResult<Vec<CategoryWithCount>> {
        self.repository.categories.list().await
    }

    /// Create a category. Names are unique regardless of case.
    pub async fn create_category(&self, data: CreateCategory) -> AppResult<Category> {
        data.validate()?;

        let name = normalize_name(&data.name);
        if name.is_empty() {
            return Err(AppError::Validation("Category name cannot be blank".to_string()));
        }

        if self.repository.categories.name_exists(&name).await? {
            return Err(AppError::Validation("Category already exists".to_string()));
        }

        let category = self.repository.categories.create(&name).await?;
        tracing::info!(category_id = category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// Delete a category, applying the configured policy to its books
    pub async fn delete_category(&self, id: i32) -> AppResult<()> {
        let removed = self
            .repository
            .categories
            .delete(id, self.policies.category_books)
            .await?;
        tracing::info!(category_id = id, books_removed = removed, "Category deleted");
        Ok(())
    }

    pub async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<BookDetails>> {
        self.repository.books.list(query).await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Add a book to the catalog; the catalog number must be unique
    pub async fn create_book(&self, data: CreateBook) -> AppResult<Book> {
        let data = data.trimmed();
        data.validate()?;

        if self.repository.books.ubno_exists(&data.ubno, None).await? {
            return Err(AppError::Validation("Book already exists".to_string()));
        }

        let book = self.repository.books.create(&data).await?;
        tracing::info!(book_id = book.id, ubno = %book.ubno, copies = book.total_copies, "Book created");
        Ok(book)
    }

    /// Update a book; a new catalog number must not belong to another book
    pub async fn update_book(&self, id: i32, data: UpdateBook) -> AppResult<Book> {
        let data = data.trimmed();
        data.validate()?;

        if let Some(ref ubno) = data.ubno {
            if self.repository.books.ubno_exists(ubno, Some(id)).await? {
                return Err(AppError::Validation("Book ID already exists".to_string()));
            }
        }

        let book = self.repository.books.update(id, &data).await?;
        tracing::info!(
            book_id = book.id,
            total_copies = book.total_copies,
            available_copies = book.available_copies,
            "Book updated"
        );
        Ok(book)
    }

    /// Delete a book that has no copy out
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }
}
