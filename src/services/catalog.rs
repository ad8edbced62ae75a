//! Catalog management service

use validator::Validate;

use crate::{
    error::AppResult,
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    models::user::Caller,
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books with filters; any authenticated caller may read
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book (staff only)
    pub async fn create_book(&self, caller: Caller, book: CreateBook) -> AppResult<Book> {
        caller.require_staff()?;
        book.validate()?;

        let created = self.repository.books.create(&book).await?;
        tracing::info!("Book {} created: {}", created.id, created.title);
        Ok(created)
    }

    /// Update an existing book (staff only)
    pub async fn update_book(&self, caller: Caller, id: i32, update: UpdateBook) -> AppResult<Book> {
        caller.require_staff()?;
        update.validate()?;

        self.repository.books.update(id, &update).await
    }

    /// Delete a book (staff only); refused while copies are still out
    pub async fn delete_book(&self, caller: Caller, id: i32) -> AppResult<()> {
        caller.require_staff()?;

        self.repository.books.delete(id).await?;
        tracing::info!("Book {} deleted", id);
        Ok(())
    }
}
