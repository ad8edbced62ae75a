//! Books repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

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
        sqlx::query_as::<_, Book>(
            "SELECT id, title, author, cover, inventory, daily_fee FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Search books with pagination
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let pattern = query
            .search
            .as_ref()
            .map(|s| format!("%{}%", s.to_lowercase()));

        let (books, total) = if let Some(ref pattern) = pattern {
            let books = sqlx::query_as::<_, Book>(
                r#"
                SELECT id, title, author, cover, inventory, daily_fee
                FROM books
                WHERE LOWER(title) LIKE $1 OR LOWER(author) LIKE $1
                ORDER BY id
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(pattern)
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

            let total: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM books WHERE LOWER(title) LIKE $1 OR LOWER(author) LIKE $1",
            )
            .bind(pattern)
            .fetch_one(&self.pool)
            .await?;

            (books, total)
        } else {
            let books = sqlx::query_as::<_, Book>(
                r#"
                SELECT id, title, author, cover, inventory, daily_fee
                FROM books
                ORDER BY id
                LIMIT $1 OFFSET $2
                "#,
            )
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
                .fetch_one(&self.pool)
                .await?;

            (books, total)
        };

        Ok((books, total))
    }

    /// Create a new book
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, cover, inventory, daily_fee)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, author, cover, inventory, daily_fee
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.cover)
        .bind(book.inventory)
        .bind(book.daily_fee)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update an existing book; absent fields keep their current value
    pub async fn update(&self, id: i32, update: &UpdateBook) -> AppResult<Book> {
        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = COALESCE($1, title),
                author = COALESCE($2, author),
                cover = COALESCE($3, cover),
                inventory = COALESCE($4, inventory),
                daily_fee = COALESCE($5, daily_fee)
            WHERE id = $6
            RETURNING id, title, author, cover, inventory, daily_fee
            "#,
        )
        .bind(update.title.as_deref())
        .bind(update.author.as_deref())
        .bind(update.cover)
        .bind(update.inventory)
        .bind(update.daily_fee)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        Ok(updated)
    }

    /// Delete a book. Refused while copies are still out.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let active_borrowings: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowings WHERE book_id = $1 AND actual_return_date IS NULL",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if active_borrowings > 0 {
            return Err(AppError::Conflict(format!(
                "Book has {} active borrowing(s)",
                active_borrowings
            )));
        }

        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        Ok(())
    }
}
