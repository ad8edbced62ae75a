//! Borrowings repository for database operations
//!
//! Creation and return both mutate the borrowing row and the book's
//! inventory; each runs inside a single transaction so the inventory
//! invariant survives concurrent requests for the same book.

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::borrowing::{Borrowing, BorrowingDetails},
    models::user::Caller,
};

#[derive(Clone)]
pub struct BorrowingsRepository {
    pool: Pool<Postgres>,
}

impl BorrowingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create a borrowing and decrement the book's inventory atomically.
    ///
    /// The book row is locked for the duration of the transaction, so two
    /// concurrent borrows of the last copy serialize: the second sees
    /// inventory = 0 and is rejected. The guarded decrement backstops the
    /// invariant; losing it is a retryable conflict.
    pub async fn create(
        &self,
        user_id: i32,
        book_id: i32,
        borrow_date: NaiveDate,
        expected_return_date: NaiveDate,
    ) -> AppResult<Borrowing> {
        let mut tx = self.pool.begin().await?;

        let inventory: i32 =
            sqlx::query_scalar("SELECT inventory FROM books WHERE id = $1 FOR UPDATE")
                .bind(book_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| {
                    AppError::validation("book_id", format!("Book with id {} not found", book_id))
                })?;

        if inventory <= 0 {
            return Err(AppError::validation("book_id", "This book is out of stock"));
        }

        let borrowing = sqlx::query_as::<_, Borrowing>(
            r#"
            INSERT INTO borrowings (borrow_date, expected_return_date, actual_return_date, book_id, user_id)
            VALUES ($1, $2, NULL, $3, $4)
            RETURNING id, borrow_date, expected_return_date, actual_return_date, book_id, user_id
            "#,
        )
        .bind(borrow_date)
        .bind(expected_return_date)
        .bind(book_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let decremented =
            sqlx::query("UPDATE books SET inventory = inventory - 1 WHERE id = $1 AND inventory > 0")
                .bind(book_id)
                .execute(&mut *tx)
                .await?;

        if decremented.rows_affected() == 0 {
            // Lost a concurrent decrement despite the row lock; roll back
            return Err(AppError::Conflict(
                "Book inventory changed concurrently, please retry".to_string(),
            ));
        }

        tx.commit().await?;

        Ok(borrowing)
    }

    /// List borrowings visible to the caller, ascending id.
    ///
    /// Members are always scoped to their own rows; a user_id filter is
    /// honored for staff only.
    pub async fn list(
        &self,
        caller: Caller,
        user_filter: Option<i32>,
        active_filter: Option<bool>,
    ) -> AppResult<Vec<Borrowing>> {
        let scope_user = if caller.is_staff {
            user_filter
        } else {
            Some(caller.user_id)
        };

        let borrowings = sqlx::query_as::<_, Borrowing>(
            r#"
            SELECT id, borrow_date, expected_return_date, actual_return_date, book_id, user_id
            FROM borrowings
            WHERE ($1::int IS NULL OR user_id = $1)
              AND ($2::bool IS NULL
                   OR ($2 AND actual_return_date IS NULL)
                   OR (NOT $2 AND actual_return_date IS NOT NULL))
            ORDER BY id
            "#,
        )
        .bind(scope_user)
        .bind(active_filter)
        .fetch_all(&self.pool)
        .await?;

        Ok(borrowings)
    }

    /// Get one borrowing in the detail shape, scoped to the caller.
    ///
    /// Visibility is part of the query itself: an id owned by someone else
    /// and a missing id are the same not-found, so existence never leaks.
    pub async fn get_details(&self, caller: Caller, id: i32) -> AppResult<BorrowingDetails> {
        sqlx::query_as::<_, BorrowingDetails>(
            r#"
            SELECT b.id, b.borrow_date, b.expected_return_date, b.actual_return_date,
                   bk.title as book_title, bk.daily_fee as book_daily_fee,
                   u.email as user_email
            FROM borrowings b
            JOIN books bk ON b.book_id = bk.id
            JOIN users u ON b.user_id = u.id
            WHERE b.id = $1 AND ($2 OR b.user_id = $3)
            "#,
        )
        .bind(id)
        .bind(caller.is_staff)
        .bind(caller.user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))
    }

    /// Get one borrowing row, scoped to the caller like `get_details`.
    pub async fn get_by_id(&self, caller: Caller, id: i32) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>(
            r#"
            SELECT id, borrow_date, expected_return_date, actual_return_date, book_id, user_id
            FROM borrowings
            WHERE id = $1 AND ($2 OR user_id = $3)
            "#,
        )
        .bind(id)
        .bind(caller.is_staff)
        .bind(caller.user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))
    }

    /// Mark a borrowing returned and restore the book's inventory atomically.
    ///
    /// The `actual_return_date IS NULL` guard makes a double return a
    /// conflict instead of a double increment.
    pub async fn mark_returned(
        &self,
        caller: Caller,
        id: i32,
        return_date: NaiveDate,
    ) -> AppResult<Borrowing> {
        let mut tx = self.pool.begin().await?;

        let borrowing = sqlx::query_as::<_, Borrowing>(
            r#"
            SELECT id, borrow_date, expected_return_date, actual_return_date, book_id, user_id
            FROM borrowings
            WHERE id = $1 AND ($2 OR user_id = $3)
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(caller.is_staff)
        .bind(caller.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))?;

        let updated = sqlx::query(
            "UPDATE borrowings SET actual_return_date = $1 WHERE id = $2 AND actual_return_date IS NULL",
        )
        .bind(return_date)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Borrowing has already been returned".to_string(),
            ));
        }

        sqlx::query("UPDATE books SET inventory = inventory + 1 WHERE id = $1")
            .bind(borrowing.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Borrowing {
            actual_return_date: Some(return_date),
            ..borrowing
        })
    }
}
