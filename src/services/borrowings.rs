//! Borrowing lifecycle service
//!
//! Every operation takes the caller identity explicitly; visibility and
//! authorization decisions live here and in the scoped repository queries.

use chrono::Utc;

use crate::{
    error::AppResult,
    models::borrowing::{
        validate_expected_return_date, Borrowing, BorrowingDetails, BorrowingQuery,
        CreateBorrowing,
    },
    models::user::Caller,
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowingsService {
    repository: Repository,
}

impl BorrowingsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Borrow a book for the caller.
    ///
    /// Validates the return date up front; existence and stock checks happen
    /// inside the repository transaction so they hold under concurrency.
    pub async fn create(&self, caller: Caller, request: CreateBorrowing) -> AppResult<Borrowing> {
        let today = Utc::now().date_naive();
        validate_expected_return_date(request.expected_return_date, today)?;

        let borrowing = self
            .repository
            .borrowings
            .create(
                caller.user_id,
                request.book_id,
                today,
                request.expected_return_date,
            )
            .await?;

        tracing::info!(
            "Borrowing {} created: user {} borrowed book {}",
            borrowing.id,
            borrowing.user_id,
            borrowing.book_id
        );
        Ok(borrowing)
    }

    /// List borrowings visible to the caller.
    ///
    /// Members always get their own rows; the user_id filter only narrows
    /// for staff and is silently ignored otherwise.
    pub async fn list(&self, caller: Caller, query: &BorrowingQuery) -> AppResult<Vec<Borrowing>> {
        self.repository
            .borrowings
            .list(caller, query.user_id, query.active_filter())
            .await
    }

    /// Get one borrowing in the detail shape
    pub async fn get(&self, caller: Caller, id: i32) -> AppResult<BorrowingDetails> {
        self.repository.borrowings.get_details(caller, id).await
    }

    /// Return a borrowed book.
    ///
    /// Owner or staff only; sets today's return date and restores the
    /// book's inventory in one transaction.
    pub async fn mark_returned(&self, caller: Caller, id: i32) -> AppResult<Borrowing> {
        let today = Utc::now().date_naive();
        let borrowing = self
            .repository
            .borrowings
            .mark_returned(caller, id, today)
            .await?;

        tracing::info!(
            "Borrowing {} returned: book {} back in stock",
            borrowing.id,
            borrowing.book_id
        );
        Ok(borrowing)
    }
}
