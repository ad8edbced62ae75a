//! Borrowing model and related types

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

/// Borrowing model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrowing {
    pub id: i32,
    pub borrow_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    /// None while the copy is still out
    pub actual_return_date: Option<NaiveDate>,
    pub book_id: i32,
    pub user_id: i32,
}

impl Borrowing {
    pub fn is_active(&self) -> bool {
        self.actual_return_date.is_none()
    }
}

/// Borrowing with embedded book and user details for display
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowingDetails {
    pub id: i32,
    pub borrow_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
    pub book_title: String,
    /// Daily fee of the borrowed book, two decimal places
    #[schema(value_type = String, example = "3.25")]
    pub book_daily_fee: Decimal,
    pub user_email: String,
}

/// Create borrowing request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBorrowing {
    pub book_id: i32,
    pub expected_return_date: NaiveDate,
}

/// Borrowing list query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct BorrowingQuery {
    /// Narrow to one user's borrowings (staff only; ignored for members)
    pub user_id: Option<i32>,
    /// Tri-state active filter: truthy selects unreturned, falsy returned,
    /// anything else no filtering
    pub is_active: Option<String>,
}

impl BorrowingQuery {
    pub fn active_filter(&self) -> Option<bool> {
        self.is_active.as_deref().and_then(parse_active_flag)
    }
}

/// Parse common truthy/falsy tokens, case-insensitive.
///
/// Unrecognized tokens mean "no filter", not an error.
pub fn parse_active_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// A return date is only acceptable strictly after the borrow day.
pub fn validate_expected_return_date(expected: NaiveDate, today: NaiveDate) -> AppResult<()> {
    if expected <= today {
        return Err(AppError::validation(
            "expected_return_date",
            "expected_return_date must be in the future",
        ));
    }
    Ok(())
}
