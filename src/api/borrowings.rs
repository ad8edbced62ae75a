//! Borrowing endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::borrowing::{Borrowing, BorrowingDetails, BorrowingQuery, CreateBorrowing},
};

use super::AuthenticatedUser;

/// List borrowings visible to the caller
#[utoipa::path(
    get,
    path = "/borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = Option<i32>, Query, description = "Narrow to one user (staff only)"),
        ("is_active" = Option<String>, Query, description = "true/1/yes for active, false/0/no for returned")
    ),
    responses(
        (status = 200, description = "Borrowings visible to the caller", body = Vec<Borrowing>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_borrowings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BorrowingQuery>,
) -> AppResult<Json<Vec<Borrowing>>> {
    let borrowings = state
        .services
        .borrowings
        .list(claims.caller(), &query)
        .await?;
    Ok(Json(borrowings))
}

/// Get one borrowing with book and user details
#[utoipa::path(
    get,
    path = "/borrowings/{id}",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Borrowing details", body = BorrowingDetails),
        (status = 404, description = "Borrowing not found or not visible")
    )
)]
pub async fn get_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowingDetails>> {
    let details = state.services.borrowings.get(claims.caller(), id).await?;
    Ok(Json(details))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    request_body = CreateBorrowing,
    responses(
        (status = 201, description = "Borrowing created", body = Borrowing),
        (status = 400, description = "Past return date or book out of stock"),
        (status = 409, description = "Concurrent inventory change, retry")
    )
)]
pub async fn create_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBorrowing>,
) -> AppResult<(StatusCode, Json<Borrowing>)> {
    let borrowing = state
        .services
        .borrowings
        .create(claims.caller(), request)
        .await?;
    Ok((StatusCode::CREATED, Json(borrowing)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/borrowings/{id}/return",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = Borrowing),
        (status = 404, description = "Borrowing not found or not visible"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Borrowing>> {
    let borrowing = state
        .services
        .borrowings
        .mark_returned(claims.caller(), id)
        .await?;
    Ok(Json(borrowing))
}
