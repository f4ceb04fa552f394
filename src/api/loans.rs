//! Loan management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::loan::{CreateLoan, Loan},
    AppState,
};

use super::StaffUser;

/// Issue response
#[derive(Serialize, ToSchema)]
pub struct IssueResponse {
    pub loan: Loan,
    /// Copies of the book left on the shelf
    pub available_copies: i32,
    pub message: String,
}

/// Return response
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub status: String,
    pub loan: Loan,
    /// Copies of the book on the shelf after the return
    pub available_copies: i32,
}

/// Issue a book to a reader
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Book issued", body = IssueResponse),
        (status = 404, description = "Reader or book not found"),
        (status = 409, description = "Book already issued to this reader, or no copy available"),
        (status = 422, description = "Reader reached their issue limit")
    )
)]
pub async fn issue_book(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Json(request): Json<CreateLoan>,
) -> AppResult<(StatusCode, Json<IssueResponse>)> {
    tracing::debug!(staff = %staff.sub, reader = %request.reader, book_id = request.book_id, "Issue requested");

    let (loan, book) = state.services.loans.issue(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(IssueResponse {
            loan,
            available_copies: book.available_copies,
            message: "Book issued successfully".to_string(),
        }),
    ))
}

/// Get a loan
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan", body = Loan),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.get_loan(id).await?;
    Ok(Json(loan))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan already returned")
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<ReturnResponse>> {
    tracing::debug!(staff = %staff.sub, loan_id, "Return requested");

    let (loan, book) = state.services.loans.return_loan(loan_id).await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        loan,
        available_copies: book.available_copies,
    }))
}
