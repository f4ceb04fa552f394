//! Reader endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::{
        loan::LoanDetails,
        reader::{ActiveReader, CreateReader, Reader, ReaderMatch, ReaderQuery, UpdateMembership},
    },
    AppState,
};

/// Page of readers
#[derive(Serialize, ToSchema)]
pub struct ReaderPage {
    pub items: Vec<Reader>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Reader lookup parameters
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LookupQuery {
    /// Substring of name, phone or email
    pub q: Option<String>,
}

/// A reader together with loans
#[derive(Serialize, ToSchema)]
pub struct ReaderLoans {
    pub reader: Reader,
    pub loans: Vec<LoanDetails>,
}

/// List or search readers
#[utoipa::path(
    get,
    path = "/readers",
    tag = "readers",
    security(("bearer_auth" = [])),
    params(ReaderQuery),
    responses(
        (status = 200, description = "Page of readers", body = ReaderPage)
    )
)]
pub async fn list_readers(
    State(state): State<AppState>,
    Query(query): Query<ReaderQuery>,
) -> AppResult<Json<ReaderPage>> {
    let (items, total) = state.services.readers.search(&query).await?;

    Ok(Json(ReaderPage {
        items,
        total,
        page: query.page(),
        per_page: query.per_page(),
    }))
}

/// Quick reader lookup returning id, name and phone
#[utoipa::path(
    get,
    path = "/readers/search",
    tag = "readers",
    security(("bearer_auth" = [])),
    params(LookupQuery),
    responses(
        (status = 200, description = "Up to 10 matching readers", body = Vec<ReaderMatch>)
    )
)]
pub async fn search_readers(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> AppResult<Json<Vec<ReaderMatch>>> {
    let matches = state
        .services
        .readers
        .lookup(query.q.as_deref().unwrap_or(""))
        .await?;
    Ok(Json(matches))
}

/// Register a reader
#[utoipa::path(
    post,
    path = "/readers",
    tag = "readers",
    security(("bearer_auth" = [])),
    request_body = CreateReader,
    responses(
        (status = 201, description = "Reader registered", body = Reader),
        (status = 400, description = "Invalid input, phone or email already registered")
    )
)]
pub async fn create_reader(
    State(state): State<AppState>,
    Json(data): Json<CreateReader>,
) -> AppResult<(StatusCode, Json<Reader>)> {
    let reader = state.services.readers.create_reader(data).await?;
    Ok((StatusCode::CREATED, Json(reader)))
}

/// Get a reader by library card token or phone
#[utoipa::path(
    get,
    path = "/readers/{key}",
    tag = "readers",
    security(("bearer_auth" = [])),
    params(("key" = String, Path, description = "Library card token or phone number")),
    responses(
        (status = 200, description = "Reader", body = Reader),
        (status = 404, description = "Reader not found")
    )
)]
pub async fn get_reader(State(state): State<AppState>, Path(key): Path<String>) -> AppResult<Json<Reader>> {
    let reader = state.services.readers.get(&key).await?;
    Ok(Json(reader))
}

/// Delete a reader
#[utoipa::path(
    delete,
    path = "/readers/{key}",
    tag = "readers",
    security(("bearer_auth" = [])),
    params(("key" = String, Path, description = "Library card token or phone number")),
    responses(
        (status = 204, description = "Reader deleted"),
        (status = 404, description = "Reader not found"),
        (status = 409, description = "Reader holds books, or the delete policy forbids it")
    )
)]
pub async fn delete_reader(State(state): State<AppState>, Path(key): Path<String>) -> AppResult<StatusCode> {
    state.services.readers.delete_reader(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Change a reader's membership tier
#[utoipa::path(
    put,
    path = "/readers/{key}/membership",
    tag = "readers",
    security(("bearer_auth" = [])),
    params(("key" = String, Path, description = "Library card token or phone number")),
    request_body = UpdateMembership,
    responses(
        (status = 200, description = "Membership updated", body = Reader),
        (status = 404, description = "Reader not found")
    )
)]
pub async fn change_membership(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(data): Json<UpdateMembership>,
) -> AppResult<Json<Reader>> {
    let reader = state
        .services
        .readers
        .change_membership(&key, data.membership)
        .await?;
    Ok(Json(reader))
}

/// Full loan history of a reader, newest first
#[utoipa::path(
    get,
    path = "/readers/{key}/history",
    tag = "readers",
    security(("bearer_auth" = [])),
    params(("key" = String, Path, description = "Library card token or phone number")),
    responses(
        (status = 200, description = "Reader and all their loans", body = ReaderLoans),
        (status = 404, description = "Reader not found")
    )
)]
pub async fn reader_history(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<ReaderLoans>> {
    let (reader, loans) = state.services.readers.history(&key).await?;
    Ok(Json(ReaderLoans { reader, loans }))
}

/// Books currently held by a reader
#[utoipa::path(
    get,
    path = "/readers/{key}/loans",
    tag = "readers",
    security(("bearer_auth" = [])),
    params(("key" = String, Path, description = "Library card token or phone number")),
    responses(
        (status = 200, description = "Reader and their active loans", body = ReaderLoans),
        (status = 404, description = "Reader not found")
    )
)]
pub async fn reader_loans(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<ReaderLoans>> {
    let (reader, loans) = state.services.readers.active_loans(&key).await?;
    Ok(Json(ReaderLoans { reader, loans }))
}

/// Readers currently holding at least one book
#[utoipa::path(
    get,
    path = "/readers/active",
    tag = "readers",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Readers with their active-loan count", body = Vec<ActiveReader>)
    )
)]
pub async fn active_readers(State(state): State<AppState>) -> AppResult<Json<Vec<ActiveReader>>> {
    let readers = state.services.readers.active_readers().await?;
    Ok(Json(readers))
}
