//! API handlers for Libris REST endpoints

pub mod auth;
pub mod books;
pub mod categories;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod readers;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::staff::StaffClaims, AppState};

/// Staff gate applied to every domain route: a valid bearer token carrying
/// the staff flag is required. The verified claims are stored in the request
/// extensions for `StaffUser`.
pub async fn require_staff(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.ok_or_else(|| AppError::Authentication("Missing bearer token".to_string()))?;

    let claims = StaffClaims::from_token(bearer.token(), &state.config.auth.jwt_secret)
        .map_err(|e| AppError::Authentication(e.to_string()))?;

    if !claims.is_staff {
        return Err(AppError::Authorization(
            "You are not authorised to access staff panel".to_string(),
        ));
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Staff member behind the current request, as verified by `require_staff`
pub struct StaffUser(pub StaffClaims);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for StaffUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<StaffClaims>()
            .cloned()
            .map(StaffUser)
            .ok_or_else(|| AppError::Authentication("Not authenticated".to_string()))
    }
}

/// Build the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let staff_routes = Router::new()
        // Categories
        .route("/categories", get(categories::list_categories).post(categories::create_category))
        .route("/categories/:id", delete(categories::delete_category))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        // Readers
        .route("/readers", get(readers::list_readers).post(readers::create_reader))
        .route("/readers/search", get(readers::search_readers))
        .route("/readers/active", get(readers::active_readers))
        .route("/readers/:key", get(readers::get_reader).delete(readers::delete_reader))
        .route("/readers/:key/membership", put(readers::change_membership))
        .route("/readers/:key/history", get(readers::reader_history))
        .route("/readers/:key/loans", get(readers::reader_loans))
        // Loans
        .route("/loans", post(loans::issue_book))
        .route("/loans/:id", get(loans::get_loan))
        .route("/loans/:id/return", post(loans::return_book))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_staff));

    let api_v1 = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/auth/login", post(auth::login))
        .merge(staff_routes)
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
