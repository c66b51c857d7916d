//! API handlers for Bookshelf REST endpoints

pub mod books;
pub mod health;
pub mod openapi;

use std::any::Any;

use axum::{
    async_trait,
    extract::{rejection::QueryRejection, FromRequestParts, Query},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Query string as raw key/value pairs, in order.
///
/// Repeated keys are kept rather than rejected; callers pick the value they want.
pub struct QueryPairs(pub Vec<(String, String)>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for QueryPairs {
    type Rejection = QueryRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state).await?;
        Ok(QueryPairs(pairs))
    }
}

/// Routes of the book resource, relative to its mount path.
///
/// `search` and `stats` are static segments and win over the `:id` capture.
fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(books::list_books).post(books::create_book))
        .route("/search", get(books::search_books))
        .route("/search/", get(books::search_books))
        .route("/stats", get(books::book_stats))
        .route("/stats/", get(books::book_stats))
        .route(
            "/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
}

/// Turn a handler panic into a bare 500
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Handler panicked: {}", detail);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    let mount_path = state.config.server.mount_path.trim_end_matches('/').to_string();

    let api = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check));

    let api = if mount_path.is_empty() {
        api.merge(book_routes())
    } else {
        // nesting maps the inner "/" to the bare prefix only
        api.nest(&mount_path, book_routes()).route(
            &format!("{}/", mount_path),
            get(books::list_books).post(books::create_book),
        )
    };

    Router::new()
        .merge(api.with_state(state))
        .merge(openapi::create_openapi_router())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
