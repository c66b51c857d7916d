//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    api::{books, health},
    error::FieldErrors,
    models::{Book, BookChanges, BookPage, BookStats, DeleteResult, InsertOneResult, NewBook, UpdateResult},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshelf API",
        version = "1.0.0",
        description = "Book collection REST API"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::search_books,
        books::book_stats,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
    ),
    components(schemas(
        health::HealthResponse,
        Book,
        NewBook,
        BookChanges,
        BookPage,
        BookStats,
        InsertOneResult,
        UpdateResult,
        DeleteResult,
        FieldErrors,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book collection")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_book_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        for expected in ["/books", "/books/search", "/books/stats", "/books/{id}", "/health", "/ready"] {
            assert!(paths.iter().any(|p| p == expected), "missing {expected}");
        }
    }
}
