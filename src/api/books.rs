//! Book resource endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::{
    error::{AppResult, NOT_FOUND},
    models::{
        book::{ListQuery, SearchQuery},
        Book, BookPage, BookStats, DeleteResult, InsertOneResult, UpdateResult,
    },
    AppState,
};

use super::QueryPairs;

/// Request bodies that fail to parse as JSON are validated as `{}`
fn body_or_empty(body: Option<Json<Value>>) -> Value {
    body.map(|Json(v)| v).unwrap_or_else(|| Value::Object(Default::default()))
}

/// List books, paginated
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of books", body = BookPage),
        (status = 404, description = "Page not found", body = String),
        (status = 500, description = "Error finding books", body = String)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    QueryPairs(pairs): QueryPairs,
) -> AppResult<Json<BookPage>> {
    let page = state.services.books.list(&ListQuery::from_pairs(&pairs)).await?;
    Ok(Json(page))
}

/// Search books by exact title or author
#[utoipa::path(
    get,
    path = "/books/search",
    tag = "books",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching books, or the text `Not found` when nothing matches", body = Vec<Book>),
        (status = 500, description = "Error finding books", body = String)
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    QueryPairs(pairs): QueryPairs,
) -> AppResult<Response> {
    let books = state.services.books.search(&SearchQuery::from_pairs(&pairs)).await?;
    if books.is_empty() {
        return Ok((StatusCode::OK, NOT_FOUND).into_response());
    }
    Ok(Json(books).into_response())
}

/// Collection statistics
#[utoipa::path(
    get,
    path = "/books/stats",
    tag = "books",
    responses(
        (status = 200, description = "Statistics over the whole collection", body = BookStats),
        (status = 500, description = "Error computing stats", body = String)
    )
)]
pub async fn book_stats(State(state): State<AppState>) -> AppResult<Json<BookStats>> {
    let stats = state.services.books.stats().await?;
    Ok(Json(stats))
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID (24 hex characters)")),
    responses(
        (status = 200, description = "Book document", body = Book),
        (status = 404, description = "Not found", body = String),
        (status = 422, description = "Invalid ID type", body = String)
    )
)]
pub async fn get_book(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<Book>> {
    let book = state.services.books.get(&id).await?;
    Ok(Json(book))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = crate::models::NewBook,
    responses(
        (status = 201, description = "Book created", body = InsertOneResult),
        (status = 422, description = "Validation failed", body = crate::error::FieldErrors),
        (status = 500, description = "Error adding record", body = String)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> AppResult<(StatusCode, Json<InsertOneResult>)> {
    let result = state.services.books.create(&body_or_empty(body)).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// Update some fields of a book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID (24 hex characters)")),
    request_body = crate::models::BookChanges,
    responses(
        (status = 200, description = "Update applied (possibly to zero documents)", body = UpdateResult),
        (status = 422, description = "Validation failed", body = crate::error::FieldErrors),
        (status = 500, description = "Error updating record", body = String)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<Value>>,
) -> AppResult<Json<UpdateResult>> {
    let result = state.services.books.update(&id, &body_or_empty(body)).await?;
    Ok(Json(result))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID (24 hex characters)")),
    responses(
        (status = 200, description = "Delete applied (possibly to zero documents)", body = DeleteResult),
        (status = 422, description = "Invalid ID type", body = String),
        (status = 500, description = "Error deleting record", body = String)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeleteResult>> {
    let result = state.services.books.delete(&id).await?;
    Ok(Json(result))
}
