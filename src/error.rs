//! Error types for Bookshelf server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Failures raised by a document store implementation
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid collection name: {0:?}")]
    InvalidCollection(String),
}

/// The store operation a request was performing when it failed.
///
/// Each maps to the generic message returned to the caller; the underlying
/// cause is only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Find,
    Insert,
    Update,
    Delete,
    Stats,
}

impl StoreOperation {
    pub fn public_message(self) -> &'static str {
        match self {
            StoreOperation::Find => "Error finding books",
            StoreOperation::Insert => "Error adding record",
            StoreOperation::Update => "Error updating record",
            StoreOperation::Delete => "Error deleting record",
            StoreOperation::Stats => "Error computing stats",
        }
    }
}

/// Field validation failures, accumulated over one request.
///
/// Serialized with the key names the front-end reads (`titleErr`, ...);
/// only the violated fields are present.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldErrors {
    #[serde(rename = "titleErr", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "authorErr", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(rename = "yearErr", skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(rename = "idErr", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

pub const INVALID_TITLE: &str = "Invalid title";
pub const INVALID_AUTHOR: &str = "Invalid author";
pub const INVALID_YEAR: &str = "Invalid year";
pub const INVALID_ID: &str = "Invalid ID type";
pub const NOT_FOUND: &str = "Not found";
pub const PAGE_NOT_FOUND: &str = "Page not found";

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.year.is_none() && self.id.is_none()
    }

    pub fn invalid_title(&mut self) {
        self.title = Some(INVALID_TITLE.to_string());
    }

    pub fn invalid_author(&mut self) {
        self.author = Some(INVALID_AUTHOR.to_string());
    }

    pub fn invalid_year(&mut self) {
        self.year = Some(INVALID_YEAR.to_string());
    }

    pub fn invalid_id(&mut self) {
        self.id = Some(INVALID_ID.to_string());
    }

    /// `Ok(value)` when nothing was recorded, otherwise a validation error
    pub fn into_result<T>(self, value: T) -> AppResult<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(AppError::Validation(self))
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0:?}")]
    Validation(FieldErrors),

    #[error("Invalid ID type")]
    InvalidId,

    #[error("Not found")]
    NotFound,

    #[error("Page not found")]
    PageNotFound,

    #[error("{operation:?} failed: {source}")]
    Store {
        operation: StoreOperation,
        #[source]
        source: StoreError,
    },
}

impl AppError {
    /// Wrap a store failure with the operation it interrupted, for `map_err`
    pub fn store(operation: StoreOperation) -> impl FnOnce(StoreError) -> AppError {
        move |source| AppError::Store { operation, source }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => {
                tracing::debug!("Rejected request: {:?}", errors);
                (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response()
            }
            AppError::InvalidId => (StatusCode::UNPROCESSABLE_ENTITY, INVALID_ID).into_response(),
            AppError::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND).into_response(),
            AppError::PageNotFound => (StatusCode::NOT_FOUND, PAGE_NOT_FOUND).into_response(),
            AppError::Store { operation, source } => {
                tracing::error!("Store error during {:?}: {:?}", operation, source);
                (StatusCode::INTERNAL_SERVER_ERROR, operation.public_message()).into_response()
            }
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
