//! Repository layer: the document-store client interface and its backends

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::{DatabaseConfig, StoreBackend},
    error::StoreError,
    models::{Book, BookChanges, BookFilter, DeleteResult, InsertOneResult, NewBook, ObjectId, UpdateResult},
};

/// Operations over the `books` document collection.
///
/// Each call is a single store operation; atomicity is whatever the backend
/// provides for one document. Results come back in store order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Skip `skip` documents and return at most `limit`
    async fn find_page(&self, skip: u64, limit: u64) -> Result<Vec<Book>, StoreError>;

    /// Every document whose field equals the filter value exactly
    async fn find_by(&self, filter: BookFilter) -> Result<Vec<Book>, StoreError>;

    async fn find_all(&self) -> Result<Vec<Book>, StoreError>;

    async fn find_one(&self, id: ObjectId) -> Result<Option<Book>, StoreError>;

    async fn insert_one(&self, book: NewBook) -> Result<InsertOneResult, StoreError>;

    /// Set the supplied fields on the matching document, if any
    async fn update_one(&self, id: ObjectId, changes: BookChanges) -> Result<UpdateResult, StoreError>;

    async fn delete_one(&self, id: ObjectId) -> Result<DeleteResult, StoreError>;

    /// Round-trip to the backend, used by `/ready`
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Main repository struct holding the store handle shared by all requests
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
}

impl Repository {
    pub fn new(books: Arc<dyn BookStore>) -> Self {
        Self { books }
    }

    /// Repository over a fresh in-process collection
    pub fn in_memory() -> Self {
        Self::new(Arc::new(memory::MemoryBookStore::new()))
    }

    /// Open the configured backend, creating the collection if needed
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        match config.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory book store; data will not survive a restart");
                Ok(Self::in_memory())
            }
            StoreBackend::Postgres => {
                let store = postgres::PgBookStore::connect(config).await?;
                Ok(Self::new(Arc::new(store)))
            }
        }
    }
}
