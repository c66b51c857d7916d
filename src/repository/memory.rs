//! In-process book collection, ordered by insertion

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use super::BookStore;
use crate::{
    error::StoreError,
    models::{Book, BookChanges, BookFilter, DeleteResult, InsertOneResult, NewBook, ObjectId, UpdateResult},
};

#[derive(Default)]
pub struct MemoryBookStore {
    documents: RwLock<IndexMap<ObjectId, Book>>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn find_page(&self, skip: u64, limit: u64) -> Result<Vec<Book>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .values()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn find_by(&self, filter: BookFilter) -> Result<Vec<Book>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.values().filter(|b| filter.matches(b)).cloned().collect())
    }

    async fn find_all(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.documents.read().await.values().cloned().collect())
    }

    async fn find_one(&self, id: ObjectId) -> Result<Option<Book>, StoreError> {
        Ok(self.documents.read().await.get(&id).cloned())
    }

    async fn insert_one(&self, book: NewBook) -> Result<InsertOneResult, StoreError> {
        let id = ObjectId::new();
        self.documents.write().await.insert(id, Book::from_parts(id, book));
        Ok(InsertOneResult {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn update_one(&self, id: ObjectId, changes: BookChanges) -> Result<UpdateResult, StoreError> {
        let mut documents = self.documents.write().await;
        Ok(match documents.get_mut(&id) {
            Some(book) => {
                let modified = book.apply(&changes);
                UpdateResult::new(1, u64::from(modified))
            }
            None => UpdateResult::new(0, 0),
        })
    }

    async fn delete_one(&self, id: ObjectId) -> Result<DeleteResult, StoreError> {
        let removed = self.documents.write().await.shift_remove(&id);
        Ok(DeleteResult::new(u64::from(removed.is_some())))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
