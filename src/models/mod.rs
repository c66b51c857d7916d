//! Data models for Bookshelf

pub mod book;
pub mod object_id;

// Re-export commonly used types
pub use book::{Book, BookChanges, BookFilter, BookPage, BookStats, DeleteResult, InsertOneResult, NewBook, UpdateResult};
pub use object_id::ObjectId;
