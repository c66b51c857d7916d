//! Book document model and the shapes returned by collection operations

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::object_id::ObjectId;

/// A book record as stored in the collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Store-assigned identifier (24 hex characters)
    #[serde(rename = "_id")]
    #[schema(value_type = String, example = "65a1f2c3d4e5f60718293a4b")]
    pub id: ObjectId,
    pub title: String,
    pub author: String,
    #[schema(example = 1986)]
    pub publication_year: u16,
}

impl Book {
    pub fn from_parts(id: ObjectId, fields: NewBook) -> Self {
        Self {
            id,
            title: fields.title,
            author: fields.author,
            publication_year: fields.publication_year,
        }
    }

    /// Apply a partial update in place; returns whether anything changed
    pub fn apply(&mut self, changes: &BookChanges) -> bool {
        let mut modified = false;
        if let Some(ref title) = changes.title {
            modified |= self.title != *title;
            self.title = title.clone();
        }
        if let Some(ref author) = changes.author {
            modified |= self.author != *author;
            self.author = author.clone();
        }
        if let Some(year) = changes.publication_year {
            modified |= self.publication_year != year;
            self.publication_year = year;
        }
        modified
    }

    /// Title length in Unicode scalar values
    pub fn title_len(&self) -> usize {
        self.title.chars().count()
    }
}

/// Validated fields of a book about to be inserted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    #[schema(example = "Redwall")]
    pub title: String,
    #[schema(example = "Brian Jacques")]
    pub author: String,
    /// Integer, or a string of one to four digits
    #[schema(value_type = Object, example = 1986)]
    pub publication_year: u16,
}

/// Validated subset of fields for a partial update.
///
/// Serializes to exactly the fields being set, which doubles as the
/// merge patch sent to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>, example = "1969")]
    pub publication_year: Option<u16>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.publication_year.is_none()
    }
}

/// Exact-match filter used by search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookFilter {
    Title(String),
    Author(String),
}

impl BookFilter {
    /// Document field the filter applies to
    pub fn field(&self) -> &'static str {
        match self {
            BookFilter::Title(_) => "title",
            BookFilter::Author(_) => "author",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            BookFilter::Title(v) | BookFilter::Author(v) => v,
        }
    }

    pub fn matches(&self, book: &Book) -> bool {
        match self {
            BookFilter::Title(v) => book.title == *v,
            BookFilter::Author(v) => book.author == *v,
        }
    }
}

/// Result of inserting one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    #[schema(value_type = String)]
    pub inserted_id: ObjectId,
}

/// Result of updating at most one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    #[schema(value_type = Option<String>)]
    pub upserted_id: Option<ObjectId>,
    pub upserted_count: u64,
}

impl UpdateResult {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_id: None,
            upserted_count: 0,
        }
    }
}

/// Result of deleting at most one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

/// First value given for `key`; repeated keys never reject a request
fn first_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
}

/// Raw pagination query; values are coerced rather than rejected
#[derive(Debug, Clone, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 1-based page number (default: 1)
    pub page: Option<String>,
    /// Page size (default: 5)
    pub size: Option<String>,
}

impl ListQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            page: first_value(pairs, "page"),
            size: first_value(pairs, "size"),
        }
    }
}

/// One page of the collection
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookPage {
    pub page: u64,
    pub size: u64,
    pub results: Vec<Book>,
}

#[derive(Debug, Clone, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Exact title to match; takes precedence over `author`
    pub title: Option<String>,
    /// Exact author to match
    pub author: Option<String>,
}

impl SearchQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            title: first_value(pairs, "title"),
            author: first_value(pairs, "author"),
        }
    }
}

/// Whole-collection statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookStats {
    pub total_books: u64,
    pub earliest_published: Option<Book>,
    /// Wire name kept as the web client reads it
    #[serde(rename = "lastest_published", alias = "latest_published")]
    pub latest_published: Option<Book>,
    pub shortest_title: Option<Book>,
    pub longest_title: Option<Book>,
}
