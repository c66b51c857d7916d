//! Book resource service: input validation and collection operations

use serde_json::{Map, Value};

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult, FieldErrors, StoreOperation},
    models::{
        book::{ListQuery, SearchQuery},
        Book, BookChanges, BookFilter, BookPage, BookStats, DeleteResult, InsertOneResult, NewBook, ObjectId,
        UpdateResult,
    },
    repository::Repository,
};

/// Largest accepted publication year
pub const MAX_PUBLICATION_YEAR: u16 = 9999;

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    pagination: PaginationConfig,
}

impl BooksService {
    pub fn new(repository: Repository, pagination: PaginationConfig) -> Self {
        Self { repository, pagination }
    }

    /// One page of the collection in store order.
    ///
    /// An empty page is reported as `PageNotFound`, whether the page is past
    /// the end or the collection is empty.
    pub async fn list(&self, query: &ListQuery) -> AppResult<BookPage> {
        let page = coerce_positive(query.page.as_deref(), self.pagination.default_page);
        let mut size = coerce_positive(query.size.as_deref(), self.pagination.default_size);
        if let Some(max_size) = self.pagination.max_size {
            size = size.min(max_size.max(1));
        }
        let skip = page.saturating_sub(1).saturating_mul(size);

        let results = self
            .repository
            .books
            .find_page(skip, size)
            .await
            .map_err(AppError::store(StoreOperation::Find))?;

        if results.is_empty() {
            return Err(AppError::PageNotFound);
        }

        Ok(BookPage { page, size, results })
    }

    /// Exact-match search on title (preferred) or author
    pub async fn search(&self, query: &SearchQuery) -> AppResult<Vec<Book>> {
        let Some(filter) = search_filter(query) else {
            return Ok(Vec::new());
        };

        self.repository
            .books
            .find_by(filter)
            .await
            .map_err(AppError::store(StoreOperation::Find))
    }

    pub async fn stats(&self) -> AppResult<BookStats> {
        let books = self
            .repository
            .books
            .find_all()
            .await
            .map_err(AppError::store(StoreOperation::Stats))?;
        Ok(compute_stats(books))
    }

    pub async fn get(&self, id: &str) -> AppResult<Book> {
        let id = id.parse::<ObjectId>().map_err(|_| AppError::InvalidId)?;
        self.repository
            .books
            .find_one(id)
            .await
            .map_err(AppError::store(StoreOperation::Find))?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(&self, body: &Value) -> AppResult<InsertOneResult> {
        let book = validate_new_book(body)?;
        let result = self
            .repository
            .books
            .insert_one(book)
            .await
            .map_err(AppError::store(StoreOperation::Insert))?;

        tracing::info!("Created book {}", result.inserted_id);
        Ok(result)
    }

    /// Partial update. An unknown id is not an error: the result simply
    /// reports zero matches.
    pub async fn update(&self, id: &str, body: &Value) -> AppResult<UpdateResult> {
        let (id, changes) = validate_changes(id, body)?;
        let result = self
            .repository
            .books
            .update_one(id, changes)
            .await
            .map_err(AppError::store(StoreOperation::Update))?;

        tracing::debug!(
            "Updated book {}: matched={} modified={}",
            id,
            result.matched_count,
            result.modified_count
        );
        Ok(result)
    }

    pub async fn delete(&self, id: &str) -> AppResult<DeleteResult> {
        let id = id.parse::<ObjectId>().map_err(|_| AppError::InvalidId)?;
        let result = self
            .repository
            .books
            .delete_one(id)
            .await
            .map_err(AppError::store(StoreOperation::Delete))?;

        tracing::info!("Deleted book {} (deleted_count={})", id, result.deleted_count);
        Ok(result)
    }

    /// Check that the store answers
    pub async fn ping(&self) -> bool {
        match self.repository.books.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Store ping failed: {}", e);
                false
            }
        }
    }
}

/// Coerce a raw query value to a positive integer.
///
/// Leading whitespace and a sign are skipped, then the leading run of digits
/// is read; trailing garbage is ignored. The absolute value is used, and a
/// missing, digit-less or zero value yields `default`.
pub fn coerce_positive(raw: Option<&str>, default: u64) -> u64 {
    let Some(raw) = raw else {
        return default;
    };
    let s = raw.trim_start();
    let s = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());

    match s[..end].parse::<u64>() {
        Ok(0) => default,
        Ok(n) => n,
        Err(_) if end > 0 => u64::MAX,
        Err(_) => default,
    }
}

/// Parse a publication year given as a JSON integer (an integral float is
/// accepted too) or a string of one to four digits. Anything else, including values above
/// [`MAX_PUBLICATION_YEAR`], is rejected.
pub fn parse_year(value: &Value) -> Option<u16> {
    let year = match value {
        Value::Number(n) => match n.as_u64() {
            Some(year) => year,
            // JSON clients may send 1965.0 for an integer year
            None => {
                let max = f64::from(MAX_PUBLICATION_YEAR);
                let f = n.as_f64().filter(|f| f.fract() == 0.0 && (0.0..=max).contains(f))?;
                f as u64
            }
        },
        Value::String(s) if (1..=4).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse::<u64>().ok()?
        }
        _ => return None,
    };
    u16::try_from(year).ok().filter(|y| *y <= MAX_PUBLICATION_YEAR)
}

/// Values a client can send to mean "leave this field alone"
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

fn non_empty_str<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn as_object(body: &Value) -> Map<String, Value> {
    body.as_object().cloned().unwrap_or_default()
}

/// Validate a create request. Every violation is reported at once.
pub fn validate_new_book(body: &Value) -> AppResult<NewBook> {
    let fields = as_object(body);
    let mut errors = FieldErrors::default();

    let title = non_empty_str(&fields, "title");
    if title.is_none() {
        errors.invalid_title();
    }
    let author = non_empty_str(&fields, "author");
    if author.is_none() {
        errors.invalid_author();
    }
    let year = fields.get("publicationYear").and_then(parse_year);
    if year.is_none() {
        errors.invalid_year();
    }

    match (title, author, year) {
        (Some(title), Some(author), Some(publication_year)) if errors.is_empty() => Ok(NewBook {
            title: title.to_string(),
            author: author.to_string(),
            publication_year,
        }),
        _ => Err(AppError::Validation(errors)),
    }
}

/// Validate an update request: the path id plus whichever fields were sent.
///
/// Blank fields are skipped. An invalid year is reported and never written.
pub fn validate_changes(id: &str, body: &Value) -> AppResult<(ObjectId, BookChanges)> {
    let fields = as_object(body);
    let mut errors = FieldErrors::default();
    let mut changes = BookChanges::default();

    match fields.get("title") {
        Some(v) if is_blank(v) => {}
        Some(Value::String(s)) => changes.title = Some(s.clone()),
        Some(_) => errors.invalid_title(),
        None => {}
    }
    match fields.get("author") {
        Some(v) if is_blank(v) => {}
        Some(Value::String(s)) => changes.author = Some(s.clone()),
        Some(_) => errors.invalid_author(),
        None => {}
    }
    match fields.get("publicationYear") {
        Some(v) if is_blank(v) => {}
        Some(v) => match parse_year(v) {
            Some(year) => changes.publication_year = Some(year),
            None => errors.invalid_year(),
        },
        None => {}
    }

    let id = id.parse::<ObjectId>().ok();
    if id.is_none() {
        errors.invalid_id();
    }

    match id {
        Some(id) if errors.is_empty() => Ok((id, changes)),
        _ => Err(AppError::Validation(errors)),
    }
}

/// Title filter wins over author; blank values are ignored
pub fn search_filter(query: &SearchQuery) -> Option<BookFilter> {
    let title = query.title.as_deref().filter(|s| !s.is_empty());
    let author = query.author.as_deref().filter(|s| !s.is_empty());
    match (title, author) {
        (Some(title), _) => Some(BookFilter::Title(title.to_string())),
        (None, Some(author)) => Some(BookFilter::Author(author.to_string())),
        (None, None) => None,
    }
}

/// Summarise the whole collection.
///
/// Both orderings are stable sorts over store order, so among equal keys
/// the minimum is the first such document and the maximum the last.
pub fn compute_stats(books: Vec<Book>) -> BookStats {
    let mut by_year = books.clone();
    by_year.sort_by_key(|b| b.publication_year);

    let mut by_title = books;
    by_title.sort_by_key(Book::title_len);

    BookStats {
        total_books: by_year.len() as u64,
        earliest_published: by_year.first().cloned(),
        latest_published: by_year.last().cloned(),
        shortest_title: by_title.first().cloned(),
        longest_title: by_title.last().cloned(),
    }
}
