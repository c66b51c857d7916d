//! Book collection stored as JSONB documents in PostgreSQL.
//!
//! One table per collection: `id` holds the hex object id, `seq` records
//! insertion order (the natural order of unsorted reads), and `doc` holds
//! the document body.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, Pool, Postgres};

use super::BookStore;
use crate::{
    config::DatabaseConfig,
    error::StoreError,
    models::{Book, BookChanges, BookFilter, DeleteResult, InsertOneResult, NewBook, ObjectId, UpdateResult},
};

static COLLECTION_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("valid collection pattern"));

#[derive(FromRow)]
struct DocumentRow {
    id: String,
    doc: Json<NewBook>,
}

impl TryFrom<DocumentRow> for Book {
    type Error = StoreError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let id = row
            .id
            .parse::<ObjectId>()
            .map_err(|e| StoreError::Unavailable(format!("corrupt document id: {}", e)))?;
        Ok(Book::from_parts(id, row.doc.0))
    }
}

#[derive(FromRow)]
struct UpdateCounts {
    matched: i64,
    modified: i64,
}

#[derive(Clone)]
pub struct PgBookStore {
    pool: Pool<Postgres>,
    table: String,
}

impl PgBookStore {
    /// Open a pool and make sure the collection table exists
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;

        tracing::info!("Connected to database");

        let store = Self::new(pool, &config.collection)?;
        store.ensure_collection().await?;
        Ok(store)
    }

    pub fn new(pool: Pool<Postgres>, collection: &str) -> Result<Self, StoreError> {
        if !COLLECTION_NAME_RE.is_match(collection) {
            return Err(StoreError::InvalidCollection(collection.to_string()));
        }
        Ok(Self {
            pool,
            table: collection.to_string(),
        })
    }

    pub async fn ensure_collection(&self) -> Result<(), StoreError> {
        let table = &self.table;
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id TEXT PRIMARY KEY,
                seq BIGSERIAL NOT NULL,
                doc JSONB NOT NULL
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        for field in ["title", "author"] {
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS {table}_{field}_idx ON {table} ((doc->>'{field}'))"
            ))
            .execute(&self.pool)
            .await?;
        }

        tracing::info!("Collection {} ready", table);
        Ok(())
    }

    fn into_books(rows: Vec<DocumentRow>) -> Result<Vec<Book>, StoreError> {
        rows.into_iter().map(Book::try_from).collect()
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn find_page(&self, skip: u64, limit: u64) -> Result<Vec<Book>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT id, doc FROM {} ORDER BY seq LIMIT $1 OFFSET $2",
            self.table
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(skip).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        Self::into_books(rows)
    }

    async fn find_by(&self, filter: BookFilter) -> Result<Vec<Book>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT id, doc FROM {} WHERE doc->>$1 = $2 ORDER BY seq",
            self.table
        ))
        .bind(filter.field())
        .bind(filter.value())
        .fetch_all(&self.pool)
        .await?;
        Self::into_books(rows)
    }

    async fn find_all(&self) -> Result<Vec<Book>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT id, doc FROM {} ORDER BY seq",
            self.table
        ))
        .fetch_all(&self.pool)
        .await?;
        Self::into_books(rows)
    }

    async fn find_one(&self, id: ObjectId) -> Result<Option<Book>, StoreError> {
        sqlx::query_as::<_, DocumentRow>(&format!("SELECT id, doc FROM {} WHERE id = $1", self.table))
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await?
            .map(Book::try_from)
            .transpose()
    }

    async fn insert_one(&self, book: NewBook) -> Result<InsertOneResult, StoreError> {
        let id = ObjectId::new();
        sqlx::query(&format!("INSERT INTO {} (id, doc) VALUES ($1, $2)", self.table))
            .bind(id.to_hex())
            .bind(Json(&book))
            .execute(&self.pool)
            .await?;
        Ok(InsertOneResult {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn update_one(&self, id: ObjectId, changes: BookChanges) -> Result<UpdateResult, StoreError> {
        let table = &self.table;
        let counts = sqlx::query_as::<_, UpdateCounts>(&format!(
            r#"
            WITH target AS (
                SELECT id, doc FROM {table} WHERE id = $1
            ),
            updated AS (
                UPDATE {table} b SET doc = b.doc || $2::jsonb
                FROM target t
                WHERE b.id = t.id AND NOT (t.doc @> $2::jsonb)
                RETURNING b.id
            )
            SELECT
                (SELECT COUNT(*) FROM target) AS matched,
                (SELECT COUNT(*) FROM updated) AS modified
            "#
        ))
        .bind(id.to_hex())
        .bind(Json(&changes))
        .fetch_one(&self.pool)
        .await?;

        Ok(UpdateResult::new(
            u64::try_from(counts.matched).unwrap_or(0),
            u64::try_from(counts.modified).unwrap_or(0),
        ))
    }

    async fn delete_one(&self, id: ObjectId) -> Result<DeleteResult, StoreError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", self.table))
            .bind(id.to_hex())
            .execute(&self.pool)
            .await?;
        Ok(DeleteResult::new(result.rows_affected()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_names_are_plain_identifiers() {
        assert!(COLLECTION_NAME_RE.is_match("books"));
        assert!(COLLECTION_NAME_RE.is_match("_books_2"));
        assert!(!COLLECTION_NAME_RE.is_match("books; DROP TABLE x"));
        assert!(!COLLECTION_NAME_RE.is_match("1books"));
        assert!(!COLLECTION_NAME_RE.is_match(""));
    }
}
