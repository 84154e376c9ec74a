use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::model::{BookDetails, LibraryBook, SavePayload, SavedEntry};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),

    #[error("book with isbn {isbn} was not found after upsert")]
    MissingAfterUpsert { isbn: String },
}

/// Seam between the request handlers and the relational store.
///
/// `save_book` is the find-or-create-then-link sequence: resolve the book by
/// ISBN (creating it on first sight), then attach it to the user's library
/// with insert-or-ignore semantics. A duplicate link yields an empty result,
/// not an error.
#[async_trait]
pub trait LibraryStore: Send + Sync {
    async fn save_book(
        &self,
        user_id: i32,
        payload: &SavePayload,
    ) -> Result<Vec<SavedEntry>, StoreError>;

    async fn list_library(&self, user_id: i32) -> Result<Vec<LibraryBook>, StoreError>;
}

pub struct PgLibraryStore {
    pool: PgPool,
}

impl PgLibraryStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS books (
                book_id serial PRIMARY KEY,
                google_id text NOT NULL,
                title text NOT NULL,
                author text NOT NULL,
                description text,
                published_year text NOT NULL,
                isbn text NOT NULL UNIQUE,
                cover_img_url text NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS library (
                book_id integer NOT NULL REFERENCES books (book_id),
                user_id integer NOT NULL,
                completed_at timestamptz,
                UNIQUE (user_id, book_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct LinkRow {
    book_id: i32,
    user_id: i32,
    completed_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl LibraryStore for PgLibraryStore {
    async fn save_book(
        &self,
        user_id: i32,
        payload: &SavePayload,
    ) -> Result<Vec<SavedEntry>, StoreError> {
        let book = &payload.book;
        let mut tx = self.pool.begin().await?;

        // Atomic find-or-create: the conflict clause absorbs a concurrent
        // insert of the same ISBN, and the fallback select resolves the row
        // that won.
        let inserted: Option<i32> = sqlx::query_scalar(
            "INSERT INTO books (google_id, title, author, description, published_year, isbn, cover_img_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (isbn) DO NOTHING
             RETURNING book_id",
        )
        .bind(&book.google_id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.description)
        .bind(&book.published_year)
        .bind(&book.isbn)
        .bind(&book.cover_img_url)
        .fetch_optional(&mut *tx)
        .await?;

        let book_id = match inserted {
            Some(book_id) => book_id,
            None => sqlx::query_scalar::<_, i32>("SELECT book_id FROM books WHERE isbn = $1")
                .bind(&book.isbn)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| StoreError::MissingAfterUpsert {
                    isbn: book.isbn.clone(),
                })?,
        };

        let linked: Option<LinkRow> = sqlx::query_as(
            "INSERT INTO library (book_id, user_id, completed_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id, book_id) DO NOTHING
             RETURNING book_id, user_id, completed_at",
        )
        .bind(book_id)
        .bind(user_id)
        .bind(payload.completed_at)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(linked
            .map(|row| {
                vec![SavedEntry {
                    book_id: row.book_id,
                    user_id: row.user_id,
                    isbn: book.isbn.clone(),
                    completed_at: row.completed_at,
                }]
            })
            .unwrap_or_default())
    }

    async fn list_library(&self, user_id: i32) -> Result<Vec<LibraryBook>, StoreError> {
        let books = sqlx::query_as::<_, LibraryBook>(
            "SELECT b.book_id, b.google_id, b.title, b.author, b.description,
                    b.published_year, b.isbn, b.cover_img_url, l.completed_at
             FROM library l
             JOIN books b ON b.book_id = l.book_id
             WHERE l.user_id = $1
             ORDER BY b.book_id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }
}

/// In-process store with the same uniqueness invariants as the Postgres
/// schema. Used by the test suite and handy for local development.
#[derive(Default)]
pub struct MemoryLibraryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    books: Vec<StoredBook>,
    links: Vec<StoredLink>,
}

struct StoredBook {
    book_id: i32,
    details: BookDetails,
}

struct StoredLink {
    book_id: i32,
    user_id: i32,
    completed_at: Option<DateTime<Utc>>,
}

impl MemoryLibraryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LibraryStore for MemoryLibraryStore {
    async fn save_book(
        &self,
        user_id: i32,
        payload: &SavePayload,
    ) -> Result<Vec<SavedEntry>, StoreError> {
        let mut inner = self.inner.lock().expect("library store mutex poisoned");

        let existing = inner
            .books
            .iter()
            .find(|b| b.details.isbn == payload.book.isbn)
            .map(|b| b.book_id);
        let book_id = match existing {
            Some(book_id) => book_id,
            None => {
                let book_id = inner.books.len() as i32 + 1;
                inner.books.push(StoredBook {
                    book_id,
                    details: payload.book.clone(),
                });
                book_id
            }
        };

        let already_linked = inner
            .links
            .iter()
            .any(|l| l.user_id == user_id && l.book_id == book_id);
        if already_linked {
            return Ok(Vec::new());
        }

        inner.links.push(StoredLink {
            book_id,
            user_id,
            completed_at: payload.completed_at,
        });

        Ok(vec![SavedEntry {
            book_id,
            user_id,
            isbn: payload.book.isbn.clone(),
            completed_at: payload.completed_at,
        }])
    }

    async fn list_library(&self, user_id: i32) -> Result<Vec<LibraryBook>, StoreError> {
        let inner = self.inner.lock().expect("library store mutex poisoned");

        let mut books: Vec<LibraryBook> = inner
            .links
            .iter()
            .filter(|l| l.user_id == user_id)
            .filter_map(|l| {
                let book = inner.books.iter().find(|b| b.book_id == l.book_id)?;
                Some(LibraryBook {
                    book_id: book.book_id,
                    google_id: book.details.google_id.clone(),
                    title: book.details.title.clone(),
                    author: book.details.author.clone(),
                    description: book.details.description.clone(),
                    published_year: book.details.published_year.clone(),
                    isbn: book.details.isbn.clone(),
                    cover_img_url: book.details.cover_img_url.clone(),
                    completed_at: l.completed_at,
                })
            })
            .collect();
        books.sort_by(|a, b| b.book_id.cmp(&a.book_id));

        Ok(books)
    }
}
