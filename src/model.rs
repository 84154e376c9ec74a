use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const REQUIRED_FIELDS_MESSAGE: &str =
    "googleId, title, author, description, publishedYear, isbn, coverImgURL are required fields";

/// A catalog book normalized to the shape the save endpoint accepts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookDetails {
    pub google_id: String,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub published_year: String,
    pub isbn: String,
    #[serde(rename = "coverImgURL")]
    pub cover_img_url: String,
}

/// Raw save-book payload. Every field is optional at the wire level so that
/// a missing field surfaces as a validation error rather than a
/// deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveBookRequest {
    pub google_id: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub published_year: Option<String>,
    pub isbn: Option<String>,
    #[serde(rename = "coverImgURL")]
    pub cover_img_url: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SaveBookRequest {
    /// Checks the mandatory fields before any side effect. A field counts as
    /// missing when absent or empty.
    pub fn validate(self) -> Result<SavePayload, &'static str> {
        let Self {
            google_id,
            title,
            author,
            description,
            published_year,
            isbn,
            cover_img_url,
            completed_at,
        } = self;

        let book = BookDetails {
            google_id: required(google_id)?,
            title: required(title)?,
            author: required(author)?,
            description,
            published_year: required(published_year)?,
            isbn: required(isbn)?,
            cover_img_url: required(cover_img_url)?,
        };

        Ok(SavePayload { book, completed_at })
    }
}

fn required(value: Option<String>) -> Result<String, &'static str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(REQUIRED_FIELDS_MESSAGE),
    }
}

/// A validated save request: the book row to find-or-create plus the
/// completion timestamp for the library link.
#[derive(Debug, Clone)]
pub struct SavePayload {
    pub book: BookDetails,
    pub completed_at: Option<DateTime<Utc>>,
}

/// The library row produced by a save, enriched with the ISBN that resolved
/// the book so the response is self-describing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedEntry {
    pub book_id: i32,
    pub user_id: i32,
    pub isbn: String,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One reading-list item: the book joined with its library link.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LibraryBook {
    pub book_id: i32,
    pub google_id: String,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub published_year: String,
    pub isbn: String,
    #[serde(rename = "coverImgURL")]
    pub cover_img_url: String,
    pub completed_at: Option<DateTime<Utc>>,
}
