use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;
use url::Url;

use crate::config::CatalogConfig;
use crate::model::BookDetails;

pub const NO_RESULTS_MESSAGE: &str = "Sorry, no results were found. Please try again...";
pub const PLACEHOLDER_COVER_URL: &str =
    "https://fivebooks.com/app/uploads/2010/09/no_book_cover.jpg";

const HTTP_TIMEOUT_SECS: u64 = 10;

/// Outcome of one catalog query. Failures never surface here; they degrade
/// to `NoResults` after being logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    NoResults,
    Results(Vec<BookDetails>),
}

#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    max_results: u32,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .context("build catalog http client")?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            max_results: config.max_results,
        })
    }

    pub async fn search(&self, query: &str) -> SearchOutcome {
        let page = match self.fetch_volumes(query).await {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(query, error = format!("{err:#}"), "catalog query failed");
                return SearchOutcome::NoResults;
            }
        };

        let books: Vec<BookDetails> = page
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(normalize_volume)
            .collect();

        if books.is_empty() {
            SearchOutcome::NoResults
        } else {
            SearchOutcome::Results(books)
        }
    }

    async fn fetch_volumes(&self, query: &str) -> anyhow::Result<VolumesPage> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("q", query),
                ("maxResults", &self.max_results.to_string()),
                ("key", &self.api_key),
            ],
        )
        .with_context(|| format!("build catalog url from {:?}", self.base_url))?;

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {}", url.path()))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("catalog responded with status {status}");
        }

        response
            .json::<VolumesPage>()
            .await
            .context("parse catalog response")
    }
}

#[derive(Debug, Deserialize)]
struct VolumesPage {
    items: Option<Vec<Volume>>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    id: String,
    #[serde(rename = "volumeInfo")]
    volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct VolumeInfo {
    title: Option<String>,
    authors: Option<Vec<String>>,
    description: Option<String>,
    #[serde(rename = "publishedDate")]
    published_date: Option<String>,
    #[serde(rename = "imageLinks")]
    image_links: Option<ImageLinks>,
    #[serde(rename = "industryIdentifiers")]
    industry_identifiers: Option<Vec<IndustryIdentifier>>,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: Option<String>,
    identifier: Option<String>,
}

/// Maps one raw volume onto the simplified book shape. Volumes without a
/// title or without any usable identifier are unsearchable and dropped.
fn normalize_volume(volume: Volume) -> Option<BookDetails> {
    let info = volume.volume_info.unwrap_or_default();
    let title = info.title.filter(|t| !t.trim().is_empty())?;
    let isbn = pick_isbn(info.industry_identifiers.as_deref().unwrap_or_default())?;

    let author = info
        .authors
        .map(|authors| authors.join(", "))
        .unwrap_or_default();
    let published_year = info
        .published_date
        .as_deref()
        .map(truncate_year)
        .unwrap_or_default();
    let cover_img_url = info
        .image_links
        .and_then(|links| links.thumbnail)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| PLACEHOLDER_COVER_URL.to_string());

    Some(BookDetails {
        google_id: volume.id,
        title,
        author,
        description: info.description,
        published_year,
        isbn,
        cover_img_url,
    })
}

/// Picks the dedup identifier by type: ISBN_13 first, then ISBN_10, then
/// whatever the catalog offers.
fn pick_isbn(identifiers: &[IndustryIdentifier]) -> Option<String> {
    let by_kind = |wanted: &str| {
        identifiers
            .iter()
            .find(|id| id.kind.as_deref() == Some(wanted))
            .and_then(|id| id.identifier.clone())
    };

    by_kind("ISBN_13")
        .or_else(|| by_kind("ISBN_10"))
        .or_else(|| identifiers.iter().find_map(|id| id.identifier.clone()))
        .filter(|isbn| !isbn.trim().is_empty())
}

fn truncate_year(date: &str) -> String {
    date.chars().take(4).collect()
}
