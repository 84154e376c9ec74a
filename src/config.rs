use std::net::SocketAddr;

use anyhow::Context as _;

pub const DEFAULT_CATALOG_BASE_URL: &str = "https://www.googleapis.com/books/v1/volumes";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_MAX_RESULTS: u32 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub api_key: String,
    pub base_url: String,
    pub max_results: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(|v| {
                v.parse::<u16>()
                    .with_context(|| format!("invalid PORT={v:?}"))
            })
            .transpose()?
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            database: DatabaseConfig::from_env()?,
            catalog: CatalogConfig::from_env()?,
        })
    }
}

impl DatabaseConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let url = url.trim().to_string();
        if url.is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|v| *v >= 1)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        Ok(Self {
            url,
            max_connections,
        })
    }
}

impl CatalogConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key =
            std::env::var("GOOGLE_BOOKS_API_KEY").context("GOOGLE_BOOKS_API_KEY is required")?;
        let api_key = api_key.trim().to_string();
        if api_key.is_empty() {
            anyhow::bail!("GOOGLE_BOOKS_API_KEY is empty");
        }

        let base_url = std::env::var("GOOGLE_BOOKS_BASE_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_CATALOG_BASE_URL.to_string());

        let max_results = std::env::var("GOOGLE_BOOKS_MAX_RESULTS")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|v| *v >= 1)
            .unwrap_or(DEFAULT_MAX_RESULTS);

        Ok(Self {
            api_key,
            base_url,
            max_results,
        })
    }
}
