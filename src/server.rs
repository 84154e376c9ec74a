use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::catalog::{CatalogClient, NO_RESULTS_MESSAGE, SearchOutcome};
use crate::library::{LibraryStore, StoreError};
use crate::model::{BookDetails, LibraryBook, SaveBookRequest, SavedEntry};

/// The single implicit user until real sessions exist.
pub const DEFAULT_USER_ID: i32 = 1;

const USER_ID_HEADER: &str = "x-user-id";
const GENERIC_ERROR_MESSAGE: &str = "an unexpected error occurred";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LibraryStore>,
    pub catalog: CatalogClient,
}

impl AppState {
    pub fn new(store: Arc<dyn LibraryStore>, catalog: CatalogClient) -> Self {
        Self { store, catalog }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/hello", get(hello))
        .route("/api/search", get(search))
        .route("/api/library", get(list_library))
        .route("/api/saveBooks", post(save_books))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Error response in the `{"message": ..}` shape the client renders.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "message": self.message }));
        (self.status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = format!("{err}"), "library store failure");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

async fn hello() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "hello": "world" }))
}

async fn save_books(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SaveBookRequest>,
) -> Result<(StatusCode, Json<Vec<SavedEntry>>), ApiError> {
    let user_id = acting_user(&headers)?;
    let payload = request.validate().map_err(ApiError::bad_request)?;

    let saved = state.store.save_book(user_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    items: Vec<BookDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(ApiError::bad_request("q is required"));
    }

    let response = match state.catalog.search(query).await {
        SearchOutcome::Results(items) => SearchResponse {
            items,
            message: None,
        },
        SearchOutcome::NoResults => SearchResponse {
            items: Vec::new(),
            message: Some(NO_RESULTS_MESSAGE.to_string()),
        },
    };

    Ok(Json(response))
}

async fn list_library(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<LibraryBook>>, ApiError> {
    let user_id = acting_user(&headers)?;
    let books = state.store.list_library(user_id).await?;
    Ok(Json(books))
}

/// Resolves the acting user from the request. The identifier flows into the
/// writer explicitly; nothing below this point assumes a fixed user.
fn acting_user(headers: &HeaderMap) -> Result<i32, ApiError> {
    let Some(raw) = headers.get(USER_ID_HEADER) else {
        return Ok(DEFAULT_USER_ID);
    };

    raw.to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i32>().ok())
        .ok_or_else(|| ApiError::bad_request("x-user-id must be a numeric user identifier"))
}
