mod catalog_stub;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt as _;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use readshelf::catalog::{CatalogClient, NO_RESULTS_MESSAGE, SearchOutcome};
use readshelf::config::CatalogConfig;
use readshelf::library::MemoryLibraryStore;
use readshelf::server::{AppState, router};

use catalog_stub::{CatalogBehavior, CatalogStub};

fn stub_client(stub: &CatalogStub) -> CatalogClient {
    CatalogClient::new(&CatalogConfig {
        api_key: "test-key".to_string(),
        base_url: stub.base_url.clone(),
        max_results: 20,
    })
    .expect("build catalog client")
}

fn volumes_fixture() -> Value {
    json!({
        "totalItems": 2,
        "items": [
            {
                "id": "g1",
                "volumeInfo": {
                    "title": "Dune",
                    "authors": ["Frank Herbert"],
                    "description": "A desert planet.",
                    "publishedDate": "1965-08-01",
                    "imageLinks": { "thumbnail": "http://x/cover.jpg" },
                    "industryIdentifiers": [
                        { "type": "ISBN_10", "identifier": "0441013597" },
                        { "type": "ISBN_13", "identifier": "9780441013593" },
                    ],
                },
            },
            {
                "id": "g2",
                "volumeInfo": {
                    "title": "No Identifiers Here",
                },
            },
        ],
    })
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn search_normalizes_catalog_volumes() {
    let stub = CatalogStub::spawn(CatalogBehavior::Volumes(volumes_fixture()));
    let client = stub_client(&stub);

    let outcome = client.search("dune").await;
    let SearchOutcome::Results(items) = outcome else {
        panic!("expected results, got {outcome:?}");
    };

    // The identifier-less volume is unsearchable and dropped.
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].google_id, "g1");
    assert_eq!(items[0].author, "Frank Herbert");
    assert_eq!(items[0].published_year, "1965");
    assert_eq!(items[0].isbn, "9780441013593");
}

#[tokio::test]
async fn zero_items_degrade_to_the_no_results_state() {
    let stub = CatalogStub::spawn(CatalogBehavior::Volumes(json!({ "totalItems": 0 })));
    let client = stub_client(&stub);

    assert_eq!(client.search("nothing").await, SearchOutcome::NoResults);
}

#[tokio::test]
async fn catalog_failures_degrade_to_the_no_results_state() {
    let stub = CatalogStub::spawn(CatalogBehavior::ServerError);
    let client = stub_client(&stub);

    assert_eq!(client.search("dune").await, SearchOutcome::NoResults);
}

#[tokio::test]
async fn search_endpoint_returns_normalized_items() {
    let stub = CatalogStub::spawn(CatalogBehavior::Volumes(volumes_fixture()));
    let app = router(AppState::new(
        Arc::new(MemoryLibraryStore::new()),
        stub_client(&stub),
    ));

    let (status, body) = get_json(&app, "/api/search?q=dune").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["isbn"], "9780441013593");
    assert_eq!(body["items"][0]["coverImgURL"], "http://x/cover.jpg");
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn search_endpoint_reports_the_no_results_message() {
    let stub = CatalogStub::spawn(CatalogBehavior::Volumes(json!({ "totalItems": 0 })));
    let app = router(AppState::new(
        Arc::new(MemoryLibraryStore::new()),
        stub_client(&stub),
    ));

    let (status, body) = get_json(&app, "/api/search?q=nothing").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["message"], NO_RESULTS_MESSAGE);
}

#[tokio::test]
async fn search_endpoint_requires_a_query() {
    let stub = CatalogStub::spawn(CatalogBehavior::Volumes(json!({ "totalItems": 0 })));
    let app = router(AppState::new(
        Arc::new(MemoryLibraryStore::new()),
        stub_client(&stub),
    ));

    let (status, body) = get_json(&app, "/api/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "q is required");
}
