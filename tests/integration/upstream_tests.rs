//! Planet client tests against a local fake API.
//!
//! The fake server is an axum router bound to an ephemeral port. It mimics
//! the shapes the client depends on: quad metadata with `_links.download`,
//! the quad search 302 hand-off, result pages that are not ready yet, and
//! `_next` pagination.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use basemap_gateway::error::UpstreamError;
use basemap_gateway::upstream::{ImageryProvider, PlanetClient, PlanetClientConfig, QuadLink};

const API_KEY: &str = "test-key";

/// `Basic base64("test-key:")`
const EXPECTED_AUTH: &str = "Basic dGVzdC1rZXk6";

// =============================================================================
// Fake Planet API
// =============================================================================

struct FakePlanet {
    base_url: String,
    last_auth: Mutex<Option<String>>,
    first_page_calls: AtomicUsize,
    pending_calls: AtomicUsize,
}

type Shared = Arc<FakePlanet>;

fn record_auth(state: &FakePlanet, headers: &HeaderMap) {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *state.last_auth.lock().unwrap() = auth;
}

async fn quad_metadata(
    State(state): State<Shared>,
    Path((mosaic_id, quad_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    record_auth(&state, &headers);

    match quad_id.as_str() {
        "with-link" => Json(json!({
            "id": quad_id,
            "_links": { "download": format!("{}/download/{}", state.base_url, mosaic_id) }
        }))
        .into_response(),
        "no-link" => Json(json!({ "id": quad_id, "_links": {} })).into_response(),
        "empty-link" => Json(json!({ "id": quad_id, "_links": { "download": "" } })).into_response(),
        "quota" => (StatusCode::FORBIDDEN, "quota exceeded").into_response(),
        "limited" => (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response(),
        "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "garbage" => (StatusCode::OK, "not json").into_response(),
        _ => (StatusCode::NOT_FOUND, "no such quad").into_response(),
    }
}

async fn download(Path(mosaic_id): Path<String>, headers: HeaderMap) -> Response {
    if headers.get(header::AUTHORIZATION).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    format!("raster:{}", mosaic_id).into_response()
}

async fn series(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record_auth(&state, &headers);
    Json(json!({ "series": [{ "id": "s-1", "name": "Global Monthly" }] })).into_response()
}

async fn mosaics(Path(series_id): Path<String>) -> Response {
    Json(json!({
        "mosaics": [
            { "id": format!("{}-m1", series_id), "name": "global_monthly_2024_01_mosaic" },
            { "id": format!("{}-m2", series_id), "name": "global_monthly_2024_02_mosaic" }
        ]
    }))
    .into_response()
}

async fn quad_search(
    State(state): State<Shared>,
    Path(mosaic_id): Path<String>,
    headers: HeaderMap,
    Json(geometry): Json<serde_json::Value>,
) -> Response {
    record_auth(&state, &headers);

    if geometry.get("type").is_none() {
        return (StatusCode::BAD_REQUEST, "geometry required").into_response();
    }

    let location = match mosaic_id.as_str() {
        "direct" => return Json(json!({ "items": [] })).into_response(),
        "pending" => "/results/pending",
        _ => "/results/first",
    };
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Not ready on the first call, ready afterwards.
async fn first_page(State(state): State<Shared>) -> Response {
    if state.first_page_calls.fetch_add(1, Ordering::SeqCst) == 0 {
        return StatusCode::ACCEPTED.into_response();
    }
    Json(json!({
        "items": [{ "id": "1-1" }, { "id": "1-2" }],
        "_links": { "_next": format!("{}/results/second?_page=2", state.base_url) }
    }))
    .into_response()
}

/// Only served when the API key is carried in the query string.
async fn second_page(Query(params): Query<HashMap<String, String>>) -> Response {
    if params.get("api_key").map(String::as_str) != Some(API_KEY) {
        return (StatusCode::UNAUTHORIZED, "api_key required").into_response();
    }
    Json(json!({ "items": [{ "id": "2-1" }], "_links": {} })).into_response()
}

async fn pending_page(State(state): State<Shared>) -> Response {
    state.pending_calls.fetch_add(1, Ordering::SeqCst);
    StatusCode::ACCEPTED.into_response()
}

/// Start the fake API and return its shared state.
async fn spawn_fake_planet() -> Shared {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = Arc::new(FakePlanet {
        base_url: format!("http://{}", addr),
        last_auth: Mutex::new(None),
        first_page_calls: AtomicUsize::new(0),
        pending_calls: AtomicUsize::new(0),
    });

    let app = Router::new()
        .route("/basemaps/v1/series", get(series))
        .route("/basemaps/v1/series/{series_id}/mosaics", get(mosaics))
        .route(
            "/basemaps/v1/mosaics/{mosaic_id}/quads/search",
            post(quad_search),
        )
        .route(
            "/basemaps/v1/mosaics/{mosaic_id}/quads/{quad_id}",
            get(quad_metadata),
        )
        .route("/download/{mosaic_id}", get(download))
        .route("/results/first", get(first_page))
        .route("/results/second", get(second_page))
        .route("/results/pending", get(pending_page))
        .with_state(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    state
}

fn client_for(fake: &FakePlanet) -> PlanetClient {
    let config = PlanetClientConfig::default()
        .with_base_url(fake.base_url.clone())
        .with_timeout(Duration::from_secs(5))
        .with_polling(3, Duration::from_millis(10));
    PlanetClient::with_config(API_KEY, config).unwrap()
}

fn point() -> serde_json::Value {
    json!({ "type": "Point", "coordinates": [10.0, 20.0] })
}

// =============================================================================
// Quad Metadata and Downloads
// =============================================================================

#[tokio::test]
async fn test_download_link_found_and_fetched() {
    let fake = spawn_fake_planet().await;
    let client = client_for(&fake);

    let link = client.quad_download_link("m1", "with-link").await.unwrap();
    let url = match link {
        QuadLink::Found(url) => url,
        other => panic!("Expected a download link, got {:?}", other),
    };
    assert_eq!(url, format!("{}/download/m1", fake.base_url));

    assert_eq!(
        fake.last_auth.lock().unwrap().as_deref(),
        Some(EXPECTED_AUTH)
    );

    let data = client.fetch_raw_tile(&url).await.unwrap();
    assert_eq!(&data[..], b"raster:m1");
}

#[tokio::test]
async fn test_missing_and_empty_download_links() {
    let fake = spawn_fake_planet().await;
    let client = client_for(&fake);

    assert_eq!(
        client.quad_download_link("m1", "no-link").await.unwrap(),
        QuadLink::NotFound
    );
    assert_eq!(
        client.quad_download_link("m1", "empty-link").await.unwrap(),
        QuadLink::NotFound
    );
}

#[tokio::test]
async fn test_resolve_download_link_maps_missing_to_not_found() {
    let fake = spawn_fake_planet().await;
    let client = client_for(&fake);

    let err = client
        .resolve_quad_download_link("m1", "no-link")
        .await
        .unwrap_err();
    assert!(matches!(err, UpstreamError::NotFound { .. }));
}

#[tokio::test]
async fn test_status_classification() {
    let fake = spawn_fake_planet().await;
    let client = client_for(&fake);

    assert!(matches!(
        client.quad_download_link("m1", "quota").await,
        Err(UpstreamError::Quota)
    ));
    assert!(matches!(
        client.quad_download_link("m1", "limited").await,
        Err(UpstreamError::RateLimited)
    ));

    match client.quad_download_link("m1", "broken").await {
        Err(UpstreamError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("Expected Status error, got {:?}", other),
    }

    match client.quad_download_link("m1", "unknown").await {
        Err(UpstreamError::NotFound { resource }) => {
            assert!(resource.ends_with("/basemaps/v1/mosaics/m1/quads/unknown"));
        }
        other => panic!("Expected NotFound error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unparseable_metadata_is_invalid_response() {
    let fake = spawn_fake_planet().await;
    let client = client_for(&fake);

    assert!(matches!(
        client.quad_download_link("m1", "garbage").await,
        Err(UpstreamError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_quad_details_passthrough() {
    let fake = spawn_fake_planet().await;
    let client = client_for(&fake);

    let details = client.quad_details("m1", "no-link").await.unwrap();
    assert_eq!(details["id"], "no-link");
}

#[tokio::test]
async fn test_connection_refused() {
    // Bind then drop to get a port with nothing listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = PlanetClientConfig::default().with_base_url(format!("http://{}", addr));
    let client = PlanetClient::with_config(API_KEY, config).unwrap();

    assert!(matches!(
        client.list_series().await,
        Err(UpstreamError::Connection(_))
    ));
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_series_and_mosaics() {
    let fake = spawn_fake_planet().await;
    let client = client_for(&fake);

    let series = client.list_series().await.unwrap();
    assert_eq!(series["series"][0]["id"], "s-1");
    assert_eq!(
        fake.last_auth.lock().unwrap().as_deref(),
        Some(EXPECTED_AUTH)
    );

    let mosaics = client.list_mosaics("s-1").await.unwrap();
    assert_eq!(mosaics.mosaics.len(), 2);
    assert_eq!(mosaics.mosaics[1].id, "s-1-m2");
    assert_eq!(mosaics.mosaics[1].name, "global_monthly_2024_02_mosaic");
}

// =============================================================================
// Quad Search
// =============================================================================

#[tokio::test]
async fn test_quad_search_follows_redirect_polls_and_paginates() {
    let fake = spawn_fake_planet().await;
    let client = client_for(&fake);

    let items = client.search_quads("m1", &point()).await.unwrap();

    let ids: Vec<_> = items.iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["1-1", "1-2", "2-1"]);

    // First page answered 202 once, then 200
    assert_eq!(fake.first_page_calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        fake.last_auth.lock().unwrap().as_deref(),
        Some(EXPECTED_AUTH)
    );
}

#[tokio::test]
async fn test_quad_search_without_redirect_fails() {
    let fake = spawn_fake_planet().await;
    let client = client_for(&fake);

    match client.search_quads("direct", &point()).await {
        Err(UpstreamError::Status { status, .. }) => assert_eq!(status, 200),
        other => panic!("Expected Status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_quad_search_rejected_geometry() {
    let fake = spawn_fake_planet().await;
    let client = client_for(&fake);

    assert!(matches!(
        client.search_quads("m1", &json!({})).await,
        Err(UpstreamError::Status { status: 400, .. })
    ));
}

#[tokio::test]
async fn test_quad_search_poll_exhausted() {
    let fake = spawn_fake_planet().await;
    let client = client_for(&fake);

    match client.search_quads("pending", &point()).await {
        Err(UpstreamError::PollExhausted { url, attempts }) => {
            assert_eq!(attempts, 3);
            assert!(url.ends_with("/results/pending"));
        }
        other => panic!("Expected PollExhausted, got {:?}", other),
    }
    assert_eq!(fake.pending_calls.load(Ordering::SeqCst), 3);
}

// =============================================================================
// Construction
// =============================================================================

#[tokio::test]
async fn test_empty_key_is_missing_credential() {
    let fake = spawn_fake_planet().await;
    let config = PlanetClientConfig::default().with_base_url(fake.base_url.clone());

    assert!(matches!(
        PlanetClient::with_config("", config),
        Err(UpstreamError::MissingCredential)
    ));
}
