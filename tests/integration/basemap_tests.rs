//! Basemap catalog endpoint tests.
//!
//! Tests verify:
//! - Series listing passes through unchanged
//! - Mosaic lookup by series and date
//! - Quad search validation and annotation
//! - Quad metadata passthrough

use axum::http::StatusCode;
use serde_json::json;

use super::test_utils::{body_json, build_router, get, post_json, MockProvider};

// =============================================================================
// Series
// =============================================================================

#[tokio::test]
async fn test_series_passthrough() {
    let series = json!({
        "series": [{ "id": "s-1", "name": "Global Monthly", "interval": "1 mon" }],
        "_links": { "_self": "https://api.planet.com/basemaps/v1/series" }
    });
    let (router, _) = build_router(MockProvider::new().with_series(series.clone()));

    let response = get(&router, "/basemaps/series").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, series);
}

// =============================================================================
// Mosaics
// =============================================================================

fn catalog() -> MockProvider {
    MockProvider::new().with_mosaics(
        "s-1",
        &[
            ("m-2023-12", "global_monthly_2023-12_mosaic"),
            ("m-2024-01", "global_monthly_2024-01_mosaic"),
        ],
    )
}

#[tokio::test]
async fn test_mosaics_without_date_is_empty_list() {
    let (router, provider) = build_router(catalog());

    for uri in [
        "/basemaps/mosaics",
        "/basemaps/mosaics?series_id=s-1",
        "/basemaps/mosaics?series_id=s-1&year=2024",
        "/basemaps/mosaics?series_id=s-1&month=01",
        "/basemaps/mosaics?series_id=s-1&year=&month=01",
    ] {
        let response = get(&router, uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        assert_eq!(body_json(response).await, json!({ "mosaics": [] }));
    }

    assert_eq!(provider.mosaic_calls(), 0);
}

#[tokio::test]
async fn test_mosaics_requires_series_id() {
    let (router, _) = build_router(catalog());

    let response = get(&router, "/basemaps/mosaics?year=2024&month=01").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "validation_error");
    assert_eq!(json["field"], "series_id");
}

#[tokio::test]
async fn test_mosaics_malformed_query() {
    let (router, _) = build_router(catalog());

    let response = get(&router, "/basemaps/mosaics?series_id=a&series_id=b&year=2024&month=01").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["field"], "query");
}

#[tokio::test]
async fn test_mosaic_found() {
    let (router, _) = build_router(catalog());

    let response = get(&router, "/basemaps/mosaics?series_id=s-1&year=2023&month=12").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "mosaic_id": "m-2023-12" }));
}

#[tokio::test]
async fn test_single_digit_month_is_padded() {
    let (router, _) = build_router(catalog());

    let response = get(&router, "/basemaps/mosaics?series_id=s-1&year=2024&month=1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["mosaic_id"], "m-2024-01");
}

#[tokio::test]
async fn test_mosaic_not_found() {
    let (router, _) = build_router(catalog());

    let response = get(&router, "/basemaps/mosaics?series_id=s-1&year=2019&month=05").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "mosaic_not_found");
}

// =============================================================================
// Quad Search
// =============================================================================

fn geometry() -> serde_json::Value {
    json!({
        "type": "Polygon",
        "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
    })
}

#[tokio::test]
async fn test_quad_search_annotates_results() {
    let provider = MockProvider::new().with_search_results(vec![
        json!({ "id": "100-200", "percent_covered": 100 }),
        json!({ "id": "100-201", "percent_covered": 42 }),
    ]);
    let (router, provider) = build_router(provider);

    let response = post_json(
        &router,
        "/basemaps/quads",
        &json!({ "mosaic_id": "m-1", "series_id": "s-1", "geometry": geometry() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let quads = body_json(response).await;
    let quads = quads.as_array().unwrap();
    assert_eq!(quads.len(), 2);
    for quad in quads {
        assert_eq!(quad["mosaic_id"], "m-1");
        assert_eq!(quad["series_id"], "s-1");
        assert_eq!(quad["type"], "basemap_quad");
    }
    assert_eq!(quads[1]["percent_covered"], 42);
    assert_eq!(provider.search_calls(), 1);
}

#[tokio::test]
async fn test_quad_search_empty_results() {
    let (router, _) = build_router(MockProvider::new());

    let response = post_json(
        &router,
        "/basemaps/quads",
        &json!({ "mosaic_id": "m-1", "series_id": "s-1", "geometry": geometry() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_quad_search_missing_fields() {
    let (router, provider) = build_router(MockProvider::new());

    let cases = [
        (json!({ "series_id": "s-1", "geometry": geometry() }), "mosaic_id"),
        (json!({ "mosaic_id": "m-1", "series_id": "s-1" }), "geometry"),
        (json!({ "mosaic_id": "m-1", "series_id": "s-1", "geometry": {} }), "geometry"),
        (json!({ "mosaic_id": "m-1", "series_id": "s-1", "geometry": null }), "geometry"),
        (json!({ "mosaic_id": "m-1", "geometry": geometry() }), "series_id"),
        (json!({ "mosaic_id": "", "series_id": "s-1", "geometry": geometry() }), "mosaic_id"),
    ];

    for (body, field) in cases {
        let response = post_json(&router, "/basemaps/quads", &body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", body);
        assert_eq!(body_json(response).await["field"], field);
    }

    assert_eq!(provider.search_calls(), 0);
}

#[tokio::test]
async fn test_quad_search_malformed_body() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let (router, _) = build_router(MockProvider::new());

    let request = Request::builder()
        .method("POST")
        .uri("/basemaps/quads")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "validation_error");
    assert_eq!(json["field"], "body");
}

// =============================================================================
// Quad Details
// =============================================================================

#[tokio::test]
async fn test_quad_details_passthrough() {
    let provider = MockProvider::new().with_quad_without_link("m-1", "7-9");
    let (router, _) = build_router(provider);

    let response = get(&router, "/basemaps/quad/m-1/7-9").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["id"], "7-9");
}

#[tokio::test]
async fn test_quad_details_unknown_quad() {
    let (router, _) = build_router(MockProvider::new());

    let response = get(&router, "/basemaps/quad/m-1/unknown").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "upstream_not_found");
}

#[tokio::test]
async fn test_quad_details_upstream_failure() {
    let provider = MockProvider::new().with_link_error(
        "m-1",
        "7-9",
        basemap_gateway::error::UpstreamError::Connection("reset".to_string()),
    );
    let (router, _) = build_router(provider);

    let response = get(&router, "/basemaps/quad/m-1/7-9").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
