//! HTTP request handlers for the basemap gateway API.
//!
//! # Endpoints
//!
//! - `GET /preview?mosaic_id=&quad_id=` - Enhanced PNG preview of a quad
//! - `GET /basemaps/quad/preview` - Alias of `/preview`
//! - `GET /basemaps/series` - Basemap series listing
//! - `GET /basemaps/mosaics?series_id=&year=&month=` - Mosaic id lookup
//! - `POST /basemaps/quads` - Quad search within a geometry
//! - `GET /basemaps/quad/{mosaic_id}/{quad_id}` - Quad metadata
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::basemap::BasemapService;
use crate::error::{GatewayError, UpstreamError};
use crate::preview::{PreviewRequest, PreviewService};
use crate::upstream::ImageryProvider;

/// Response header reporting whether a preview came from cache.
pub const PREVIEW_CACHE_HIT_HEADER: HeaderName = HeaderName::from_static("x-preview-cache-hit");

// =============================================================================
// Application State
// =============================================================================

/// Shared application state passed to all handlers via Axum's State extractor.
pub struct AppState<P: ImageryProvider> {
    /// Preview generation and caching
    pub preview_service: Arc<PreviewService<P>>,

    /// Series, mosaic and quad metadata
    pub basemap_service: Arc<BasemapService<P>>,

    /// Cache-Control max-age for previews, in seconds
    pub cache_max_age: u32,
}

impl<P: ImageryProvider> AppState<P> {
    /// Create application state with a one hour Cache-Control max-age.
    pub fn new(preview_service: PreviewService<P>, basemap_service: BasemapService<P>) -> Self {
        Self {
            preview_service: Arc::new(preview_service),
            basemap_service: Arc::new(basemap_service),
            cache_max_age: 3600,
        }
    }

    /// Set the Cache-Control max-age for previews.
    pub fn with_cache_max_age(mut self, cache_max_age: u32) -> Self {
        self.cache_max_age = cache_max_age;
        self
    }
}

impl<P: ImageryProvider> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            preview_service: Arc::clone(&self.preview_service),
            basemap_service: Arc::clone(&self.basemap_service),
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for preview requests.
///
/// Both fields are optional at the extractor level so a missing one is
/// reported as a structured validation error naming the field.
#[derive(Debug, Default, Deserialize)]
pub struct PreviewQueryParams {
    #[serde(default)]
    pub mosaic_id: Option<String>,

    #[serde(default)]
    pub quad_id: Option<String>,
}

/// Query parameters for mosaic lookups.
#[derive(Debug, Default, Deserialize)]
pub struct MosaicsQueryParams {
    #[serde(default)]
    pub series_id: Option<String>,

    /// Four digit year, e.g. `2024`
    #[serde(default)]
    pub year: Option<String>,

    /// Month, with or without leading zero
    #[serde(default)]
    pub month: Option<String>,
}

/// Body of a quad search request.
#[derive(Debug, Default, Deserialize)]
pub struct QuadSearchBody {
    #[serde(default)]
    pub mosaic_id: Option<String>,

    /// GeoJSON geometry
    #[serde(default)]
    pub geometry: Option<Value>,

    #[serde(default)]
    pub series_id: Option<String>,
}

/// Path parameters for quad details.
#[derive(Debug, Deserialize)]
pub struct QuadPathParams {
    pub mosaic_id: String,
    pub quad_id: String,
}

/// Take a non-blank parameter or fail naming it.
fn required(value: Option<String>, field: &'static str) -> Result<String, GatewayError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(GatewayError::missing(field)),
    }
}

fn query_error(rejection: QueryRejection) -> GatewayError {
    GatewayError::Validation {
        field: "query",
        message: rejection.body_text(),
    }
}

fn is_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn is_blank_geometry(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error kind (e.g., "upstream_quota", "validation_error")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Offending request parameter, for validation errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
            field: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            status: Some(status.as_u16()),
            ..Self::new(error, message)
        }
    }

    /// Attach the name of the offending parameter.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Successful mosaic lookup.
#[derive(Debug, Serialize)]
pub struct MosaicIdResponse {
    pub mosaic_id: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// HTTP status for a gateway error.
pub fn status_for(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::Upstream(UpstreamError::NotFound { .. }) => StatusCode::NOT_FOUND,
        GatewayError::Upstream(UpstreamError::Quota) => StatusCode::FORBIDDEN,
        GatewayError::Upstream(UpstreamError::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
        GatewayError::Upstream(UpstreamError::MissingCredential) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
        GatewayError::Raster(_) => StatusCode::INTERNAL_SERVER_ERROR,
        GatewayError::Validation { .. } => StatusCode::BAD_REQUEST,
        GatewayError::MosaicNotFound { .. } => StatusCode::NOT_FOUND,
        GatewayError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert GatewayError to HTTP response.
///
/// Logs 5xx at ERROR, 404 at DEBUG (common and expected), other 4xx at WARN.
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let error_type = self.kind();
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else if status.is_client_error() {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let mut error_response = ErrorResponse::with_status(error_type, message, status);
        if let GatewayError::Validation { field, .. } = &self {
            error_response = error_response.with_field(*field);
        }

        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle preview requests.
///
/// # Endpoint
///
/// `GET /preview?mosaic_id={mosaic_id}&quad_id={quad_id}`
///
/// # Response
///
/// - `200 OK`: PNG image with `Content-Type: image/png`
/// - `400 Bad Request`: Missing `mosaic_id` or `quad_id` (`field` names it)
/// - `403 Forbidden`: Upstream quota exceeded
/// - `404 Not Found`: Unknown quad, or quad has no download link
/// - `429 Too Many Requests`: Upstream rate limit
/// - `500 Internal Server Error`: Raster decode or encode failure
/// - `502 Bad Gateway`: Any other upstream failure
///
/// # Headers
///
/// - `Cache-Control: public, max-age={cache_max_age}`
/// - `X-Preview-Cache-Hit: true|false`
pub async fn preview_handler<P: ImageryProvider>(
    State(state): State<AppState<P>>,
    query: Result<Query<PreviewQueryParams>, QueryRejection>,
) -> Result<Response, GatewayError> {
    let Query(query) = query.map_err(query_error)?;
    let mosaic_id = required(query.mosaic_id, "mosaic_id")?;
    let quad_id = required(query.quad_id, "quad_id")?;

    let response = state
        .preview_service
        .get_preview(PreviewRequest::new(mosaic_id, quad_id))
        .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (
                header::CACHE_CONTROL,
                format!("public, max-age={}", state.cache_max_age),
            ),
            (PREVIEW_CACHE_HIT_HEADER, response.cache_hit.to_string()),
        ],
        response.data,
    )
        .into_response())
}

/// Handle health check requests.
///
/// `GET /health` returns `{"status": "healthy", "version": "..."}`.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /basemaps/series`: upstream series listing, unchanged.
pub async fn series_handler<P: ImageryProvider>(
    State(state): State<AppState<P>>,
) -> Result<Json<Value>, GatewayError> {
    Ok(Json(state.basemap_service.list_series().await?))
}

/// Handle mosaic lookups.
///
/// # Endpoint
///
/// `GET /basemaps/mosaics?series_id={id}&year={yyyy}&month={mm}`
///
/// # Response
///
/// - `200 OK` `{"mosaics": []}` when `year` or `month` is absent
/// - `200 OK` `{"mosaic_id": "..."}` when a mosaic matches
/// - `400 Bad Request` when `series_id` is absent
/// - `404 Not Found` (`mosaic_not_found`) when nothing matches
pub async fn mosaics_handler<P: ImageryProvider>(
    State(state): State<AppState<P>>,
    query: Result<Query<MosaicsQueryParams>, QueryRejection>,
) -> Result<Response, GatewayError> {
    let Query(query) = query.map_err(query_error)?;
    if !is_present(&query.year) || !is_present(&query.month) {
        return Ok(Json(json!({ "mosaics": [] })).into_response());
    }

    let series_id = required(query.series_id, "series_id")?;
    let year = query.year.unwrap_or_default();
    let month = query.month.unwrap_or_default();

    let mosaic_id = state
        .basemap_service
        .require_mosaic_id(&series_id, &year, &month)
        .await?;

    Ok(Json(MosaicIdResponse { mosaic_id }).into_response())
}

/// Handle quad searches.
///
/// # Endpoint
///
/// `POST /basemaps/quads` with body `{"mosaic_id", "geometry", "series_id"}`
///
/// Returns the matching quads, each annotated with `mosaic_id`, `series_id`
/// and `type: "basemap_quad"`. Any missing field is a `400`.
pub async fn quads_handler<P: ImageryProvider>(
    State(state): State<AppState<P>>,
    body: Result<Json<QuadSearchBody>, JsonRejection>,
) -> Result<Json<Vec<Value>>, GatewayError> {
    let Json(body) = body.map_err(|rejection| GatewayError::Validation {
        field: "body",
        message: rejection.body_text(),
    })?;

    let mosaic_id = required(body.mosaic_id, "mosaic_id")?;
    let geometry = body
        .geometry
        .filter(|g| !is_blank_geometry(g))
        .ok_or_else(|| GatewayError::missing("geometry"))?;
    let series_id = required(body.series_id, "series_id")?;

    let quads = state
        .basemap_service
        .search_quads(&mosaic_id, &series_id, &geometry)
        .await?;

    Ok(Json(quads))
}

/// `GET /basemaps/quad/{mosaic_id}/{quad_id}`: upstream quad metadata.
pub async fn quad_details_handler<P: ImageryProvider>(
    State(state): State<AppState<P>>,
    Path(params): Path<QuadPathParams>,
) -> Result<Json<Value>, GatewayError> {
    let details = state
        .basemap_service
        .quad_details(&params.mosaic_id, &params.quad_id)
        .await?;
    Ok(Json(details))
}
