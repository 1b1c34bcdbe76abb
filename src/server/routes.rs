//! Router configuration for the basemap gateway API.
//!
//! # Route Structure
//!
//! ```text
//! /
//! ├── health                              GET
//! ├── preview                             GET   ?mosaic_id=&quad_id=
//! └── basemaps/
//!     ├── series                          GET
//!     ├── mosaics                         GET   ?series_id=&year=&month=
//!     ├── quads                           POST
//!     └── quad/
//!         ├── preview                     GET   (alias of /preview)
//!         └── {mosaic_id}/{quad_id}       GET
//! ```

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    health_handler, mosaics_handler, preview_handler, quad_details_handler, quads_handler,
    series_handler, AppState,
};
use crate::basemap::BasemapService;
use crate::preview::PreviewService;
use crate::upstream::ImageryProvider;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age for previews, in seconds
    pub cache_max_age: u32,

    /// Whether to add the request tracing layer
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cors_origins: None,
            cache_max_age: 3600,
            enable_tracing: true,
        }
    }
}

impl RouterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict CORS to the given origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the Cache-Control max-age for previews.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Enable or disable the request tracing layer.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Build the application router.
///
/// # Example
///
/// ```ignore
/// let client = Arc::new(PlanetClient::new(api_key)?);
/// let previews = PreviewService::new(client.clone(), Arc::new(PreviewCache::new()));
/// let basemaps = BasemapService::new(client);
///
/// let app = create_router(previews, basemaps, RouterConfig::new());
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, app).await?;
/// ```
pub fn create_router<P>(
    preview_service: PreviewService<P>,
    basemap_service: BasemapService<P>,
    config: RouterConfig,
) -> Router
where
    P: ImageryProvider,
{
    let app_state =
        AppState::new(preview_service, basemap_service).with_cache_max_age(config.cache_max_age);

    let cors = build_cors_layer(&config);

    let basemap_routes = Router::new()
        .route("/series", get(series_handler::<P>))
        .route("/mosaics", get(mosaics_handler::<P>))
        .route("/quads", post(quads_handler::<P>))
        .route("/quad/preview", get(preview_handler::<P>))
        .route("/quad/{mosaic_id}/{quad_id}", get(quad_details_handler::<P>));

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/preview", get(preview_handler::<P>))
        .nest("/basemaps", basemap_routes)
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        // Empty list: no cross-origin access
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
