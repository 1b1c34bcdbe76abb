//! # Basemap Gateway
//!
//! An HTTP gateway in front of the Planet basemaps API that turns raw
//! multi-band GeoTIFF quads into contrast-enhanced PNG previews and proxies
//! the catalog lookups a map client needs to find them.
//!
//! ## Features
//!
//! - **Preview pipeline**: percentile stretch, gamma, and contrast/brightness/
//!   saturation adjustments on 8- or 16-bit rasters, encoded as PNG
//! - **Caching**: size-bounded LRU caches with per-entry TTL for previews and
//!   mosaic lookups
//! - **Catalog proxy**: series listing, mosaic lookup by date, quad search with
//!   result polling, quad metadata
//!
//! ## Architecture
//!
//! - [`upstream`] - Provider trait and reqwest-based Planet client
//! - [`raster`] - TIFF decoding, enhancement, PNG encoding
//! - [`preview`] - Preview service and expiring cache
//! - [`basemap`] - Series, mosaic and quad lookups
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use basemap_gateway::{
//!     create_router, BasemapService, PlanetClient, PreviewCache, PreviewService, RouterConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(PlanetClient::new("PLANET_API_KEY")?);
//!     let previews = PreviewService::new(client.clone(), Arc::new(PreviewCache::new()));
//!     let basemaps = BasemapService::new(client);
//!
//!     let app = create_router(previews, basemaps, RouterConfig::new());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod basemap;
pub mod config;
pub mod error;
pub mod preview;
pub mod raster;
pub mod server;
pub mod upstream;

// Re-export commonly used types
pub use basemap::{BasemapService, MosaicCacheKey};
pub use config::Config;
pub use error::{GatewayError, RasterError, UpstreamError};
pub use preview::{
    ExpiringCache, PreviewCache, PreviewCacheKey, PreviewRequest, PreviewResponse, PreviewService,
    DEFAULT_PREVIEW_TTL,
};
pub use raster::{EnhancementParams, RasterEnhancer, RasterTile};
pub use server::{create_router, AppState, ErrorResponse, HealthResponse, RouterConfig};
pub use upstream::{
    ImageryProvider, MosaicList, MosaicSummary, PlanetClient, PlanetClientConfig, QuadDetails,
    QuadLink,
};
