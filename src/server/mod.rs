//! HTTP server layer for the basemap gateway.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │     GET /preview   GET|POST /basemaps/...   GET /health         │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │           routes            │  │
//! │  │ (requests, error → JSON) │  │ (router, CORS, tracing)     │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, mosaics_handler, preview_handler, quad_details_handler, quads_handler,
    series_handler, status_for, AppState, ErrorResponse, HealthResponse, MosaicIdResponse,
    MosaicsQueryParams, PreviewQueryParams, QuadPathParams, QuadSearchBody,
    PREVIEW_CACHE_HIT_HEADER,
};
pub use routes::{create_router, RouterConfig};
