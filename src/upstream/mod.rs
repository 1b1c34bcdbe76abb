//! Upstream imagery provider layer.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │     PreviewService / BasemapService      │
//! └────────────────────┬─────────────────────┘
//!                      │
//!                      ▼
//! ┌──────────────────────────────────────────┐
//! │          ImageryProvider Trait           │
//! └────────────────────┬─────────────────────┘
//!                      │
//!                      ▼
//! ┌──────────────────────────────────────────┐
//! │   PlanetClient (reqwest, basic auth)     │
//! └──────────────────────────────────────────┘
//! ```

mod planet;
mod provider;

pub use planet::{
    classify_status, with_api_key, PlanetClient, PlanetClientConfig, DEFAULT_PLANET_BASE_URL,
    DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_DELAY, DEFAULT_UPSTREAM_TIMEOUT,
};
pub use provider::{ImageryProvider, MosaicList, MosaicSummary, QuadDetails, QuadLink, QuadLinks};
