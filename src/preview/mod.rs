//! Quad preview generation and caching.
//!
//! - [`PreviewService`]: cache lookup, upstream fetch, enhancement, store
//! - [`ExpiringCache`]: size-bounded LRU with per-entry TTL, instantiated as
//!   [`PreviewCache`] for encoded PNGs

mod cache;
mod service;

pub use cache::{
    ExpiringCache, PreviewCache, PreviewCacheKey, Weighted, DEFAULT_PREVIEW_CACHE_CAPACITY,
    DEFAULT_PREVIEW_TTL,
};
pub use service::{PreviewRequest, PreviewResponse, PreviewService};
