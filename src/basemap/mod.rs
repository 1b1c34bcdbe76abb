//! Basemap catalog lookups: series, mosaics by date, quad search and details.

mod service;

pub use service::{
    mosaic_date_fragment, BasemapService, MosaicCache, MosaicCacheKey, BASEMAP_QUAD_TYPE,
    DEFAULT_MOSAIC_TTL,
};
