//! Raster enhancement pipeline.
//!
//! ```text
//! TIFF bytes ──► RasterTile::decode ──► enhance_band (x3) ──► RgbImage
//!                                                               │
//!                contrast ◄──────────────────────────────────────┘
//!                   │
//!                   ▼
//!               brightness ──► saturation ──► encode_png ──► PNG bytes
//! ```

mod encoder;
mod enhance;
mod tile;

pub use encoder::{encode_png, png_dimensions, RasterEnhancer};
pub use enhance::{
    adjust_brightness, adjust_contrast, adjust_saturation, blend, enhance_band, enhance_tile,
    luma, BandStatistics, EnhancementParams,
};
pub use tile::RasterTile;
