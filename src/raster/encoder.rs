//! PNG preview encoder.
//!
//! Wraps the full raster pipeline: TIFF decode, band enhancement and
//! whole-image adjustments, then PNG encoding.
//!
//! # Design Decisions
//!
//! - **Best compression**: previews are cached and served many times, so the
//!   encoder spends CPU once for smaller payloads.
//!
//! - **Deterministic output**: the same source bytes always produce the same
//!   PNG bytes. Caching and conditional responses rely on this.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageReader, RgbImage};

use super::enhance::{enhance_tile, EnhancementParams};
use super::tile::RasterTile;
use crate::error::RasterError;

// =============================================================================
// Raster Enhancer
// =============================================================================

/// Turns raw multi-band raster bytes into an enhanced PNG preview.
///
/// # Example
///
/// ```ignore
/// use basemap_gateway::raster::RasterEnhancer;
///
/// let enhancer = RasterEnhancer::new();
/// let png = enhancer.enhance(&geotiff_bytes)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RasterEnhancer {
    params: EnhancementParams,
}

impl RasterEnhancer {
    /// Create an enhancer with the default tuning.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an enhancer with custom tuning.
    pub fn with_params(params: EnhancementParams) -> Self {
        Self { params }
    }

    /// Enhancement parameters in use.
    pub fn params(&self) -> &EnhancementParams {
        &self.params
    }

    /// Decode, enhance and encode a raster.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The source is not a readable TIFF
    /// - The raster has fewer than three bands
    /// - PNG encoding fails
    pub fn enhance(&self, source: &[u8]) -> Result<Bytes, RasterError> {
        let tile = RasterTile::decode(source)?;
        let image = enhance_tile(&tile, &self.params)?;
        encode_png(&image)
    }
}

// =============================================================================
// PNG Encoding
// =============================================================================

/// Encode an RGB image as PNG with maximum compression.
pub fn encode_png(image: &RgbImage) -> Result<Bytes, RasterError> {
    let mut output = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut output, CompressionType::Best, FilterType::Adaptive);

    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| RasterError::Encode {
            message: e.to_string(),
        })?;

    Ok(Bytes::from(output))
}

/// Read the dimensions of an encoded PNG without decoding pixel data.
pub fn png_dimensions(png: &[u8]) -> Result<(u32, u32), RasterError> {
    let reader = ImageReader::with_format(Cursor::new(png), image::ImageFormat::Png);
    reader.into_dimensions().map_err(|e| RasterError::Decode {
        message: e.to_string(),
    })
}
