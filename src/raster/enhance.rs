//! Band normalization and whole-image color adjustments.
//!
//! Each band is stretched between its 1st and 99th percentile, gamma
//! corrected and boosted, then the stacked RGB image receives contrast,
//! brightness and saturation adjustments. Every adjustment is a linear blend
//! between the image and a "degenerate" reference image:
//!
//! ```text
//! out = clip(degenerate + factor * (pixel - degenerate), 0, 255)
//! ```
//!
//! | Adjustment | Degenerate reference                 |
//! |------------|--------------------------------------|
//! | Contrast   | uniform gray at the mean luma        |
//! | Brightness | black                                |
//! | Saturation | the pixel's own luma (grayscale)     |

use image::RgbImage;

use super::tile::RasterTile;
use crate::error::RasterError;

/// Number of distinct 16-bit sample values.
const SAMPLE_VALUES: usize = u16::MAX as usize + 1;

// =============================================================================
// Parameters
// =============================================================================

/// Tuning for the enhancement pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhancementParams {
    /// Lower clipping percentile (0-100)
    pub low_percentile: f64,

    /// Upper clipping percentile (0-100)
    pub high_percentile: f64,

    /// Gamma; normalized samples are raised to `1 / gamma`
    pub gamma: f64,

    /// Per-band brightness multiplier applied after gamma
    pub band_brightness: f64,

    /// Whole-image contrast factor
    pub contrast: f32,

    /// Whole-image brightness factor
    pub brightness: f32,

    /// Whole-image saturation factor
    pub saturation: f32,
}

impl Default for EnhancementParams {
    fn default() -> Self {
        Self {
            low_percentile: 1.0,
            high_percentile: 99.0,
            gamma: 1.2,
            band_brightness: 1.1,
            contrast: 1.3,
            brightness: 1.1,
            saturation: 1.2,
        }
    }
}

// =============================================================================
// Band Statistics
// =============================================================================

/// Percentile bounds of a band and the extent of its clipped range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandStatistics {
    /// Lower percentile value
    pub low: f64,

    /// Upper percentile value
    pub high: f64,

    /// Minimum of the band after clipping to `[low, high]`
    pub min: f64,

    /// Maximum of the band after clipping to `[low, high]`
    pub max: f64,
}

impl BandStatistics {
    /// Compute statistics for a band. Returns `None` for an empty band.
    pub fn compute(samples: &[u16], low_percentile: f64, high_percentile: f64) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let histogram = Histogram::new(samples);
        let low = histogram.percentile(low_percentile);
        let high = histogram.percentile(high_percentile);

        let clip = |v: f64| v.max(low).min(high);

        Some(Self {
            low,
            high,
            min: clip(histogram.min() as f64),
            max: clip(histogram.max() as f64),
        })
    }

    /// A constant band (after clipping) cannot be stretched.
    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }
}

/// Counting histogram over all 16-bit sample values.
struct Histogram {
    counts: Vec<usize>,
    total: usize,
}

impl Histogram {
    fn new(samples: &[u16]) -> Self {
        let mut counts = vec![0usize; SAMPLE_VALUES];
        for &s in samples {
            counts[s as usize] += 1;
        }
        Self {
            counts,
            total: samples.len(),
        }
    }

    fn min(&self) -> u16 {
        self.nth(0)
    }

    fn max(&self) -> u16 {
        self.nth(self.total - 1)
    }

    /// Value at a zero-based rank of the sorted samples.
    fn nth(&self, rank: usize) -> u16 {
        let mut seen = 0usize;
        for (value, &count) in self.counts.iter().enumerate() {
            seen += count;
            if seen > rank {
                return value as u16;
            }
        }
        u16::MAX
    }

    /// Percentile with linear interpolation between the closest ranks.
    fn percentile(&self, q: f64) -> f64 {
        let position = (q.clamp(0.0, 100.0) / 100.0) * (self.total - 1) as f64;
        let lower_rank = position.floor() as usize;
        let fraction = position - lower_rank as f64;

        let lower = self.nth(lower_rank) as f64;
        if fraction == 0.0 || lower_rank + 1 >= self.total {
            return lower;
        }

        let upper = self.nth(lower_rank + 1) as f64;
        lerp(lower, upper, fraction)
    }
}

/// Linear interpolation, anchored on the nearer endpoint so results match
/// numpy's `percentile` bit for bit.
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let diff = b - a;
    if t >= 0.5 {
        b - diff * (1.0 - t)
    } else {
        a + diff * t
    }
}

// =============================================================================
// Band Enhancement
// =============================================================================

/// Normalize one band to 8 bits.
///
/// Samples are clipped to the percentile range, stretched to `[0, 1]`,
/// gamma corrected, boosted, clipped again and scaled to `[0, 255]` with
/// truncation. A degenerate band yields all zeros.
pub fn enhance_band(samples: &[u16], params: &EnhancementParams) -> Vec<u8> {
    let Some(stats) =
        BandStatistics::compute(samples, params.low_percentile, params.high_percentile)
    else {
        return Vec::new();
    };

    if stats.is_degenerate() {
        return vec![0; samples.len()];
    }

    // Output depends only on the sample value, so map through a table.
    let table = band_lookup_table(&stats, params);
    samples.iter().map(|&s| table[s as usize]).collect()
}

fn band_lookup_table(stats: &BandStatistics, params: &EnhancementParams) -> Vec<u8> {
    let range = stats.max - stats.min;
    let exponent = 1.0 / params.gamma;

    (0..SAMPLE_VALUES)
        .map(|value| {
            let clipped = (value as f64).max(stats.low).min(stats.high);
            let normalized = (clipped - stats.min) / range;
            let corrected = (normalized.powf(exponent) * params.band_brightness).clamp(0.0, 1.0);
            (corrected * 255.0) as u8
        })
        .collect()
}

// =============================================================================
// Whole-Image Adjustments
// =============================================================================

/// ITU-R 601-2 luma in 16.16 fixed point, rounded.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// Blend `value` away from `degenerate` by `factor`, clipped and truncated.
#[inline]
pub fn blend(degenerate: u8, value: u8, factor: f32) -> u8 {
    let out = degenerate as f32 + factor * (value as i32 - degenerate as i32) as f32;
    if out <= 0.0 {
        0
    } else if out >= 255.0 {
        255
    } else {
        out as u8
    }
}

/// Scale contrast about the image's mean luma.
pub fn adjust_contrast(image: &mut RgbImage, factor: f32) {
    let pixels = image.width() as u64 * image.height() as u64;
    if pixels == 0 {
        return;
    }

    let sum: u64 = image
        .pixels()
        .map(|p| luma(p[0], p[1], p[2]) as u64)
        .sum();
    let mean = (sum as f64 / pixels as f64 + 0.5) as u8;

    for pixel in image.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = blend(mean, *channel, factor);
        }
    }
}

/// Scale brightness relative to black.
pub fn adjust_brightness(image: &mut RgbImage, factor: f32) {
    for pixel in image.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = blend(0, *channel, factor);
        }
    }
}

/// Scale saturation relative to each pixel's gray value.
pub fn adjust_saturation(image: &mut RgbImage, factor: f32) {
    for pixel in image.pixels_mut() {
        let [r, g, b] = pixel.0;
        let gray = luma(r, g, b);
        pixel.0 = [
            blend(gray, r, factor),
            blend(gray, g, factor),
            blend(gray, b, factor),
        ];
    }
}

/// Run the full enhancement on a tile, producing an RGB image of the same
/// dimensions.
pub fn enhance_tile(tile: &RasterTile, params: &EnhancementParams) -> Result<RgbImage, RasterError> {
    let (red, green, blue) = tile.rgb_bands()?;

    let red = enhance_band(red, params);
    let green = enhance_band(green, params);
    let blue = enhance_band(blue, params);

    let mut interleaved = Vec::with_capacity(red.len() * 3);
    for ((&r, &g), &b) in red.iter().zip(&green).zip(&blue) {
        interleaved.extend_from_slice(&[r, g, b]);
    }

    let mut image =
        RgbImage::from_raw(tile.width(), tile.height(), interleaved).ok_or_else(|| {
            RasterError::Decode {
                message: "band sizes do not match raster dimensions".to_string(),
            }
        })?;

    adjust_contrast(&mut image, params.contrast);
    adjust_brightness(&mut image, params.brightness);
    adjust_saturation(&mut image, params.saturation);

    Ok(image)
}
