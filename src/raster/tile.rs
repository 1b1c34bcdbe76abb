//! Multi-band raster tiles decoded from TIFF/GeoTIFF bytes.

use std::io::Cursor;

use tiff::decoder::{Decoder, DecodingResult};

use crate::error::RasterError;

/// A decoded raster with one sample vector per band.
///
/// Samples are stored band-sequential and row-major. 8-bit sources are
/// widened to 16 bits so the enhancement math sees a single sample type.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterTile {
    width: u32,
    height: u32,
    bands: Vec<Vec<u16>>,
}

impl RasterTile {
    /// Build a tile from per-band sample vectors.
    ///
    /// Every band must hold exactly `width * height` samples.
    pub fn new(width: u32, height: u32, bands: Vec<Vec<u16>>) -> Result<Self, RasterError> {
        let pixels = width as usize * height as usize;
        if pixels == 0 {
            return Err(RasterError::Decode {
                message: format!("raster has zero size ({}x{})", width, height),
            });
        }

        if let Some((index, band)) = bands.iter().enumerate().find(|(_, b)| b.len() != pixels) {
            return Err(RasterError::Decode {
                message: format!(
                    "band {} has {} samples, expected {}",
                    index,
                    band.len(),
                    pixels
                ),
            });
        }

        Ok(Self {
            width,
            height,
            bands,
        })
    }

    /// Split pixel-interleaved samples (`r g b [a] r g b [a] ...`) into bands.
    pub fn from_interleaved(width: u32, height: u32, samples: &[u16]) -> Result<Self, RasterError> {
        let pixels = width as usize * height as usize;
        if pixels == 0 {
            return Err(RasterError::Decode {
                message: format!("raster has zero size ({}x{})", width, height),
            });
        }

        if samples.is_empty() || samples.len() % pixels != 0 {
            return Err(RasterError::Decode {
                message: format!(
                    "{} samples do not divide into {}x{} pixels",
                    samples.len(),
                    width,
                    height
                ),
            });
        }

        let band_count = samples.len() / pixels;
        let mut bands = vec![Vec::with_capacity(pixels); band_count];
        for pixel in samples.chunks_exact(band_count) {
            for (band, &sample) in bands.iter_mut().zip(pixel) {
                band.push(sample);
            }
        }

        Self::new(width, height, bands)
    }

    /// Decode TIFF bytes into a tile.
    ///
    /// Accepts 8- and 16-bit unsigned samples with any number of bands.
    pub fn decode(source: &[u8]) -> Result<Self, RasterError> {
        let mut decoder = Decoder::new(Cursor::new(source)).map_err(decode_error)?;

        let (width, height) = decoder.dimensions().map_err(decode_error)?;
        let color_type = decoder.colortype().map_err(decode_error)?;

        let samples: Vec<u16> = match decoder.read_image().map_err(decode_error)? {
            DecodingResult::U8(buf) => buf.into_iter().map(u16::from).collect(),
            DecodingResult::U16(buf) => buf,
            _ => {
                return Err(RasterError::UnsupportedSampleFormat(format!(
                    "{:?} (only 8- and 16-bit unsigned samples are supported)",
                    color_type
                )))
            }
        };

        Self::from_interleaved(width, height, &samples)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bands.
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Samples of one band, if it exists.
    pub fn band(&self, index: usize) -> Option<&[u16]> {
        self.bands.get(index).map(Vec::as_slice)
    }

    /// The first three bands as `(red, green, blue)`.
    ///
    /// Any further bands (alpha, near-infrared) are ignored.
    pub fn rgb_bands(&self) -> Result<(&[u16], &[u16], &[u16]), RasterError> {
        match self.bands.as_slice() {
            [r, g, b, ..] => Ok((r, g, b)),
            _ => Err(RasterError::TooFewBands {
                found: self.bands.len(),
            }),
        }
    }
}

fn decode_error(err: tiff::TiffError) -> RasterError {
    RasterError::Decode {
        message: err.to_string(),
    }
}
