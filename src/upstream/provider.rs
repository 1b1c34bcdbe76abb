use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;

use crate::error::UpstreamError;

/// Outcome of looking up a quad's download link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuadLink {
    /// The provider returned a download URL
    Found(String),

    /// Quad metadata exists but carries no download link
    NotFound,
}

/// Quad metadata as returned by `GET /basemaps/v1/mosaics/{id}/quads/{id}`.
///
/// Only the fields the gateway relies on are typed.
#[derive(Debug, Clone, Deserialize)]
pub struct QuadDetails {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(rename = "_links", default)]
    pub links: QuadLinks,
}

/// The `_links` object of a quad.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuadLinks {
    #[serde(default)]
    pub download: Option<String>,
}

impl QuadDetails {
    /// Classify the download link. Empty strings count as missing.
    pub fn download_link(&self) -> QuadLink {
        match self.links.download.as_deref() {
            Some(url) if !url.is_empty() => QuadLink::Found(url.to_string()),
            _ => QuadLink::NotFound,
        }
    }
}

/// A single mosaic in a series listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MosaicSummary {
    pub id: String,
    pub name: String,
}

/// Mosaics belonging to a basemap series.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MosaicList {
    #[serde(default)]
    pub mosaics: Vec<MosaicSummary>,
}

/// Trait for an upstream imagery provider.
///
/// The preview and basemap services only talk to the provider through this
/// trait, so tests can substitute a double that counts calls.
#[async_trait]
pub trait ImageryProvider: Send + Sync + 'static {
    /// Look up the download link for a quad.
    async fn quad_download_link(
        &self,
        mosaic_id: &str,
        quad_id: &str,
    ) -> Result<QuadLink, UpstreamError>;

    /// Download the full raster payload behind a download link.
    async fn fetch_raw_tile(&self, url: &str) -> Result<Bytes, UpstreamError>;

    /// List the basemap series visible to the API key.
    async fn list_series(&self) -> Result<serde_json::Value, UpstreamError>;

    /// List the mosaics of a series.
    async fn list_mosaics(&self, series_id: &str) -> Result<MosaicList, UpstreamError>;

    /// Search the quads of a mosaic intersecting a GeoJSON geometry.
    async fn search_quads(
        &self,
        mosaic_id: &str,
        geometry: &serde_json::Value,
    ) -> Result<Vec<serde_json::Value>, UpstreamError>;

    /// Raw quad metadata.
    async fn quad_details(
        &self,
        mosaic_id: &str,
        quad_id: &str,
    ) -> Result<serde_json::Value, UpstreamError>;

    /// Resolve a quad's download link, failing with
    /// [`UpstreamError::NotFound`] when the provider has none.
    async fn resolve_quad_download_link(
        &self,
        mosaic_id: &str,
        quad_id: &str,
    ) -> Result<String, UpstreamError> {
        match self.quad_download_link(mosaic_id, quad_id).await? {
            QuadLink::Found(url) => Ok(url),
            QuadLink::NotFound => Err(UpstreamError::NotFound {
                resource: format!("download link for quad {}/{}", mosaic_id, quad_id),
            }),
        }
    }
}
