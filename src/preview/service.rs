//! Preview Service for orchestrating preview generation.
//!
//! The PreviewService is the main entry point for quad preview requests:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        PreviewService                            │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                   get_preview()                         │    │
//! │  │  1. Validate ids       4. Fetch raw raster              │    │
//! │  │  2. Check cache        5. Enhance (blocking pool)       │    │
//! │  │  3. Resolve link       6. Cache & return                │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                    │            │
//! │           ▼                    ▼                    ▼            │
//! │   ┌──────────────┐   ┌────────────────┐   ┌────────────────┐    │
//! │   │ PreviewCache │   │ ImageryProvider│   │ RasterEnhancer │    │
//! │   └──────────────┘   └────────────────┘   └────────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any failure after the cache lookup aborts the request and leaves the
//! cache untouched. Concurrent misses for the same quad each run the full
//! pipeline.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info};

use crate::error::GatewayError;
use crate::raster::RasterEnhancer;
use crate::upstream::ImageryProvider;

use super::cache::{PreviewCache, PreviewCacheKey, DEFAULT_PREVIEW_TTL};

// =============================================================================
// Preview Request
// =============================================================================

/// A request for an enhanced quad preview.
#[derive(Debug, Clone)]
pub struct PreviewRequest {
    /// Mosaic identifier
    pub mosaic_id: String,

    /// Quad identifier within the mosaic
    pub quad_id: String,
}

impl PreviewRequest {
    pub fn new(mosaic_id: impl Into<String>, quad_id: impl Into<String>) -> Self {
        Self {
            mosaic_id: mosaic_id.into(),
            quad_id: quad_id.into(),
        }
    }

    fn validate(&self) -> Result<(), GatewayError> {
        if self.mosaic_id.trim().is_empty() {
            return Err(GatewayError::missing("mosaic_id"));
        }
        if self.quad_id.trim().is_empty() {
            return Err(GatewayError::missing("quad_id"));
        }
        Ok(())
    }
}

// =============================================================================
// Preview Response
// =============================================================================

/// Response from the preview service.
#[derive(Debug, Clone)]
pub struct PreviewResponse {
    /// The encoded PNG preview
    pub data: Bytes,

    /// Whether the preview was served from cache
    pub cache_hit: bool,
}

// =============================================================================
// Preview Service
// =============================================================================

/// Service for generating and caching quad previews.
///
/// # Type Parameters
///
/// * `P` - The upstream imagery provider (e.g., [`crate::upstream::PlanetClient`])
///
/// # Example
///
/// ```ignore
/// use basemap_gateway::preview::{PreviewCache, PreviewRequest, PreviewService};
///
/// let service = PreviewService::new(Arc::new(client), Arc::new(PreviewCache::new()));
/// let response = service
///     .get_preview(PreviewRequest::new("mosaic-id", "1234-5678"))
///     .await?;
/// ```
pub struct PreviewService<P: ImageryProvider> {
    /// Upstream imagery provider
    provider: Arc<P>,

    /// Cache for encoded previews
    cache: Arc<PreviewCache>,

    /// Raster enhancement pipeline
    enhancer: RasterEnhancer,

    /// Time-to-live for newly cached previews
    ttl: Duration,

    /// Whether previews are read from and written to the cache
    caching: bool,
}

impl<P: ImageryProvider> PreviewService<P> {
    /// Create a new preview service with the default TTL (one hour).
    pub fn new(provider: Arc<P>, cache: Arc<PreviewCache>) -> Self {
        Self {
            provider,
            cache,
            enhancer: RasterEnhancer::new(),
            ttl: DEFAULT_PREVIEW_TTL,
            caching: true,
        }
    }

    /// Set the TTL applied to newly cached previews.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Enable or disable preview caching.
    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.caching = enabled;
        self
    }

    /// Use a custom enhancer.
    pub fn with_enhancer(mut self, enhancer: RasterEnhancer) -> Self {
        self.enhancer = enhancer;
        self
    }

    /// The configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Access the shared upstream provider.
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Get a preview, using the cache when available.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Either identifier is empty
    /// - The quad has no download link
    /// - The upstream request fails (quota, rate limit, transport)
    /// - The raster cannot be decoded or the PNG cannot be encoded
    pub async fn get_preview(
        &self,
        request: PreviewRequest,
    ) -> Result<PreviewResponse, GatewayError> {
        request.validate()?;

        let cache_key = PreviewCacheKey::new(request.mosaic_id.as_str(), request.quad_id.as_str());

        if self.caching {
            if let Some(cached) = self.cache.get(&cache_key).await {
                debug!(
                    mosaic_id = %request.mosaic_id,
                    quad_id = %request.quad_id,
                    "Preview cache hit"
                );
                return Ok(PreviewResponse {
                    data: cached,
                    cache_hit: true,
                });
            }
        }

        let data = self.generate_preview(&request).await?;

        if self.caching {
            self.cache.put(cache_key, data.clone(), self.ttl).await;
        }

        Ok(PreviewResponse {
            data,
            cache_hit: false,
        })
    }

    /// Generate a preview without touching the cache.
    pub async fn generate_preview(&self, request: &PreviewRequest) -> Result<Bytes, GatewayError> {
        let url = self
            .provider
            .resolve_quad_download_link(&request.mosaic_id, &request.quad_id)
            .await?;

        let raw = self.provider.fetch_raw_tile(&url).await?;
        let raw_size = raw.len();

        let enhancer = self.enhancer.clone();
        let png = tokio::task::spawn_blocking(move || enhancer.enhance(&raw))
            .await
            .map_err(|e| GatewayError::Task(e.to_string()))??;

        info!(
            mosaic_id = %request.mosaic_id,
            quad_id = %request.quad_id,
            raw_bytes = raw_size,
            png_bytes = png.len(),
            "Generated preview"
        );

        Ok(png)
    }

    /// Get preview cache statistics.
    ///
    /// Returns `(current_size, capacity, entry_count)`.
    pub async fn cache_stats(&self) -> (usize, usize, usize) {
        let size = self.cache.size().await;
        let capacity = self.cache.capacity();
        let count = self.cache.len().await;
        (size, capacity, count)
    }

    /// Clear the preview cache.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }
}
