//! Basemap Service for series, mosaic and quad lookups.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::GatewayError;
use crate::preview::ExpiringCache;
use crate::upstream::ImageryProvider;

/// How long a resolved mosaic id is remembered.
pub const DEFAULT_MOSAIC_TTL: Duration = Duration::from_secs(3600);

/// Byte budget for the mosaic id cache; entries are short strings.
const MOSAIC_CACHE_CAPACITY: usize = 1024 * 1024;

/// Value of the `type` field added to every quad search result.
pub const BASEMAP_QUAD_TYPE: &str = "basemap_quad";

/// Cache key for a mosaic lookup by series and date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MosaicCacheKey {
    pub series_id: Arc<str>,
    pub year: Arc<str>,
    pub month: Arc<str>,
}

impl MosaicCacheKey {
    pub fn new(
        series_id: impl Into<Arc<str>>,
        year: impl Into<Arc<str>>,
        month: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            series_id: series_id.into(),
            year: year.into(),
            month: month.into(),
        }
    }
}

/// Mosaic ids keyed by `(series, year, month)`.
pub type MosaicCache = ExpiringCache<MosaicCacheKey, String>;

/// The `YYYY-MM` fragment mosaic names carry, e.g. `2024-01`.
pub fn mosaic_date_fragment(year: &str, month: &str) -> String {
    format!("{}-{:0>2}", year, month)
}

/// Series, mosaic and quad metadata lookups on top of an [`ImageryProvider`].
pub struct BasemapService<P: ImageryProvider> {
    provider: Arc<P>,
    mosaics: MosaicCache,
    mosaic_ttl: Duration,
}

impl<P: ImageryProvider> BasemapService<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            mosaics: MosaicCache::with_capacity(MOSAIC_CACHE_CAPACITY),
            mosaic_ttl: DEFAULT_MOSAIC_TTL,
        }
    }

    /// Set how long resolved mosaic ids are cached.
    pub fn with_mosaic_ttl(mut self, ttl: Duration) -> Self {
        self.mosaic_ttl = ttl;
        self
    }

    /// Basemap series visible to the API key, as returned upstream.
    pub async fn list_series(&self) -> Result<Value, GatewayError> {
        Ok(self.provider.list_series().await?)
    }

    /// Find the mosaic of a series covering the given year and month.
    ///
    /// The first mosaic whose name contains `YYYY-MM` wins. Hits are cached;
    /// misses are not, so a newly published mosaic is picked up right away.
    pub async fn find_mosaic_id(
        &self,
        series_id: &str,
        year: &str,
        month: &str,
    ) -> Result<Option<String>, GatewayError> {
        let key = MosaicCacheKey::new(series_id, year, month);
        if let Some(id) = self.mosaics.get(&key).await {
            return Ok(Some(id));
        }

        let fragment = mosaic_date_fragment(year, month);
        let listing = self.provider.list_mosaics(series_id).await?;

        let Some(mosaic) = listing
            .mosaics
            .into_iter()
            .find(|m| m.name.contains(&fragment))
        else {
            debug!(series_id, date = %fragment, "No mosaic matched");
            return Ok(None);
        };

        debug!(series_id, date = %fragment, mosaic_id = %mosaic.id, "Resolved mosaic");
        self.mosaics
            .put(key, mosaic.id.clone(), self.mosaic_ttl)
            .await;
        Ok(Some(mosaic.id))
    }

    /// Like [`find_mosaic_id`](Self::find_mosaic_id), but a miss is an error.
    pub async fn require_mosaic_id(
        &self,
        series_id: &str,
        year: &str,
        month: &str,
    ) -> Result<String, GatewayError> {
        self.find_mosaic_id(series_id, year, month)
            .await?
            .ok_or_else(|| GatewayError::MosaicNotFound {
                series_id: series_id.to_string(),
                year: year.to_string(),
                month: month.to_string(),
            })
    }

    /// Quads of a mosaic intersecting `geometry`, each tagged with its
    /// mosaic, series and `type = "basemap_quad"`.
    pub async fn search_quads(
        &self,
        mosaic_id: &str,
        series_id: &str,
        geometry: &Value,
    ) -> Result<Vec<Value>, GatewayError> {
        let mut quads = self.provider.search_quads(mosaic_id, geometry).await?;

        for quad in quads.iter_mut() {
            if let Value::Object(fields) = quad {
                fields.insert("mosaic_id".to_string(), Value::from(mosaic_id));
                fields.insert("series_id".to_string(), Value::from(series_id));
                fields.insert("type".to_string(), Value::from(BASEMAP_QUAD_TYPE));
            }
        }

        debug!(mosaic_id, series_id, count = quads.len(), "Quad search finished");
        Ok(quads)
    }

    /// Raw quad metadata, as returned upstream.
    pub async fn quad_details(&self, mosaic_id: &str, quad_id: &str) -> Result<Value, GatewayError> {
        Ok(self.provider.quad_details(mosaic_id, quad_id).await?)
    }
}
