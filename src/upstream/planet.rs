//! Planet basemaps API client.
//!
//! Every request is authenticated with HTTP basic auth, using the API key as
//! the username and an empty password.
//!
//! # Status Classification
//!
//! - `403` becomes [`UpstreamError::Quota`]
//! - `404` becomes [`UpstreamError::NotFound`]
//! - `429` becomes [`UpstreamError::RateLimited`]
//! - any other non-2xx becomes [`UpstreamError::Status`]
//! - transport failures become [`UpstreamError::Connection`]

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::LOCATION;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use super::provider::{ImageryProvider, MosaicList, QuadDetails, QuadLink};
use crate::error::UpstreamError;

/// Default provider endpoint.
pub const DEFAULT_PLANET_BASE_URL: &str = "https://api.planet.com";

/// Default request timeout for upstream calls.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(120);

/// Default number of attempts per quad search result page.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 3;

/// Default wait between quad search result page attempts.
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_secs(2);

/// Maximum number of characters of an error body kept in error messages.
const MAX_ERROR_BODY_CHARS: usize = 512;

// =============================================================================
// Configuration
// =============================================================================

/// Connection settings for [`PlanetClient`].
#[derive(Debug, Clone)]
pub struct PlanetClientConfig {
    /// Provider base URL (scheme and host, no trailing path)
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Attempts per quad search result page
    pub poll_attempts: u32,

    /// Delay between attempts on a result page that is not ready
    pub poll_delay: Duration,
}

impl Default for PlanetClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PLANET_BASE_URL.to_string(),
            timeout: DEFAULT_UPSTREAM_TIMEOUT,
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_delay: DEFAULT_POLL_DELAY,
        }
    }
}

impl PlanetClientConfig {
    /// Point the client at a different endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set attempts and delay for quad search result polling.
    pub fn with_polling(mut self, attempts: u32, delay: Duration) -> Self {
        self.poll_attempts = attempts.max(1);
        self.poll_delay = delay;
        self
    }
}

// =============================================================================
// Response Shapes
// =============================================================================

/// One page of quad search results.
#[derive(Debug, Deserialize)]
struct QuadPage {
    #[serde(default)]
    items: Vec<serde_json::Value>,

    #[serde(rename = "_links", default)]
    links: PageLinks,
}

#[derive(Debug, Default, Deserialize)]
struct PageLinks {
    #[serde(rename = "_next", default)]
    next: Option<String>,
}

// =============================================================================
// Client
// =============================================================================

/// Authenticated client for the Planet basemaps API.
#[derive(Clone)]
pub struct PlanetClient {
    /// Client that follows redirects (metadata and downloads)
    http: reqwest::Client,

    /// Client that surfaces redirects (quad search hand-off)
    search_http: reqwest::Client,

    api_key: String,
    base_url: String,
    poll_attempts: u32,
    poll_delay: Duration,
}

impl PlanetClient {
    /// Create a client with default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self, UpstreamError> {
        Self::with_config(api_key, PlanetClientConfig::default())
    }

    /// Create a client with explicit settings.
    ///
    /// Fails with [`UpstreamError::MissingCredential`] when the key is empty.
    pub fn with_config(
        api_key: impl Into<String>,
        config: PlanetClientConfig,
    ) -> Result<Self, UpstreamError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(UpstreamError::MissingCredential);
        }

        Url::parse(&config.base_url)
            .map_err(|e| UpstreamError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpstreamError::Connection(e.to_string()))?;

        let search_http = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| UpstreamError::Connection(e.to_string()))?;

        Ok(Self {
            http,
            search_http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            poll_attempts: config.poll_attempts.max(1),
            poll_delay: config.poll_delay,
        })
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn quad_url(&self, mosaic_id: &str, quad_id: &str) -> String {
        format!(
            "{}/basemaps/v1/mosaics/{}/quads/{}",
            self.base_url,
            urlencoding::encode(mosaic_id),
            urlencoding::encode(quad_id)
        )
    }

    /// Authenticated GET that classifies the response status.
    async fn get(&self, url: &str) -> Result<Response, UpstreamError> {
        debug!(url = url, "Upstream GET");
        let response = self
            .http
            .get(url)
            .basic_auth(&self.api_key, Some(""))
            .send()
            .await
            .map_err(|e| UpstreamError::Connection(e.to_string()))?;

        check_status(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, UpstreamError> {
        let response = self.get(url).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))
    }

    /// Fetch one page of quad search results, retrying while it is not ready.
    async fn poll_quad_page(&self, url: &str) -> Result<QuadPage, UpstreamError> {
        for attempt in 1..=self.poll_attempts {
            let response = self.get(url).await?;

            if response.status() == StatusCode::OK {
                return response
                    .json::<QuadPage>()
                    .await
                    .map_err(|e| UpstreamError::InvalidResponse(e.to_string()));
            }

            warn!(
                status = response.status().as_u16(),
                attempt = attempt,
                max_attempts = self.poll_attempts,
                "Quad search results not ready"
            );

            if attempt < self.poll_attempts {
                tokio::time::sleep(self.poll_delay).await;
            }
        }

        Err(UpstreamError::PollExhausted {
            url: url.to_string(),
            attempts: self.poll_attempts,
        })
    }
}

#[async_trait]
impl ImageryProvider for PlanetClient {
    async fn quad_download_link(
        &self,
        mosaic_id: &str,
        quad_id: &str,
    ) -> Result<QuadLink, UpstreamError> {
        let details: QuadDetails = self.get_json(&self.quad_url(mosaic_id, quad_id)).await?;
        Ok(details.download_link())
    }

    async fn fetch_raw_tile(&self, url: &str) -> Result<Bytes, UpstreamError> {
        let response = self.get(url).await?;
        let data = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Connection(e.to_string()))?;

        debug!(bytes = data.len(), "Downloaded raw quad");
        Ok(data)
    }

    async fn list_series(&self) -> Result<serde_json::Value, UpstreamError> {
        self.get_json(&format!("{}/basemaps/v1/series", self.base_url))
            .await
    }

    async fn list_mosaics(&self, series_id: &str) -> Result<MosaicList, UpstreamError> {
        self.get_json(&format!(
            "{}/basemaps/v1/series/{}/mosaics",
            self.base_url,
            urlencoding::encode(series_id)
        ))
        .await
    }

    async fn search_quads(
        &self,
        mosaic_id: &str,
        geometry: &serde_json::Value,
    ) -> Result<Vec<serde_json::Value>, UpstreamError> {
        let search_url = format!(
            "{}/basemaps/v1/mosaics/{}/quads/search",
            self.base_url,
            urlencoding::encode(mosaic_id)
        );

        info!(mosaic_id = mosaic_id, "Starting quad search");
        let response = self
            .search_http
            .post(&search_url)
            .basic_auth(&self.api_key, Some(""))
            .json(geometry)
            .send()
            .await
            .map_err(|e| UpstreamError::Connection(e.to_string()))?;

        let results_url = redirect_target(&search_url, response).await?;

        let mut items = Vec::new();
        let mut page_url = Some(results_url);

        while let Some(url) = page_url.take() {
            let page = self.poll_quad_page(&url).await?;
            items.extend(page.items);

            if let Some(next) = page.links.next {
                let next = with_api_key(&next, &self.api_key)?;
                debug!(url = next.as_str(), "Following next quad page");
                page_url = Some(next);
            }
        }

        info!(
            mosaic_id = mosaic_id,
            count = items.len(),
            "Quad search complete"
        );
        Ok(items)
    }

    async fn quad_details(
        &self,
        mosaic_id: &str,
        quad_id: &str,
    ) -> Result<serde_json::Value, UpstreamError> {
        self.get_json(&self.quad_url(mosaic_id, quad_id)).await
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Map a status code and body to an error, or `None` for 2xx.
///
/// `resource` names what was requested and is only used for `404`.
pub fn classify_status(status: u16, resource: &str, body: &str) -> Option<UpstreamError> {
    match status {
        200..=299 => None,
        403 => Some(UpstreamError::Quota),
        404 => Some(UpstreamError::NotFound {
            resource: resource.to_string(),
        }),
        429 => Some(UpstreamError::RateLimited),
        _ => Some(UpstreamError::Status {
            status,
            message: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }),
    }
}

async fn check_status(response: Response) -> Result<Response, UpstreamError> {
    let status = response.status().as_u16();
    if response.status().is_success() {
        return Ok(response);
    }

    // Query strings may carry the API key
    let mut url = response.url().clone();
    url.set_query(None);
    let body = response.text().await.unwrap_or_default();
    match classify_status(status, url.as_str(), &body) {
        Some(err) => {
            warn!(status = status, "Upstream request failed: {}", err);
            Err(err)
        }
        None => Err(UpstreamError::Status {
            status,
            message: body,
        }),
    }
}

/// Extract the results location from the quad search hand-off response.
async fn redirect_target(request_url: &str, response: Response) -> Result<String, UpstreamError> {
    let status = response.status();

    if status != StatusCode::FOUND {
        let body = response.text().await.unwrap_or_default();
        return Err(match classify_status(status.as_u16(), request_url, &body) {
            Some(err) => err,
            None => UpstreamError::Status {
                status: status.as_u16(),
                message: format!("expected a 302 redirect to search results, got {}", status),
            },
        });
    }

    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            UpstreamError::InvalidResponse("quad search redirect has no Location".to_string())
        })?;

    let base = Url::parse(request_url).map_err(|e| UpstreamError::InvalidUrl(e.to_string()))?;
    let target = base
        .join(location)
        .map_err(|e| UpstreamError::InvalidUrl(format!("{}: {}", location, e)))?;

    Ok(target.to_string())
}

/// Add an `api_key` query parameter unless the URL already carries one.
pub fn with_api_key(url: &str, api_key: &str) -> Result<String, UpstreamError> {
    let mut parsed = Url::parse(url).map_err(|e| UpstreamError::InvalidUrl(e.to_string()))?;

    if !parsed.query_pairs().any(|(k, _)| k == "api_key") {
        parsed.query_pairs_mut().append_pair("api_key", api_key);
    }

    Ok(parsed.to_string())
}
