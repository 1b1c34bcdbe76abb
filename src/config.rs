//! Configuration management for the basemap gateway.
//!
//! Settings come from command-line arguments, falling back to environment
//! variables, then defaults. The provider credential is the only required
//! value.
//!
//! # Example
//!
//! ```ignore
//! use basemap_gateway::config::Config;
//! use clap::Parser;
//!
//! let config = Config::parse();
//! config.validate()?;
//! println!("Listening on {}", config.bind_address());
//! ```
//!
//! # Environment Variables
//!
//! - `PLANET_API_KEY` - Planet API key (required)
//! - `BASEMAP_HOST` - Server bind address (default: 0.0.0.0)
//! - `BASEMAP_PORT` - Server port (default: 3000)
//! - `BASEMAP_PLANET_BASE_URL` - Planet API endpoint (default: https://api.planet.com)
//! - `BASEMAP_UPSTREAM_TIMEOUT` - Upstream request timeout in seconds (default: 120)
//! - `BASEMAP_POLL_ATTEMPTS` - Attempts per quad search page (default: 3)
//! - `BASEMAP_POLL_DELAY` - Seconds between quad search attempts (default: 2)
//! - `BASEMAP_CACHE_PREVIEWS` - Cache enhanced previews (default: true)
//! - `BASEMAP_PREVIEW_TTL` - Preview cache TTL in seconds (default: 3600)
//! - `BASEMAP_PREVIEW_CACHE_SIZE` - Preview cache capacity in bytes (default: 256MB)
//! - `BASEMAP_MOSAIC_TTL` - Mosaic lookup cache TTL in seconds (default: 3600)
//! - `BASEMAP_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `BASEMAP_CORS_ORIGINS` - Comma-separated allowed origins (default: any)

use std::time::Duration;

use clap::Parser;

use crate::preview::DEFAULT_PREVIEW_CACHE_CAPACITY;
use crate::upstream::{PlanetClientConfig, DEFAULT_PLANET_BASE_URL, DEFAULT_POLL_ATTEMPTS};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

/// Default preview and mosaic cache TTL in seconds (1 hour).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Default upstream timeout in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 120;

/// Default seconds between quad search result page attempts.
pub const DEFAULT_POLL_DELAY_SECS: u64 = 2;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Basemap Gateway - enhanced previews and catalog lookups for satellite basemaps.
#[derive(Parser, Debug, Clone)]
#[command(name = "basemap-gateway")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "BASEMAP_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "BASEMAP_PORT")]
    pub port: u16,

    // =========================================================================
    // Upstream Configuration
    // =========================================================================
    /// Planet API key, sent as the basic auth username.
    #[arg(long, env = "PLANET_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Planet API base URL.
    #[arg(long, default_value = DEFAULT_PLANET_BASE_URL, env = "BASEMAP_PLANET_BASE_URL")]
    pub planet_base_url: String,

    /// Upstream request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_UPSTREAM_TIMEOUT_SECS, env = "BASEMAP_UPSTREAM_TIMEOUT")]
    pub upstream_timeout: u64,

    /// Attempts per quad search result page before giving up.
    #[arg(long, default_value_t = DEFAULT_POLL_ATTEMPTS, env = "BASEMAP_POLL_ATTEMPTS")]
    pub poll_attempts: u32,

    /// Seconds to wait between quad search result page attempts.
    #[arg(long, default_value_t = DEFAULT_POLL_DELAY_SECS, env = "BASEMAP_POLL_DELAY")]
    pub poll_delay: u64,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Cache enhanced previews in memory.
    #[arg(
        long,
        default_value_t = true,
        env = "BASEMAP_CACHE_PREVIEWS",
        action = clap::ArgAction::Set
    )]
    pub cache_previews: bool,

    /// Preview cache time-to-live in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS, env = "BASEMAP_PREVIEW_TTL")]
    pub preview_ttl: u64,

    /// Preview cache capacity in bytes.
    #[arg(long, default_value_t = DEFAULT_PREVIEW_CACHE_CAPACITY, env = "BASEMAP_PREVIEW_CACHE_SIZE")]
    pub preview_cache_size: usize,

    /// Mosaic lookup cache time-to-live in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS, env = "BASEMAP_MOSAIC_TTL")]
    pub mosaic_ttl: u64,

    /// HTTP Cache-Control max-age in seconds for previews.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "BASEMAP_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "BASEMAP_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key().is_none() {
            return Err(
                "Planet API key is required. Set --api-key or PLANET_API_KEY".to_string(),
            );
        }

        let base_url = self.planet_base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(format!(
                "planet_base_url must be an http(s) URL, got '{}'",
                self.planet_base_url
            ));
        }

        if self.upstream_timeout == 0 {
            return Err("upstream_timeout must be greater than 0".to_string());
        }
        if self.poll_attempts == 0 {
            return Err("poll_attempts must be greater than 0".to_string());
        }

        if self.cache_previews {
            if self.preview_ttl == 0 {
                return Err("preview_ttl must be greater than 0".to_string());
            }
            if self.preview_cache_size == 0 {
                return Err("preview_cache_size must be greater than 0".to_string());
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The API key, if set and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Preview cache TTL.
    pub fn preview_ttl(&self) -> Duration {
        Duration::from_secs(self.preview_ttl)
    }

    /// Mosaic lookup cache TTL.
    pub fn mosaic_ttl(&self) -> Duration {
        Duration::from_secs(self.mosaic_ttl)
    }

    /// Upstream client settings.
    pub fn planet_client_config(&self) -> PlanetClientConfig {
        PlanetClientConfig::default()
            .with_base_url(self.planet_base_url.trim())
            .with_timeout(Duration::from_secs(self.upstream_timeout))
            .with_polling(self.poll_attempts, Duration::from_secs(self.poll_delay))
    }
}

// =============================================================================
// Tests
// =============================================================================
