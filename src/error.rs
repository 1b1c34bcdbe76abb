use thiserror::Error;

/// Errors returned by the upstream imagery provider client
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// The provider has no such resource, or no download link for it
    #[error("Upstream resource not found: {resource}")]
    NotFound { resource: String },

    /// Provider quota exceeded or permission denied (HTTP 403)
    #[error("Upstream quota exceeded or permission denied")]
    Quota,

    /// Provider rate limit reached (HTTP 429)
    #[error("Upstream rate limit reached, try again later")]
    RateLimited,

    /// Any other non-2xx response
    #[error("Upstream returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Response body could not be interpreted
    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),

    /// A polled result page never became ready
    #[error("Upstream results not ready after {attempts} attempts: {url}")]
    PollExhausted { url: String, attempts: u32 },

    /// No API key was supplied to the client
    #[error("Upstream API key is not configured")]
    MissingCredential,

    /// A provider URL could not be parsed
    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),
}

/// Errors from the raster enhancement pipeline
#[derive(Debug, Clone, Error)]
pub enum RasterError {
    /// Input bytes are not a readable raster
    #[error("Failed to decode raster: {message}")]
    Decode { message: String },

    /// Raster has fewer bands than an RGB preview needs
    #[error("Raster has {found} band(s), at least 3 are required")]
    TooFewBands { found: usize },

    /// Sample type other than 8- or 16-bit unsigned integers
    #[error("Unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),

    /// PNG encoding failed
    #[error("Failed to encode image: {message}")]
    Encode { message: String },
}

/// Errors surfaced at the request boundary.
///
/// Every variant maps to a machine-checkable kind (see [`GatewayError::kind`])
/// and an HTTP status in the server layer.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    /// Malformed or missing request parameter
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    /// No mosaic matched the requested series and date
    #[error("No mosaic found for series {series_id} in {year}-{month}")]
    MosaicNotFound {
        series_id: String,
        year: String,
        month: String,
    },

    /// A background task panicked or was cancelled
    #[error("Internal task failure: {0}")]
    Task(String),
}

impl GatewayError {
    /// Build a validation error for a parameter that was absent or empty.
    pub fn missing(field: &'static str) -> Self {
        GatewayError::Validation {
            field,
            message: format!("Missing required parameter: {}", field),
        }
    }

    /// Machine-checkable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Upstream(UpstreamError::NotFound { .. }) => "upstream_not_found",
            GatewayError::Upstream(UpstreamError::Quota) => "upstream_quota",
            GatewayError::Upstream(UpstreamError::RateLimited) => "upstream_rate_limited",
            GatewayError::Upstream(_) => "upstream_error",
            GatewayError::Raster(RasterError::Encode { .. }) => "encode_error",
            GatewayError::Raster(_) => "decode_error",
            GatewayError::Validation { .. } => "validation_error",
            GatewayError::MosaicNotFound { .. } => "mosaic_not_found",
            GatewayError::Task(_) => "internal_error",
        }
    }
}
