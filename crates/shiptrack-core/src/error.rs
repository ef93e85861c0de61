//! Error types for shiptrack
//!
//! Identification and checksum validation never fail: they answer `bool`.
//! Everything in this module belongs to the layers around them (configuration,
//! transport, carrier response decoding).

use thiserror::Error;

/// Result type alias for shiptrack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for shiptrack
#[derive(Error, Debug)]
pub enum Error {
    /// No registered carrier claims the tracking number, or the requested
    /// service name is unknown
    #[error("Unsupported shipper: {0}")]
    UnsupportedShipper(String),

    /// The number failed validation or the carrier rejected it
    #[error("Invalid tracking number: {0}")]
    InvalidTrackingNumber(String),

    /// The carrier answered but could not produce tracking information
    #[error("Track failed ({carrier}): {message}")]
    TrackFailed {
        /// Carrier name
        carrier: String,
        /// Error message reported by the carrier
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML decoding errors
    #[error("XML error: {0}")]
    Xml(String),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Carrier API error that is not tied to a particular number
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Carrier or transport name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an unsupported shipper error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedShipper(msg.into())
    }

    /// Create an invalid tracking number error
    pub fn invalid_number(msg: impl Into<String>) -> Self {
        Self::InvalidTrackingNumber(msg.into())
    }

    /// Create a track failure for a carrier
    pub fn track_failed(carrier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TrackFailed {
            carrier: carrier.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an XML decoding error
    pub fn xml(msg: impl Into<String>) -> Self {
        Self::Xml(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether the same request may succeed if retried later
    ///
    /// Transports never retry on their own; this is the caller's hint for
    /// rate limits, carrier 5xx responses and network failures.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Http(_) | Self::Provider { .. })
    }
}

impl From<quick_xml::de::DeError> for Error {
    fn from(err: quick_xml::de::DeError) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
