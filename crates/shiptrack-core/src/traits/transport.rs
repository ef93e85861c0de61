// # Transport Trait
//
// Carries a carrier's request descriptor to its API and hands back the raw
// response.
//
// ## Implementations
//
// - reqwest: `shiptrack-http` crate
// - Test doubles: `tests/common/mod.rs`
//
// ## Trust Level
//
// Transports are single-shot: one request per call, no retries, no caching.
// Status codes that carry a carrier error document (400, 404, ...) are
// returned as a normal response so the carrier can decode the document.

use async_trait::async_trait;
use std::fmt;

/// HTTP method of a tracking request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// Body of a tracking request
#[derive(Clone, PartialEq)]
pub enum RequestBody {
    /// JSON document (`Content-Type: application/json`)
    Json(serde_json::Value),
    /// Pre-rendered text with its content type
    Text {
        content_type: &'static str,
        content: String,
    },
}

// Bodies carry carrier credentials
impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Json(_) => f.write_str("Json(<REDACTED>)"),
            RequestBody::Text { content_type, .. } => f
                .debug_struct("Text")
                .field("content_type", content_type)
                .field("content", &"<REDACTED>")
                .finish(),
        }
    }
}

/// Request descriptor produced by a carrier
#[derive(Clone, PartialEq)]
pub struct TrackRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Query parameters, unencoded
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl TrackRequest {
    /// A GET request with no parameters
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// A POST request with the given body
    pub fn post(url: impl Into<String>, body: RequestBody) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    /// Add a query parameter
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a query parameter
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a header (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// Query strings and headers carry credentials (USPS user id, DHL API key)
impl fmt::Debug for TrackRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query: Vec<&str> = self.query.iter().map(|(k, _)| k.as_str()).collect();
        let headers: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("TrackRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &query)
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

/// Raw response handed back to the carrier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for transport implementations
///
/// # Forbidden Capabilities
/// - Retry logic or backoff
/// - Caching responses
/// - Interpreting carrier documents (owned by the carrier)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return the response
    ///
    /// # Returns
    ///
    /// - `Ok(TransportResponse)`: any response the carrier may explain itself
    /// - `Err(Error)`: network failure, authentication failure, rate limit,
    ///   server error
    async fn send(&self, request: &TrackRequest) -> crate::Result<TransportResponse>;

    /// Transport name (for logging)
    fn transport_name(&self) -> &'static str;
}
