// # HTTP Transport
//
// reqwest-backed implementation of the shiptrack `Transport` trait.
//
// ## Responsibilities
//
// - Translate a carrier's `TrackRequest` into one HTTP request
// - Apply the configured timeout
// - Map transport-level failures to typed errors
//
// ## Status Handling
//
// | Status        | Result                                   |
// |---------------|------------------------------------------|
// | 401, 403      | `Error::Authentication`                  |
// | 429           | `Error::RateLimited`                     |
// | 502, 503, 504 | `Error::Provider` (transient)            |
// | anything else | `TransportResponse` for the carrier      |
//
// 4xx bodies and plain 500s are handed back untouched: carriers put their
// error documents there (SOAP faults arrive as 500, DHL misses as 404).
//
// ## Not Here
//
// - Retry logic or backoff
// - Caching
// - Interpreting carrier documents

use shiptrack_core::config::HttpConfig;
use shiptrack_core::{
    Error, HttpMethod, RequestBody, Result, TrackRequest, Transport, TransportResponse,
};

use std::time::Duration;

/// Request timeout when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sent with every request
const USER_AGENT: &str = concat!("shiptrack/", env!("CARGO_PKG_VERSION"));

/// reqwest-based transport
#[derive(Clone)]
pub struct HttpTransport {
    /// HTTP client
    client: reqwest::Client,

    /// Request timeout
    timeout: Duration,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a transport with the given request timeout
    ///
    /// # Errors
    ///
    /// `Error::Http` if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Create a transport from the `[http]` configuration section
    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        config.validate()?;
        Self::new(Duration::from_secs(config.timeout_secs))
    }

    /// The configured request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn prepare(&self, request: &TrackRequest) -> reqwest::RequestBuilder {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        match &request.body {
            Some(RequestBody::Json(document)) => builder.json(document),
            Some(RequestBody::Text { content_type, content }) => builder
                .header(reqwest::header::CONTENT_TYPE, *content_type)
                .body(content.clone()),
            None => builder,
        }
    }
}

/// Map a status that the carrier cannot act on to an error
fn status_error(status: u16, host: &str, body: &str) -> Option<Error> {
    match status {
        401 | 403 => Some(Error::auth(format!(
            "{} rejected the credentials (HTTP {})",
            host, status
        ))),
        429 => Some(Error::rate_limited(format!(
            "{} is rate limiting requests (HTTP {})",
            host, status
        ))),
        502..=504 => Some(Error::provider(
            host,
            format!("server error (transient): {} - {}", status, body.trim()),
        )),
        _ => None,
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &TrackRequest) -> Result<TransportResponse> {
        let host = reqwest::Url::parse(&request.url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| request.url.clone());

        tracing::debug!("{} {} (timeout={:?})", request.method, request.url, self.timeout);

        let response = self
            .prepare(request)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request to {} failed: {}", host, e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response from {}: {}", host, e)))?;

        if let Some(error) = status_error(status, &host, &body) {
            tracing::warn!("{} answered HTTP {}", host, status);
            return Err(error);
        }

        tracing::debug!("{} answered HTTP {} ({} bytes)", host, status, body.len());
        Ok(TransportResponse::new(status, body))
    }

    fn transport_name(&self) -> &'static str {
        "http"
    }
}
