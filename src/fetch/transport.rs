//! HTTP transport: the fetch capability the core consumes.
//!
//! Two operations are exposed: [`Transport::fetch`] buffers a whole response
//! (listing pages are small), and [`Transport::fetch_stream`] yields body
//! chunks for byte-level progress reporting on large file downloads.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors that can occur while fetching a URL.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The host could not be reached (DNS failure, connection refused).
    #[error("unreachable: {url}: {message}")]
    Unreachable {
        /// The URL that could not be reached.
        url: String,
        /// Description of the underlying connection failure.
        message: String,
    },

    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Anything else (protocol errors, body read failures, bad URLs).
    #[error("fetch error for {url}: {message}")]
    Other {
        /// The URL being fetched when the error occurred.
        url: String,
        /// Description of the failure.
        message: String,
    },
}

impl FetchError {
    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an unreachable-host error.
    pub fn unreachable(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unreachable {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a catch-all fetch error.
    pub fn other(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Other {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// A fully buffered fetch result.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Response body bytes.
    pub body: Vec<u8>,
    /// Content-Type header value, when present.
    pub content_type: Option<String>,
    /// Content-Length as reported by the server, when known.
    pub content_length: Option<u64>,
}

impl FetchResponse {
    /// Returns the body decoded as UTF-8, replacing invalid sequences.
    ///
    /// Listing pages occasionally carry stray bytes in filenames; lossy
    /// decoding keeps the rest of the page parseable.
    #[must_use]
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A streaming fetch in flight: chunked body plus the total size if the
/// server disclosed one.
pub struct ByteStream {
    /// Total body size in bytes, when the server sent Content-Length.
    pub content_length: Option<u64>,
    /// Body chunks in arrival order. A chunk error aborts the stream.
    pub chunks: BoxStream<'static, Result<Vec<u8>, FetchError>>,
}

/// The fetch capability consumed by navigation and downloads.
///
/// Implementations own their timeout and user-agent configuration; the
/// session constructs one transport per run from the config snapshot.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches a URL and buffers the whole response body.
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;

    /// Fetches a URL as a chunk stream for progress-reporting downloads.
    async fn fetch_stream(&self, url: &str) -> Result<ByteStream, FetchError>;
}

/// reqwest-backed [`Transport`] with connection pooling.
///
/// Created once per session and shared; cloning is cheap (the inner client
/// is reference-counted).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with the given request timeout and user agent.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build. The only dynamic
    /// input is the user agent, which config validation restricts to a
    /// valid header value, so this should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .expect("failed to build HTTP client with validated configuration");
        Self { client }
    }

    async fn send_get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_reqwest_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response = self.send_get(url).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let content_length = response.content_length();

        let body = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(url, &e))?
            .to_vec();

        debug!(bytes = body.len(), "fetched");

        Ok(FetchResponse {
            body,
            content_type,
            content_length,
        })
    }

    #[instrument(level = "debug", skip(self))]
    async fn fetch_stream(&self, url: &str) -> Result<ByteStream, FetchError> {
        let response = self.send_get(url).await?;
        let content_length = response.content_length();

        let url = url.to_string();
        let chunks = response
            .bytes_stream()
            .map(move |chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| map_reqwest_error(&url, &e))
            })
            .boxed();

        Ok(ByteStream {
            content_length,
            chunks,
        })
    }
}

/// Maps a reqwest error onto the transport error taxonomy.
fn map_reqwest_error(url: &str, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(url)
    } else if error.is_connect() {
        FetchError::unreachable(url, error.to_string())
    } else {
        FetchError::other(url, error.to_string())
    }
}
