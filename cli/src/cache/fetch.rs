use std::future::Future;

use thiserror::Error;

/// Transport-level failure (offline, DNS, connection reset). HTTP error
/// statuses are not errors here; they come back as a [`FetchedBody`] with
/// that status.
#[derive(Debug, Error)]
#[error("network error: {message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// A fetched response body plus the metadata the cache keeps.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedBody {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network seam for the cache controller; tests substitute a mock that
/// counts calls.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedBody, FetchError>> + Send;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// No timeouts on purpose: a hung request is left to the transport's
    /// own failure detection.
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(format!("juicy-cli/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedBody, FetchError>> + Send {
        let request = self.client.get(url);
        async move {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let url = response.url().to_string();
            let body = response.bytes().await?.to_vec();
            Ok(FetchedBody {
                url,
                status,
                content_type,
                body,
            })
        }
    }
}
