//! Krisinformation.se feed source.
//!
//! Issues one GET per call against the news endpoint and parses the JSON
//! array it returns.  The request is bounded by a timeout: if no response
//! headers arrive in time the request future is dropped, which aborts the
//! connection, and the call fails with [`FetchError::Timeout`].  Reading the
//! body gets the same bound.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Url};
use tokio::time::timeout;
use tracing::debug;

use super::{FeedItem, FeedSource, FetchError};

/// Public news endpoint of the Swedish crisis-information service.
pub const DEFAULT_ENDPOINT: &str = "https://api.krisinformation.se/v3/news/";

/// Upper bound on waiting for response headers.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Query parameters always sent: skip test messages, include every county.
static FIXED_QUERY: [(&str, &str); 2] = [("includeTest", "0"), ("allCounties", "True")];

/// The Krisinformation news feed.
pub struct KrisinformationSource {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl KrisinformationSource {
    /// Create a source for `endpoint`, adding the fixed query parameters.
    ///
    /// # Arguments
    ///
    /// * `endpoint`: base URL of the news endpoint (normally
    ///   [`DEFAULT_ENDPOINT`]).
    /// * `timeout`: bound on waiting for response headers, and separately
    ///   on reading the body.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let url = Self::feed_url(endpoint)?;
        let client = Client::builder()
            .user_agent(concat!("krisinfo-tui/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    /// The full request URL, query parameters included.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Parse `endpoint` and add the fixed query parameters unless the caller
    /// already supplied them.
    pub fn feed_url(endpoint: &str) -> Result<Url> {
        let mut url =
            Url::parse(endpoint).with_context(|| format!("invalid feed endpoint: {endpoint}"))?;

        let missing: Vec<_> = FIXED_QUERY
            .iter()
            .filter(|(key, _)| !url.query_pairs().any(|(k, _)| k == *key))
            .collect();
        if !missing.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in missing {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Parse a response body into [`FeedItem`]s.
    ///
    /// This is a pure function (no I/O) so that tests can exercise the
    /// parsing logic without hitting the network.
    pub fn parse_feed(body: &[u8]) -> Result<Vec<FeedItem>, FetchError> {
        Ok(serde_json::from_slice(body)?)
    }
}

impl FeedSource for KrisinformationSource {
    fn name(&self) -> &str {
        "krisinformation"
    }

    async fn fetch(&self) -> Result<Vec<FeedItem>, FetchError> {
        debug!(url = %self.url, "requesting feed");

        let response = match timeout(self.timeout, self.client.get(self.url.clone()).send()).await {
            Ok(sent) => sent.map_err(|e| FetchError::from_transport(e, self.timeout))?,
            Err(_) => return Err(FetchError::Timeout(self.timeout)),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status));
        }

        let body = match timeout(self.timeout, response.bytes()).await {
            Ok(read) => read.map_err(|e| FetchError::from_transport(e, self.timeout))?,
            Err(_) => return Err(FetchError::Timeout(self.timeout)),
        };

        Self::parse_feed(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
