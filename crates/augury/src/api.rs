//! HTTP client for the Augury IOC backend.
//!
//! Two endpoints: a free-text extraction POST covering every source, and a
//! single-source GET used by the detail view. Methods block; callers run
//! them on worker threads, never on the UI loop.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use augury_protocol::ResultPayload;
use tracing::debug;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Identity header forwarded with extraction queries. The backend logs the
/// caller as "unknown" when the header is absent.
pub const USER_NAME_HEADER: &str = "X-User-Name";

/// Port to the IOC backend.
pub trait Backend: Send + Sync {
    /// POST raw query text; the backend extracts indicators and looks each
    /// one up across all sources.
    fn extract(&self, query: &str, user_name: Option<&str>) -> Result<ResultPayload>;

    /// GET the records one source holds for one indicator.
    fn source_lookup(&self, source: &str, ioc: &str) -> Result<ResultPayload>;
}

pub struct BackendClient {
    base_url: String,
    timeout: Duration,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    // Built per call so the blocking client never outlives the worker
    // thread that owns the request.
    fn client(&self) -> Result<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client")
    }

    fn extract_url(&self) -> String {
        format!("{}/api/ioc/extract", self.base_url)
    }

    fn source_url(&self, source: &str, ioc: &str) -> String {
        format!(
            "{}/api/ioc/{}?ioc={}",
            self.base_url,
            source,
            urlencoding::encode(ioc)
        )
    }

    fn decode(response: reqwest::blocking::Response, url: &str) -> Result<ResultPayload> {
        let status = response.status();
        if !status.is_success() {
            bail!("Backend returned {status} for {url}");
        }
        response
            .json()
            .with_context(|| format!("Failed to decode response from {url}"))
    }
}

impl Backend for BackendClient {
    fn extract(&self, query: &str, user_name: Option<&str>) -> Result<ResultPayload> {
        let url = self.extract_url();
        debug!(%url, "extract query");
        let mut request = self
            .client()?
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(query.to_string());
        if let Some(user_name) = user_name {
            request = request.header(USER_NAME_HEADER, user_name);
        }
        let response = request
            .send()
            .with_context(|| format!("Request to {url} failed"))?;
        Self::decode(response, &url)
    }

    fn source_lookup(&self, source: &str, ioc: &str) -> Result<ResultPayload> {
        let url = self.source_url(source, ioc);
        debug!(%url, "source lookup");
        let response = self
            .client()?
            .get(&url)
            .send()
            .with_context(|| format!("Request to {url} failed"))?;
        Self::decode(response, &url)
    }
}
