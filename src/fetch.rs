//! HTTP retrieval of passage lookup pages.
//!
//! The lookup source serves stripped-down markup to clients that do not look
//! like a browser, so every request carries a fixed browser header set.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use std::time::Duration;
use tracing::debug;

use crate::config::PassageConfig;
use crate::error::ResolveError;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "es-ES,es;q=0.8,en-US;q=0.5,en;q=0.3";

pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE),
    );
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}

/// Fetches raw lookup-page markup for a reference. Performs no retries.
#[derive(Debug, Clone)]
pub struct PassageFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl PassageFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .default_headers(browser_headers())
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &PassageConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// `<base_url><percent-encoded reference>&version=<version>`
    pub fn request_url(&self, reference: &str, version: &str) -> String {
        format!(
            "{}{}&version={}",
            self.base_url,
            urlencoding::encode(reference),
            urlencoding::encode(version)
        )
    }

    /// GET the lookup page. Transport failures and non-2xx statuses are
    /// fetch errors; a body that cannot be read or decoded is a resolution
    /// error. The body is returned untouched.
    pub async fn fetch(&self, reference: &str, version: &str) -> Result<String, ResolveError> {
        let url = self.request_url(reference, version);
        debug!(%url, "fetching passage page");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ResolveError::Fetch {
                reference: reference.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::FetchStatus {
                reference: reference.to_string(),
                status,
            });
        }

        response
            .text()
            .await
            .map_err(|source| ResolveError::Resolution {
                reference: reference.to_string(),
                source: Box::new(source),
            })
    }
}
