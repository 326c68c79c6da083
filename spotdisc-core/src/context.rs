//! Crawl context — the explicit replacement for process-global state.
//!
//! The session cookie and the installed thermal capacity are snapshotted
//! into a `CrawlContext` when a crawl starts. In-flight crawls keep their
//! snapshot; changing either value means building a new context.

use crate::endpoints::Endpoint;
use crate::error::FetchError;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/130.0.0.0 Safari/537.36";

/// Installed thermal capacity default (MW), used by the load-factor column.
pub const DEFAULT_INSTALLED_THERMAL_MW: f64 = 17_170.0;

/// Shared state for one crawl: HTTP client, session credential, and the
/// installed thermal capacity configuration value.
///
/// The upstream authenticates via a `CAMSID` session cookie pasted by the
/// user. There is no expiry tracking — an expired cookie surfaces as a
/// downstream fetch failure.
pub struct CrawlContext {
    client: reqwest::blocking::Client,
    cookie: String,
    installed_thermal_mw: f64,
}

impl CrawlContext {
    pub fn new(cookie: impl Into<String>, installed_thermal_mw: f64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            cookie: cookie.into(),
            installed_thermal_mw,
        }
    }

    pub fn installed_thermal_mw(&self) -> f64 {
        self.installed_thermal_mw
    }

    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    /// POST a JSON body to an endpoint with the session cookie attached.
    /// Returns the response if the transport succeeded and the status was
    /// 2xx; everything else is a `FetchError` naming the endpoint.
    pub(crate) fn post_json(
        &self,
        endpoint: Endpoint,
        body: &serde_json::Value,
    ) -> Result<reqwest::blocking::Response, FetchError> {
        let resp = self
            .client
            .post(endpoint.url())
            .header("cookie", &self.cookie)
            .json(body)
            .send()
            .map_err(|source| FetchError::Network { endpoint, source })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { endpoint, status });
        }
        Ok(resp)
    }
}

impl std::fmt::Debug for CrawlContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the credential.
        f.debug_struct("CrawlContext")
            .field("cookie", &"<redacted>")
            .field("installed_thermal_mw", &self.installed_thermal_mw)
            .finish()
    }
}
