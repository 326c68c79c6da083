//! Structured error types for the pipeline.
//!
//! Every fetch failure names the endpoint it came from, so a failed day in
//! a range crawl reads as "which series broke" rather than a bare reqwest
//! error. These are designed to be displayable in both CLI and log-panel
//! contexts.

use crate::endpoints::Endpoint;
use thiserror::Error;

/// Failure of a single adapter call against the upstream service.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{}: network error: {source}", endpoint.name())]
    Network {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("{}: upstream returned HTTP {status}", endpoint.name())]
    Status {
        endpoint: Endpoint,
        status: reqwest::StatusCode,
    },

    #[error("{}: unexpected response shape: {detail}", endpoint.name())]
    Envelope {
        endpoint: Endpoint,
        detail: String,
    },
}

impl FetchError {
    /// The endpoint that produced this error.
    pub fn endpoint(&self) -> Endpoint {
        match self {
            FetchError::Network { endpoint, .. }
            | FetchError::Status { endpoint, .. }
            | FetchError::Envelope { endpoint, .. } => *endpoint,
        }
    }
}

/// Failure of the flat JSON registry store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("registry I/O error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("registry serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
