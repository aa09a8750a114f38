//! Shared HTTP client for catalog and package transfers.
//!
//! Wraps a `ureq` agent configured with the run's request timeout. Probes and
//! catalog fetches bound the whole call; package transfers bound only the
//! connect and response-header phases so a large body can stream for as long
//! as it keeps arriving. Status codes of 400 and above surface as errors; 404
//! is distinguished so callers can tell a missing catalog from a network
//! fault.

use std::io::Write;
use std::time::Duration;

/// Default network timeout for a single request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors arising from HTTP transfers.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The server answered 404.
    #[error("not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The request or transfer failed.
    #[error("request to {url} failed: {reason}")]
    Transfer {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// Writing the response body failed.
    #[error("I/O error writing response: {0}")]
    Io(#[from] std::io::Error),
}

/// Blocking HTTP client.
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
}

impl HttpClient {
    /// Create a client whose requests, body included, time out after
    /// `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }

    /// Create a client for package bodies.
    ///
    /// Connecting and receiving the response headers each time out after
    /// `timeout`; reading the body has no deadline.
    #[must_use]
    pub fn for_transfers(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(timeout))
            .timeout_recv_response(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }

    /// Fetch `url` and return the whole body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the request fails or the body cannot be read.
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let mut body = Vec::new();
        self.download_into(url, &mut body)?;
        Ok(body)
    }

    /// Stream the body of `url` into `sink`, returning the byte count.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the request fails or the write fails.
    pub fn download_into(&self, url: &str, sink: &mut dyn Write) -> Result<u64, HttpError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut reader = response.into_body().into_reader();
        std::io::copy(&mut reader, sink).map_err(|e| HttpError::Transfer {
            url: url.to_owned(),
            reason: e.to_string(),
        })
    }

    /// Issue a HEAD request to check reachability.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the host cannot be reached or answers with
    /// an error status.
    pub fn head(&self, url: &str) -> Result<(), HttpError> {
        self.agent
            .head(url)
            .call()
            .map(drop)
            .map_err(|e| map_ureq_error(url, &e))
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

/// Map a ureq error to an [`HttpError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> HttpError {
    match err {
        ureq::Error::StatusCode(404) => HttpError::NotFound {
            url: url.to_owned(),
        },
        other => HttpError::Transfer {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
