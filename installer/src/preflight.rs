//! Connectivity pre-flight check.
//!
//! Before resolving a catalog the installer confirms the catalog host
//! answers. An unreachable host aborts the run with a hint to use cached
//! catalogs; offline runs skip the probe entirely.

use crate::error::{InstallerError, Result};
use crate::http::{HttpClient, HttpError};
use log::{debug, info};

/// Trait for probing whether a host is reachable.
#[cfg_attr(test, mockall::automock)]
pub trait ConnectivityProbe {
    /// Probe `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be reached.
    fn probe(&self, url: &str) -> std::result::Result<(), HttpError>;
}

/// Probe issuing an HTTP `HEAD` through [`HttpClient`].
#[derive(Clone)]
pub struct HeadProbe {
    client: HttpClient,
}

impl HeadProbe {
    /// Create a probe using `client`.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

impl ConnectivityProbe for HeadProbe {
    fn probe(&self, url: &str) -> std::result::Result<(), HttpError> {
        match self.client.head(url) {
            // The host answered; a missing root document still proves
            // connectivity.
            Ok(()) | Err(HttpError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Fail with [`InstallerError::NetworkUnavailable`] unless `host` answers.
///
/// Does nothing when `offline` is set.
///
/// # Errors
///
/// Returns [`InstallerError::NetworkUnavailable`] when the probe fails.
pub fn check_connectivity(probe: &dyn ConnectivityProbe, host: &str, offline: bool) -> Result<()> {
    if offline {
        info!("offline mode: skipping connectivity check");
        return Ok(());
    }
    let url = format!("https://{host}/");
    debug!("probing {url}");
    probe
        .probe(&url)
        .map_err(|e| InstallerError::NetworkUnavailable {
            host: host.to_owned(),
            reason: e.to_string(),
        })
}
