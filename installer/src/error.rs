//! Error types for run-level installer failures.
//!
//! These errors abort the whole run: the catalog host is unreachable, no
//! catalog exists for the platform, or the catalog cannot be parsed.
//! Package-scoped failures live in [`crate::download::DownloadError`] and
//! [`crate::install::InstallError`] and never escape the pipeline.

use crate::platform::FeatureVersion;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that abort an installer run.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The catalog host could not be reached during pre-flight.
    #[error("catalog host {host} is unreachable: {reason}; rerun with --offline to use cached catalogs")]
    NetworkUnavailable {
        /// Host that was probed.
        host: String,
        /// Description of the connectivity failure.
        reason: String,
    },

    /// No catalog exists for the requested platform and feature version.
    #[error("no catalog found for platform {platform} feature version {feature_version}")]
    CatalogNotFound {
        /// Platform board identifier.
        platform: String,
        /// Feature version that was looked up.
        feature_version: FeatureVersion,
    },

    /// Fallback search exhausted every feature version down to the floor.
    #[error("no drivers available for platform {platform} (searched {searched} feature versions)")]
    NoDriversAvailable {
        /// Platform board identifier.
        platform: String,
        /// Number of feature versions attempted.
        searched: usize,
    },

    /// The catalog document is structurally invalid.
    #[error("malformed catalog: {reason}")]
    MalformedCatalog {
        /// Description of what is missing or invalid.
        reason: String,
    },

    /// Platform identity could not be determined from the environment.
    #[error("platform detection failed: {reason}; pass --platform, --os-type and --feature-version")]
    PlatformDetection {
        /// Description of why detection failed.
        reason: String,
    },

    /// A feature version tag is not of the form `YYHn`.
    #[error("invalid feature version \"{value}\": expected YYH1 or YYH2")]
    InvalidFeatureVersion {
        /// The rejected tag.
        value: String,
    },

    /// The settings file could not be read or parsed.
    #[error("invalid settings file {path}: {reason}")]
    InvalidSettings {
        /// Path to the settings file.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },

    /// A required directory could not be determined for this user.
    #[error("could not determine {purpose} directory")]
    MissingDirectory {
        /// What the directory is used for.
        purpose: &'static str,
    },

    /// Package selection was aborted or unreadable.
    #[error("package selection failed: {reason}")]
    Selection {
        /// Description of the selection failure.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
