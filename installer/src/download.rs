//! Package binary acquisition with bounded retries and checksum checks.
//!
//! A softpaq binary is fetched into the cache directory with at most
//! [`RetryPolicy::max_attempts`] attempts. Each attempt streams into a fresh
//! temporary file beside the destination and is persisted only once the
//! transfer completes, so an interrupted attempt never leaves a truncated
//! binary behind. A destination that already exists is reused as-is.

use crate::catalog::Sha256Digest;
use crate::http::{HttpClient, HttpError};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use std::fmt;
use std::fs::File;
use tempfile::NamedTempFile;

/// Attempts made per package before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Trait for transferring a package body into an open file.
///
/// Abstractions allow tests to simulate flaky transfers without network
/// access.
#[cfg_attr(test, mockall::automock)]
pub trait PackageTransport {
    /// Write the body at `url` into `file`, returning the byte count.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the write fails.
    fn download(&self, url: &str, file: &mut File) -> Result<u64, HttpError>;
}

/// Package transport backed by [`HttpClient`].
#[derive(Clone)]
pub struct HttpTransport {
    client: HttpClient,
}

impl HttpTransport {
    /// Create a transport using `client`.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

impl PackageTransport for HttpTransport {
    fn download(&self, url: &str, file: &mut File) -> Result<u64, HttpError> {
        self.client.download_into(url, file)
    }
}

/// Errors arising from package acquisition.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Every attempt failed and the destination still does not exist.
    #[error("download of {url} failed after {attempts} attempts")]
    Exhausted {
        /// The package URL.
        url: String,
        /// Attempts made.
        attempts: u32,
    },

    /// The downloaded file does not match the catalog digest.
    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The rejected file, already removed.
        path: Utf8PathBuf,
        /// Digest from the catalog.
        expected: Sha256Digest,
        /// Digest of the file on disk.
        actual: Sha256Digest,
    },

    /// Hashing or removing the destination failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The result of one transfer attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The file was transferred and persisted.
    Success,
    /// The attempt failed; another may be made.
    TransientFailure(String),
}

/// How many attempts a download may make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound on transfer attempts per package.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Whether another attempt is allowed after `attempts_made`.
    #[must_use]
    pub fn allows(self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// What to do when a file's digest differs from the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChecksumPolicy {
    /// Keep the file and warn.
    #[default]
    AcceptExisting,
    /// Delete the file and fail the package.
    Strict,
}

impl fmt::Display for ChecksumPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcceptExisting => write!(f, "accept mismatches with a warning"),
            Self::Strict => write!(f, "reject mismatches"),
        }
    }
}

/// Outcome of the digest comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumStatus {
    /// Digest matched the catalog.
    Verified,
    /// The catalog carries no digest for this package.
    Unverified,
    /// Digest differed and the policy accepted the file anyway.
    Mismatch {
        /// Digest from the catalog.
        expected: Sha256Digest,
        /// Digest of the file on disk.
        actual: Sha256Digest,
    },
}

/// Summary of a completed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    /// Where the binary now lives.
    pub path: Utf8PathBuf,
    /// Transfer attempts made; zero when an existing file was reused.
    pub attempts: u32,
    /// Whether the file was already present before fetching.
    pub reused: bool,
    /// Result of the digest comparison.
    pub checksum: ChecksumStatus,
}

/// Fetches package binaries.
pub struct Downloader<'a> {
    transport: &'a dyn PackageTransport,
    retry: RetryPolicy,
    checksum: ChecksumPolicy,
}

impl<'a> Downloader<'a> {
    /// Create a downloader with the default retry and checksum policies.
    #[must_use]
    pub fn new(transport: &'a dyn PackageTransport) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
            checksum: ChecksumPolicy::default(),
        }
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the checksum policy.
    #[must_use]
    pub fn with_checksum_policy(mut self, checksum: ChecksumPolicy) -> Self {
        self.checksum = checksum;
        self
    }

    /// Ensure `destination` holds the body of `url`, then check its digest.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Exhausted`] when no attempt produced the
    /// file, and [`DownloadError::ChecksumMismatch`] under
    /// [`ChecksumPolicy::Strict`] when the digest differs.
    pub fn fetch(
        &self,
        url: &str,
        destination: &Utf8Path,
        expected: Option<&Sha256Digest>,
    ) -> Result<FetchReport, DownloadError> {
        let reused = destination.exists();
        if reused {
            info!("reusing existing download {destination}");
        }

        let mut attempts = 0;
        while !destination.exists() && self.retry.allows(attempts) {
            attempts += 1;
            debug!("download attempt {attempts}/{} for {url}", self.retry.max_attempts);
            match self.attempt(url, destination) {
                AttemptOutcome::Success => info!("downloaded {url} to {destination}"),
                AttemptOutcome::TransientFailure(reason) => {
                    warn!("attempt {attempts} for {url} failed: {reason}");
                }
            }
        }

        if !destination.exists() {
            return Err(DownloadError::Exhausted {
                url: url.to_owned(),
                attempts,
            });
        }

        let checksum = self.verify(destination, expected)?;
        Ok(FetchReport {
            path: destination.to_owned(),
            attempts,
            reused,
            checksum,
        })
    }

    fn attempt(&self, url: &str, destination: &Utf8Path) -> AttemptOutcome {
        let dir = destination.parent().unwrap_or(Utf8Path::new("."));
        if let Err(e) = std::fs::create_dir_all(dir) {
            return AttemptOutcome::TransientFailure(e.to_string());
        }
        let mut partial = match NamedTempFile::new_in(dir) {
            Ok(file) => file,
            Err(e) => return AttemptOutcome::TransientFailure(e.to_string()),
        };
        // Dropping `partial` on failure removes the incomplete transfer.
        if let Err(e) = self.transport.download(url, partial.as_file_mut()) {
            return AttemptOutcome::TransientFailure(e.to_string());
        }
        match partial.persist(destination) {
            Ok(_) => AttemptOutcome::Success,
            Err(e) => AttemptOutcome::TransientFailure(e.error.to_string()),
        }
    }

    fn verify(
        &self,
        path: &Utf8Path,
        expected: Option<&Sha256Digest>,
    ) -> Result<ChecksumStatus, DownloadError> {
        let Some(expected) = expected else {
            debug!("no digest in catalog for {path}; skipping verification");
            return Ok(ChecksumStatus::Unverified);
        };
        let actual = Sha256Digest::of_file(path.as_std_path())?;
        if &actual == expected {
            return Ok(ChecksumStatus::Verified);
        }
        match self.checksum {
            ChecksumPolicy::AcceptExisting => {
                warn!("checksum mismatch for {path}: expected {expected}, got {actual}; keeping file");
                Ok(ChecksumStatus::Mismatch {
                    expected: expected.clone(),
                    actual,
                })
            }
            ChecksumPolicy::Strict => {
                std::fs::remove_file(path)?;
                Err(DownloadError::ChecksumMismatch {
                    path: path.to_owned(),
                    expected: expected.clone(),
                    actual,
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "download_tests.rs"]
mod tests;
