//! Installed-version records that survive across runs.
//!
//! Each processed softpaq leaves a one-line `version.txt` marker under
//! `<install_root>/<id>/`. The marker lives outside the working directory so
//! it survives clean-ups and runs started from different directories.

use crate::softpaq_id::SoftpaqId;
use crate::version::PackageVersion;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;

const VERSION_FILENAME: &str = "version.txt";

/// The last version applied for a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstalledVersion {
    /// No record exists; compares lower than every available version.
    Never,
    /// The version written by a previous run.
    Applied(PackageVersion),
}

/// Whether a package needs processing this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDecision {
    /// The available version is newer than the stored one, or overwrite
    /// was requested.
    NeedsInstall,
    /// The stored version is at least the available one.
    AlreadyInstalled,
}

/// Decide whether `available` should be installed over `stored`.
///
/// `overwrite` treats the stored value as [`InstalledVersion::Never`]
/// regardless of its content.
///
/// # Examples
///
/// ```
/// use hpdrivers::version::PackageVersion;
/// use hpdrivers::version_store::{InstalledVersion, UpdateDecision, decide};
///
/// let available = PackageVersion::new("1.2.3.4");
/// let stored = InstalledVersion::Applied(PackageVersion::new("1.2.3.4"));
/// assert_eq!(decide(&available, &stored, false), UpdateDecision::AlreadyInstalled);
/// assert_eq!(decide(&available, &stored, true), UpdateDecision::NeedsInstall);
/// ```
#[must_use]
pub fn decide(
    available: &PackageVersion,
    stored: &InstalledVersion,
    overwrite: bool,
) -> UpdateDecision {
    if overwrite {
        return UpdateDecision::NeedsInstall;
    }
    match stored {
        InstalledVersion::Never => UpdateDecision::NeedsInstall,
        InstalledVersion::Applied(version) if available > version => UpdateDecision::NeedsInstall,
        InstalledVersion::Applied(_) => UpdateDecision::AlreadyInstalled,
    }
}

/// Persistent per-package version records.
#[cfg_attr(test, mockall::automock)]
pub trait VersionStore {
    /// Return the stored version for `id`, or [`InstalledVersion::Never`].
    ///
    /// # Errors
    ///
    /// Returns an I/O error if an existing record cannot be read.
    fn get(&self, id: &SoftpaqId) -> std::io::Result<InstalledVersion>;

    /// Overwrite the record for `id` unconditionally.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the record cannot be written.
    fn put(&self, id: &SoftpaqId, version: &PackageVersion) -> std::io::Result<()>;
}

/// Version store backed by `<root>/<id>/version.txt` files.
#[derive(Debug, Clone)]
pub struct FileVersionStore {
    root: Utf8PathBuf,
}

impl FileVersionStore {
    /// Create a store rooted at `root` (e.g. `C:\SWSetup`).
    #[must_use]
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    /// Directory holding the marker and extracted files for `id`.
    #[must_use]
    pub fn package_dir(&self, id: &SoftpaqId) -> Utf8PathBuf {
        self.root.join(id.as_str())
    }

    /// Path of the version marker for `id`.
    #[must_use]
    pub fn marker_path(&self, id: &SoftpaqId) -> Utf8PathBuf {
        self.package_dir(id).join(VERSION_FILENAME)
    }

    /// Store root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

impl VersionStore for FileVersionStore {
    fn get(&self, id: &SoftpaqId) -> std::io::Result<InstalledVersion> {
        let path = self.marker_path(id);
        if !path.exists() {
            return Ok(InstalledVersion::Never);
        }
        let content = fs::read_to_string(&path)?;
        let line = content.lines().next().map(str::trim).unwrap_or_default();
        if line.is_empty() {
            debug!("empty version marker at {path}; treating {id} as never installed");
            return Ok(InstalledVersion::Never);
        }
        Ok(InstalledVersion::Applied(PackageVersion::new(line)))
    }

    fn put(&self, id: &SoftpaqId, version: &PackageVersion) -> std::io::Result<()> {
        let dir = self.package_dir(id);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(VERSION_FILENAME), format!("{version}\n"))
    }
}
