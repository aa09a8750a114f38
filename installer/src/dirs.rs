//! Directory resolution abstraction for platform-specific paths.
//!
//! Wraps `directories-next` behind a trait so settings discovery and the
//! default install root can be tested without touching the real profile.

use directories_next::ProjectDirs;
use std::path::PathBuf;

/// Platform directories used by the installer.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// Directory searched for `hpdrivers.toml`.
    fn config_dir(&self) -> Option<PathBuf>;

    /// Per-user data directory; hosts the install root off Windows.
    fn data_dir(&self) -> Option<PathBuf>;
}

/// [`BaseDirs`] backed by the operating system's conventions.
#[derive(Debug, Clone)]
pub struct SystemBaseDirs {
    project: ProjectDirs,
}

impl SystemBaseDirs {
    /// Resolve directories for the current user.
    ///
    /// Returns `None` when no home directory can be determined.
    #[must_use]
    pub fn new() -> Option<Self> {
        ProjectDirs::from("com", "hp-drivers", "hpdrivers").map(|project| Self { project })
    }
}

impl BaseDirs for SystemBaseDirs {
    fn config_dir(&self) -> Option<PathBuf> {
        Some(self.project.config_dir().to_path_buf())
    }

    fn data_dir(&self) -> Option<PathBuf> {
        Some(self.project.data_dir().to_path_buf())
    }
}
