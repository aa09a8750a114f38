//! Run settings layered from defaults, a TOML file and the command line.
//!
//! The settings file is `--config <FILE>`, else `$HPDRIVERS_CONFIG`, else
//! `hpdrivers.toml` in the user's configuration directory when it exists.
//! Command-line values override file values, which override defaults.
//!
//! ```toml
//! catalog_host = "hpia.hpcloud.hp.com"
//! work_dir = 'D:\Deploy'
//! install_root = 'C:\SWSetup'
//! http_timeout_secs = 120
//! ```

use crate::catalog::source::DEFAULT_CATALOG_HOST;
use crate::dirs::BaseDirs;
use crate::error::{InstallerError, Result};
use crate::http::DEFAULT_TIMEOUT;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Name of the settings file looked up in the configuration directory.
pub const SETTINGS_FILENAME: &str = "hpdrivers.toml";

/// Environment variable naming an explicit settings file.
pub const SETTINGS_ENV: &str = "HPDRIVERS_CONFIG";

/// Name of the cache directory created inside the working directory.
pub const CACHE_DIRNAME: &str = "HPDrivers";

/// Values read from the settings file; every key is optional.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    /// Host serving platform catalogs.
    pub catalog_host: Option<String>,
    /// Directory that holds the `HPDrivers` cache.
    pub work_dir: Option<Utf8PathBuf>,
    /// Root of per-package directories and version markers.
    pub install_root: Option<Utf8PathBuf>,
    /// Per-request network timeout.
    pub http_timeout_secs: Option<u64>,
}

impl SettingsFile {
    /// Parse settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidSettings`] if the text is not valid
    /// TOML or contains unknown keys.
    pub fn parse(path: &Utf8Path, text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| InstallerError::InvalidSettings {
            path: path.to_owned(),
            reason: e.to_string(),
        })
    }
}

/// Command-line values that take precedence over the settings file.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SettingsOverrides {
    /// Explicit settings file.
    pub config: Option<Utf8PathBuf>,
    /// Catalog host override.
    pub catalog_host: Option<String>,
    /// Working directory override.
    pub work_dir: Option<Utf8PathBuf>,
    /// Install root override.
    pub install_root: Option<Utf8PathBuf>,
    /// Timeout override in seconds.
    pub http_timeout_secs: Option<u64>,
}

/// Fully resolved settings for a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Host serving platform catalogs.
    pub catalog_host: String,
    /// Directory that holds the `HPDrivers` cache.
    pub work_dir: Utf8PathBuf,
    /// Root of per-package directories and version markers.
    pub install_root: Utf8PathBuf,
    /// Per-request network timeout.
    pub http_timeout: Duration,
}

impl Settings {
    /// Cache directory for catalogs, binaries and run logs.
    #[must_use]
    pub fn cache_dir(&self) -> Utf8PathBuf {
        self.work_dir.join(CACHE_DIRNAME)
    }
}

/// Resolve settings for this run.
///
/// # Errors
///
/// Returns [`InstallerError::InvalidSettings`] if an explicit settings file
/// is missing or any settings file is invalid, and
/// [`InstallerError::MissingDirectory`] if no working directory or install
/// root can be determined.
pub fn load_settings(overrides: &SettingsOverrides, dirs: &dyn BaseDirs) -> Result<Settings> {
    let file = match settings_path(overrides, dirs) {
        Some(path) => read_settings_file(&path)?,
        None => SettingsFile::default(),
    };

    let catalog_host = overrides
        .catalog_host
        .clone()
        .or(file.catalog_host)
        .unwrap_or_else(|| DEFAULT_CATALOG_HOST.to_owned());
    let work_dir = match overrides.work_dir.clone().or(file.work_dir) {
        Some(dir) => dir,
        None => current_dir()?,
    };
    let install_root = match overrides.install_root.clone().or(file.install_root) {
        Some(root) => root,
        None => default_install_root(dirs)?,
    };
    let http_timeout = overrides
        .http_timeout_secs
        .or(file.http_timeout_secs)
        .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

    Ok(Settings {
        catalog_host,
        work_dir,
        install_root,
        http_timeout,
    })
}

fn settings_path(overrides: &SettingsOverrides, dirs: &dyn BaseDirs) -> Option<Utf8PathBuf> {
    if let Some(explicit) = &overrides.config {
        return Some(explicit.clone());
    }
    if let Some(from_env) = std::env::var_os(SETTINGS_ENV).filter(|v| !v.is_empty()) {
        return utf8(PathBuf::from(from_env));
    }
    let candidate = utf8(dirs.config_dir()?)?.join(SETTINGS_FILENAME);
    candidate.is_file().then_some(candidate)
}

fn read_settings_file(path: &Utf8Path) -> Result<SettingsFile> {
    debug!("reading settings from {path}");
    let text = std::fs::read_to_string(path).map_err(|e| InstallerError::InvalidSettings {
        path: path.to_owned(),
        reason: e.to_string(),
    })?;
    SettingsFile::parse(path, &text)
}

fn current_dir() -> Result<Utf8PathBuf> {
    std::env::current_dir()
        .ok()
        .and_then(utf8)
        .ok_or(InstallerError::MissingDirectory {
            purpose: "working",
        })
}

#[cfg(windows)]
fn default_install_root(_dirs: &dyn BaseDirs) -> Result<Utf8PathBuf> {
    Ok(Utf8PathBuf::from(r"C:\SWSetup"))
}

#[cfg(not(windows))]
fn default_install_root(dirs: &dyn BaseDirs) -> Result<Utf8PathBuf> {
    dirs.data_dir()
        .and_then(utf8)
        .map(|dir| dir.join("SWSetup"))
        .ok_or(InstallerError::MissingDirectory {
            purpose: "install root",
        })
}

fn utf8(path: PathBuf) -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).ok()
}
