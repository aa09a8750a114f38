//! CLI argument definitions for the HP driver installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::catalog::filter::FilterOptions;
use crate::config::SettingsOverrides;
use crate::download::ChecksumPolicy;
use crate::pipeline::PipelineOptions;
use crate::platform::{FeatureVersion, OsType, PlatformOverrides};
use camino::Utf8PathBuf;
use clap::Parser;

/// Install HP drivers and softpaqs for this machine.
#[derive(Parser, Debug, Clone)]
#[command(name = "hpdrivers")]
#[command(version, about)]
#[command(long_about = concat!(
    "Install HP drivers and softpaqs for this machine.\n\n",
    "The installer identifies the board and Windows release, downloads the ",
    "matching HP catalog (falling back to older feature releases when the ",
    "current one has none), and silently installs every selected package ",
    "that is newer than the version recorded by a previous run.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Pick packages interactively:\n",
    "    > hpdrivers\n\n",
    "  Install every driver and BIOS update without prompting:\n",
    "    > hpdrivers --select-all --bios\n\n",
    "  Pin the catalog to a feature release:\n",
    "    > hpdrivers --os-version 22H2\n\n",
    "  Fetch binaries for later, using only cached catalogs:\n",
    "    > hpdrivers --download-only --offline",
))]
pub struct Cli {
    /// Process every matching package without prompting.
    #[arg(short = 'a', long)]
    pub select_all: bool,

    /// Use exactly this feature release's catalog (e.g. 22H2); disables fallback.
    #[arg(long, value_name = "YYHn")]
    pub os_version: Option<FeatureVersion>,

    /// Include diagnostics, utilities, docks, software, firmware and manageability packages.
    #[arg(short = 's', long)]
    pub show_software: bool,

    /// Include BIOS updates.
    #[arg(short, long)]
    pub bios: bool,

    /// Reinstall packages even when the recorded version is current.
    #[arg(short, long)]
    pub overwrite: bool,

    /// Download binaries but do not install them.
    #[arg(short, long)]
    pub download_only: bool,

    /// Use cached catalogs only; skip the connectivity check.
    #[arg(long)]
    pub offline: bool,

    /// Delete binaries whose SHA-256 differs from the catalog and fail the package.
    #[arg(long)]
    pub strict_checksum: bool,

    /// Remove downloaded binaries once the run completes.
    #[arg(long)]
    pub delete_installation_files: bool,

    /// Suspend BitLocker before firmware updates (not supported by this build).
    #[arg(long)]
    pub suspend_bitlocker: bool,

    /// Board id to use instead of probing (e.g. 8A78).
    #[arg(long, value_name = "ID")]
    pub platform: Option<String>,

    /// Windows major version to use instead of probing (10 or 11).
    #[arg(long, value_name = "10|11")]
    pub os_type: Option<OsType>,

    /// Installed feature release to start the catalog search from.
    #[arg(long, value_name = "YYHn")]
    pub feature_version: Option<FeatureVersion>,

    /// Settings file [default: hpdrivers.toml in the config directory].
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Catalog host [default: hpia.hpcloud.hp.com].
    #[arg(long, value_name = "HOST")]
    pub catalog_host: Option<String>,

    /// Directory that holds the HPDrivers cache [default: current directory].
    #[arg(short, long, value_name = "DIR")]
    pub work_dir: Option<Utf8PathBuf>,

    /// Root of per-package directories and version markers.
    #[arg(long, value_name = "DIR")]
    pub install_root: Option<Utf8PathBuf>,

    /// Network timeout per request, in seconds.
    #[arg(long, value_name = "SECS")]
    pub http_timeout: Option<u64>,

    /// Print a JSON summary to stdout.
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Category groups to include.
    #[must_use]
    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            show_software: self.show_software,
            bios: self.bios,
        }
    }

    /// Per-package pipeline switches.
    #[must_use]
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            overwrite: self.overwrite,
            download_only: self.download_only,
            quiet: self.quiet,
        }
    }

    /// How to treat digest mismatches.
    #[must_use]
    pub fn checksum_policy(&self) -> ChecksumPolicy {
        if self.strict_checksum {
            ChecksumPolicy::Strict
        } else {
            ChecksumPolicy::AcceptExisting
        }
    }

    /// Values that replace platform probing.
    #[must_use]
    pub fn platform_overrides(&self) -> PlatformOverrides {
        PlatformOverrides {
            platform: self.platform.clone(),
            os_type: self.os_type,
            feature_version: self.feature_version,
        }
    }

    /// Values that replace settings-file entries.
    #[must_use]
    pub fn settings_overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            config: self.config.clone(),
            catalog_host: self.catalog_host.clone(),
            work_dir: self.work_dir.clone(),
            install_root: self.install_root.clone(),
            http_timeout_secs: self.http_timeout,
        }
    }

    /// Log level implied by `-v` and `--quiet`.
    #[must_use]
    pub fn log_level(&self) -> log::LevelFilter {
        match (self.quiet, self.verbosity) {
            (true, _) => log::LevelFilter::Error,
            (false, 0) => log::LevelFilter::Warn,
            (false, 1) => log::LevelFilter::Info,
            (false, 2) => log::LevelFilter::Debug,
            (false, _) => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
