//! Per-package acquisition and installation pipeline.
//!
//! Packages are processed strictly one at a time in catalog order. For each
//! one the pipeline consults the version store, downloads the binary into
//! the cache, runs the silent installer and records the available version.
//! Package-scoped failures are logged and reported as
//! [`PackageOutcome::Failed`]; they never stop the run.

use crate::catalog::PackageRecord;
use crate::download::{ChecksumStatus, Downloader};
use crate::install::Installer;
use crate::output::write_stderr_line;
use crate::run_log::RunLog;
use crate::version_store::{InstalledVersion, UpdateDecision, VersionStore, decide};
use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};
use serde::Serialize;
use std::fmt;
use std::io::Write;

/// Everything the downloader and installer need to know about one package.
#[derive(Debug, Clone)]
pub struct PackageContext<'a> {
    /// The catalog entry being processed.
    pub record: &'a PackageRecord,
    /// Cache location of the downloaded softpaq.
    pub binary: Utf8PathBuf,
    /// Extraction target and version-marker directory.
    pub package_dir: Utf8PathBuf,
}

impl<'a> PackageContext<'a> {
    /// Build the context for `record` from the run's directories.
    #[must_use]
    pub fn new(record: &'a PackageRecord, cache_dir: &Utf8Path, install_root: &Utf8Path) -> Self {
        Self {
            record,
            binary: cache_dir.join(record.id.binary_filename()),
            package_dir: install_root.join(record.id.as_str()),
        }
    }
}

/// Behaviour switches for a pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Install even when the stored version is current.
    pub overwrite: bool,
    /// Stop after downloading; do not install or record versions.
    pub download_only: bool,
    /// Suppress progress output.
    pub quiet: bool,
}

/// Terminal state of a processed package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PackageOutcome {
    /// The installer ran to completion.
    Installed,
    /// The stored version is already current.
    AlreadyInstalled,
    /// Downloaded only, as requested.
    Downloaded,
    /// Download or launch failed.
    Failed,
}

impl fmt::Display for PackageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Installed => "Installed",
            Self::AlreadyInstalled => "Already installed",
            Self::Downloaded => "Downloaded",
            Self::Failed => "Failed",
        };
        f.write_str(label)
    }
}

/// Result of processing one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageReport {
    /// Softpaq id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Version offered by the catalog.
    pub version: String,
    /// Terminal state.
    pub outcome: PackageOutcome,
    /// Failure reason or warning worth surfacing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Installer exit code, when one ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

/// Directories a pipeline reads from and writes to.
#[derive(Debug, Clone, Copy)]
pub struct PipelinePaths<'a> {
    /// Download cache (`<workdir>/HPDrivers`).
    pub cache_dir: &'a Utf8Path,
    /// Root of per-package directories (`C:\SWSetup` on Windows).
    pub install_root: &'a Utf8Path,
}

/// Sequential package processor.
pub struct Pipeline<'a> {
    store: &'a dyn VersionStore,
    downloader: &'a Downloader<'a>,
    installer: &'a Installer<'a>,
    run_log: &'a RunLog,
    paths: PipelinePaths<'a>,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    /// Assemble a pipeline from its collaborators.
    #[must_use]
    pub fn new(
        store: &'a dyn VersionStore,
        downloader: &'a Downloader<'a>,
        installer: &'a Installer<'a>,
        run_log: &'a RunLog,
        paths: PipelinePaths<'a>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            store,
            downloader,
            installer,
            run_log,
            paths,
            options,
        }
    }

    /// Process `records` in order and report on each one.
    ///
    /// Prints progress to stderr if not in quiet mode.
    pub fn run(&self, records: &[&PackageRecord], stderr: &mut dyn Write) -> Vec<PackageReport> {
        let total = records.len();
        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                if !self.options.quiet {
                    write_stderr_line(
                        stderr,
                        format!(
                            "[{}/{total}] {} {} ({})",
                            index + 1,
                            record.id,
                            record.name,
                            record.version
                        ),
                    );
                }
                let report = self.process(record);
                if !self.options.quiet {
                    let suffix = report
                        .detail
                        .as_deref()
                        .map(|d| format!(": {d}"))
                        .unwrap_or_default();
                    write_stderr_line(stderr, format!("    {}{suffix}", report.outcome));
                }
                report
            })
            .collect()
    }

    /// Process a single package through its state machine.
    pub fn process(&self, record: &PackageRecord) -> PackageReport {
        let context = PackageContext::new(record, self.paths.cache_dir, self.paths.install_root);
        let stored = self.store.get(&record.id).unwrap_or_else(|e| {
            warn!("could not read stored version for {}: {e}", record.id);
            InstalledVersion::Never
        });

        let mut report = PackageReport {
            id: record.id.to_string(),
            name: record.name.clone(),
            version: record.version.to_string(),
            outcome: PackageOutcome::AlreadyInstalled,
            detail: None,
            exit_code: None,
        };

        if decide(&record.version, &stored, self.options.overwrite)
            == UpdateDecision::NeedsInstall
        {
            self.acquire(&context, &mut report);
        } else {
            info!("{} {} is already installed", record.id, record.version);
        }

        if !self.options.download_only {
            if let Err(e) = self.store.put(&record.id, &record.version) {
                warn!("could not record version for {}: {e}", record.id);
            }
        }
        self.run_log.package(
            &report.id,
            &report.outcome.to_string(),
            &report.version,
            &report.name,
        );
        if let (PackageOutcome::Failed, Some(detail)) = (report.outcome, &report.detail) {
            self.run_log.error(&report.id, detail);
        }
        report
    }

    fn acquire(&self, context: &PackageContext<'_>, report: &mut PackageReport) {
        let record = context.record;
        let fetched = match self
            .downloader
            .fetch(&record.url, &context.binary, record.sha256.as_ref())
        {
            Ok(fetched) => fetched,
            Err(e) => {
                report.outcome = PackageOutcome::Failed;
                report.detail = Some(e.to_string());
                return;
            }
        };
        if let ChecksumStatus::Mismatch { expected, actual } = &fetched.checksum {
            report.detail = Some(format!("checksum mismatch (expected {expected}, got {actual})"));
        }

        if self.options.download_only {
            report.outcome = PackageOutcome::Downloaded;
            return;
        }

        match self.installer.install(context, &fetched.path) {
            Ok(installed) => {
                report.outcome = PackageOutcome::Installed;
                report.exit_code = installed.exit_code;
            }
            Err(e) => {
                report.outcome = PackageOutcome::Failed;
                report.detail = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
