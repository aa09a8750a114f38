//! Whole-run orchestration.
//!
//! A run checks connectivity, identifies the platform, resolves and filters
//! the catalog, asks the selector which packages to process and feeds them
//! through the [`Pipeline`]. Every external effect goes through the
//! [`Collaborators`] so the flow can be exercised end to end in tests.

use crate::catalog::filter::{FilterOptions, filter_records};
use crate::catalog::source::CatalogSource;
use crate::catalog::{CatalogResolver, PackageRecord};
use crate::command::CommandExecutor;
use crate::config::Settings;
use crate::download::{ChecksumPolicy, Downloader, PackageTransport};
use crate::error::Result;
use crate::install::{Installer, ProcessLauncher};
use crate::output::write_stderr_line;
use crate::pipeline::{PackageOutcome, PackageReport, Pipeline, PipelineOptions, PipelinePaths};
use crate::platform::{DetectedPlatform, FeatureVersion, PlatformOverrides, detect_platform};
use crate::preflight::{ConnectivityProbe, check_connectivity};
use crate::run_log::RunLog;
use crate::selector::Selector;
use crate::version_store::FileVersionStore;
use camino::Utf8Path;
use log::{info, warn};
use std::io::Write;

/// What the user asked this run to do.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Resolved settings.
    pub settings: Settings,
    /// Values that replace platform probing.
    pub platform_overrides: PlatformOverrides,
    /// Catalog feature version to use without fallback.
    pub explicit_feature_version: Option<FeatureVersion>,
    /// Category groups to include.
    pub filter: FilterOptions,
    /// Per-package switches.
    pub pipeline: PipelineOptions,
    /// Digest mismatch handling.
    pub checksum: ChecksumPolicy,
    /// Use cached catalogs only.
    pub offline: bool,
    /// Remove downloaded binaries after processing.
    pub delete_installation_files: bool,
}

/// Effectful services a run depends on.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Runs platform probes.
    pub executor: &'a dyn CommandExecutor,
    /// Checks the catalog host is reachable.
    pub probe: &'a dyn ConnectivityProbe,
    /// Downloads catalog archives.
    pub catalog_source: &'a dyn CatalogSource,
    /// Downloads package binaries.
    pub transport: &'a dyn PackageTransport,
    /// Starts installers.
    pub launcher: &'a dyn ProcessLauncher,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The platform the catalog was resolved for.
    pub detected: DetectedPlatform,
    /// Feature version of the catalog that was used.
    pub catalog_feature_version: FeatureVersion,
    /// Older feature versions tried before a catalog was found.
    pub fallback_steps: usize,
    /// One report per processed package, in catalog order.
    pub reports: Vec<PackageReport>,
}

impl RunOutcome {
    /// Whether any package failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.reports
            .iter()
            .any(|r| r.outcome == PackageOutcome::Failed)
    }
}

/// Execute a run.
///
/// # Errors
///
/// Returns run-level failures: an unreachable catalog host, platform
/// detection failure, no catalog, a malformed catalog or an aborted
/// selection. Package failures are reported on the outcome instead.
pub fn execute(
    request: &RunRequest,
    collaborators: Collaborators<'_>,
    selector: &mut dyn Selector,
    stderr: &mut dyn Write,
) -> Result<RunOutcome> {
    let settings = &request.settings;
    let quiet = request.pipeline.quiet;

    check_connectivity(collaborators.probe, &settings.catalog_host, request.offline)?;
    let detected = detect_platform(collaborators.executor, &request.platform_overrides)?;
    if !quiet {
        write_stderr_line(
            stderr,
            format!(
                "Platform {} ({}), Windows {} {}",
                detected.platform.id(),
                detected.model,
                detected.platform.os_type(),
                detected.platform.feature_version()
            ),
        );
    }

    let cache_dir = settings.cache_dir();
    let run_log = RunLog::new(cache_dir.clone());
    let resolution = CatalogResolver::new(
        collaborators.catalog_source,
        &settings.catalog_host,
        &cache_dir,
        &run_log,
    )
    .offline(request.offline)
    .resolve(&detected, request.explicit_feature_version)?;
    let catalog_feature_version = resolution.document.feature_version();
    if !quiet {
        write_stderr_line(
            stderr,
            format!(
                "Using catalog for {catalog_feature_version} ({} packages)",
                resolution.document.records().len()
            ),
        );
    }

    let candidates = filter_records(resolution.document.records(), request.filter);
    let selected = selector.select(&candidates)?;
    info!("{} of {} packages selected", selected.len(), candidates.len());

    let store = FileVersionStore::new(settings.install_root.clone());
    let downloader =
        Downloader::new(collaborators.transport).with_checksum_policy(request.checksum);
    let installer = Installer::new(collaborators.launcher);
    let pipeline = Pipeline::new(
        &store,
        &downloader,
        &installer,
        &run_log,
        PipelinePaths {
            cache_dir: &cache_dir,
            install_root: &settings.install_root,
        },
        request.pipeline,
    );
    let reports = pipeline.run(&selected, stderr);

    if request.delete_installation_files {
        remove_binaries(&cache_dir, &selected);
    }

    Ok(RunOutcome {
        detected,
        catalog_feature_version,
        fallback_steps: resolution.fallback_steps(),
        reports,
    })
}

/// Remove the cached softpaq binaries of `records`, warning on failure.
fn remove_binaries(cache_dir: &Utf8Path, records: &[&PackageRecord]) {
    for record in records {
        let path = cache_dir.join(record.id.binary_filename());
        match std::fs::remove_file(&path) {
            Ok(()) => info!("removed {path}"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("could not remove {path}: {e}"),
        }
    }
}
