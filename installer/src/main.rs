//! HP driver installer CLI entrypoint.
//!
//! This binary identifies the machine, resolves its HP catalog and silently
//! installs the selected softpaqs, then prints a per-package status table.

use clap::Parser;
use env_logger::Builder as LogBuilder;
use hpdrivers::catalog::source::HttpCatalogSource;
use hpdrivers::cli::Cli;
use hpdrivers::command::SystemCommandExecutor;
use hpdrivers::config::load_settings;
use hpdrivers::dirs::SystemBaseDirs;
use hpdrivers::download::HttpTransport;
use hpdrivers::error::{InstallerError, Result};
use hpdrivers::http::HttpClient;
use hpdrivers::install::SystemLauncher;
use hpdrivers::output::{RunSummary, format_json, format_status_table, write_stderr_line};
use hpdrivers::preflight::HeadProbe;
use hpdrivers::run::{Collaborators, RunOutcome, RunRequest, execute};
use hpdrivers::selector::{PromptSelector, SelectAll};
use log::warn;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// `RUST_LOG` takes precedence over `-v`/`--quiet`.
fn init_logging(cli: &Cli) {
    let mut builder = LogBuilder::new();
    builder
        .filter_level(cli.log_level())
        .parse_default_env()
        .format_timestamp(None);
    builder.init();
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    if cli.suspend_bitlocker {
        warn!("--suspend-bitlocker is not supported by this build; BitLocker is left unchanged");
    }

    let dirs = SystemBaseDirs::new().ok_or(InstallerError::MissingDirectory {
        purpose: "configuration",
    })?;
    let settings = load_settings(&cli.settings_overrides(), &dirs)?;

    let client = HttpClient::new(settings.http_timeout);
    let probe = HeadProbe::new(client.clone());
    let catalog_source = HttpCatalogSource::new(client);
    let transport = HttpTransport::new(HttpClient::for_transfers(settings.http_timeout));
    let collaborators = Collaborators {
        executor: &SystemCommandExecutor,
        probe: &probe,
        catalog_source: &catalog_source,
        transport: &transport,
        launcher: &SystemLauncher,
    };

    let request = RunRequest {
        settings,
        platform_overrides: cli.platform_overrides(),
        explicit_feature_version: cli.os_version,
        filter: cli.filter_options(),
        pipeline: cli.pipeline_options(),
        checksum: cli.checksum_policy(),
        offline: cli.offline,
        delete_installation_files: cli.delete_installation_files,
    };

    let outcome = if cli.select_all {
        execute(&request, collaborators, &mut SelectAll, stderr)?
    } else {
        let stdin = std::io::stdin();
        let mut selector = PromptSelector::new(stdin.lock(), std::io::stderr());
        execute(&request, collaborators, &mut selector, stderr)?
    };

    report(cli, &outcome, stderr)
}

fn report(cli: &Cli, outcome: &RunOutcome, stderr: &mut dyn Write) -> Result<()> {
    if !cli.quiet {
        write_stderr_line(stderr, "");
        write_stderr_line(stderr, format_status_table(&outcome.reports));
    }
    if cli.json {
        let summary = RunSummary {
            platform: outcome.detected.platform.id(),
            feature_version: outcome.catalog_feature_version.to_string(),
            fallback_steps: outcome.fallback_steps,
            packages: &outcome.reports,
        };
        writeln!(std::io::stdout(), "{}", format_json(&summary))?;
    }
    if outcome.has_failures() {
        warn!("some packages failed; see errors.log in the cache directory");
    }
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}
