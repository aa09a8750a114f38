//! Silent installation of downloaded softpaqs.
//!
//! A softpaq is a self-extracting executable. When the catalog's silent
//! command carries arguments, the softpaq is first extracted into its
//! package directory and the nested setup program is run with those
//! arguments; otherwise the softpaq itself is run with `/s`. Both launches
//! block until the child exits. The exit code is recorded but not treated
//! as a success signal.

use crate::pipeline::PackageContext;
use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};
use std::process::{Command, ExitStatus};

/// Arguments that run a softpaq silently without extraction.
pub const SILENT_FLAG: &str = "/s";

/// Errors arising from launching installers.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// The process could not be started.
    #[error("failed to launch {program}: {source}")]
    Launch {
        /// The program that failed to start.
        program: Utf8PathBuf,
        /// The underlying spawn error.
        source: std::io::Error,
    },

    /// Extraction did not produce the setup program the catalog names.
    #[error("setup program {path} not found after extraction")]
    MissingSetup {
        /// Where the setup program was expected.
        path: Utf8PathBuf,
    },
}

/// Abstraction for starting a program and waiting for it.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessLauncher {
    /// Run `program` with the raw argument string `args` and wait for it.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the process cannot be spawned.
    fn launch(&self, program: &Utf8Path, args: &str) -> std::io::Result<ExitStatus>;
}

/// Launches processes on the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    #[cfg(windows)]
    fn launch(&self, program: &Utf8Path, args: &str) -> std::io::Result<ExitStatus> {
        use std::os::windows::process::CommandExt;

        // Vendor command lines carry their own quoting.
        Command::new(program).raw_arg(args).status()
    }

    #[cfg(not(windows))]
    fn launch(&self, program: &Utf8Path, args: &str) -> std::io::Result<ExitStatus> {
        Command::new(program).args(args.split_whitespace()).status()
    }
}

/// What an installation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// The program that performed the installation.
    pub program: Utf8PathBuf,
    /// The arguments it was given.
    pub arguments: String,
    /// Its exit code, when the platform reports one.
    pub exit_code: Option<i32>,
}

/// Runs softpaq installers.
pub struct Installer<'a> {
    launcher: &'a dyn ProcessLauncher,
}

impl<'a> Installer<'a> {
    /// Create an installer using `launcher`.
    #[must_use]
    pub fn new(launcher: &'a dyn ProcessLauncher) -> Self {
        Self { launcher }
    }

    /// Install the package described by `context` from `binary`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::Launch`] if a process cannot start, or
    /// [`InstallError::MissingSetup`] if extraction did not produce the
    /// nested setup program.
    pub fn install(
        &self,
        context: &PackageContext<'_>,
        binary: &Utf8Path,
    ) -> Result<InstallReport, InstallError> {
        let command = &context.record.silent_install;
        if !command.runs_nested_setup() {
            return self.run(binary, SILENT_FLAG);
        }

        let extract_args = format!("/s /e /f \"{}\"", context.package_dir);
        let extraction = self.run(binary, &extract_args)?;
        info!(
            "extracted {} into {} (exit {:?})",
            context.record.id, context.package_dir, extraction.exit_code
        );

        let setup = context.package_dir.join(command.executable());
        if !setup.is_file() {
            return Err(InstallError::MissingSetup { path: setup });
        }
        self.run(&setup, command.arguments())
    }

    fn run(&self, program: &Utf8Path, args: &str) -> Result<InstallReport, InstallError> {
        info!("running {program} {args}");
        let status = self
            .launcher
            .launch(program, args)
            .map_err(|source| InstallError::Launch {
                program: program.to_owned(),
                source,
            })?;
        let exit_code = status.code();
        if !status.success() {
            warn!("{program} exited with {exit_code:?}; continuing");
        }
        Ok(InstallReport {
            program: program.to_owned(),
            arguments: args.to_owned(),
            exit_code,
        })
    }
}
