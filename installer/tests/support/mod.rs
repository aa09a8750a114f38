//! Test support utilities for installer behavioural tests.
//!
//! Integration tests cannot see the library's mock implementations, so this
//! module provides small scripted fakes for every network and process seam:
//! a catalog host, a flaky package transport, a recording launcher and a
//! reachable connectivity probe.

use camino::{Utf8Path, Utf8PathBuf};
use hpdrivers::catalog::source::CatalogSource;
use hpdrivers::download::PackageTransport;
use hpdrivers::http::HttpError;
use hpdrivers::install::ProcessLauncher;
use hpdrivers::preflight::ConnectivityProbe;
use hpdrivers::test_utils::{CatalogXml, cabinet_bytes, exit_status};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::process::ExitStatus;
use tempfile::TempDir;

/// Create a temporary directory and return it with its UTF-8 path.
pub fn utf8_tempdir() -> (TempDir, Utf8PathBuf) {
    let temp = TempDir::new().expect("temp dir");
    let path = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 temp path");
    (temp, path)
}

/// Catalog host serving cabinets from memory.
#[derive(Default)]
pub struct FakeCatalogHost {
    cabinets: HashMap<String, Vec<u8>>,
    requested: RefCell<Vec<String>>,
}

impl FakeCatalogHost {
    /// Serve `catalog` as a cabinet at `url`.
    pub fn publish(&mut self, url: &str, catalog: &CatalogXml) {
        let xml = catalog.render();
        let cab = cabinet_bytes(&[("catalog.xml", xml.as_bytes())]);
        self.cabinets.insert(url.to_owned(), cab);
    }

    /// URLs requested so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

impl CatalogSource for FakeCatalogHost {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.requested.borrow_mut().push(url.to_owned());
        self.cabinets
            .get(url)
            .cloned()
            .ok_or_else(|| HttpError::NotFound {
                url: url.to_owned(),
            })
    }
}

struct Script {
    failures: u32,
    body: Vec<u8>,
}

/// Package transport that fails a scripted number of times per URL.
#[derive(Default)]
pub struct FlakyTransport {
    scripts: HashMap<String, Script>,
    attempts: RefCell<HashMap<String, u32>>,
}

impl FlakyTransport {
    /// Serve `body` at `url` after `failures` failed attempts.
    pub fn serve(&mut self, url: &str, failures: u32, body: &[u8]) {
        self.scripts.insert(
            url.to_owned(),
            Script {
                failures,
                body: body.to_vec(),
            },
        );
    }

    /// Number of attempts made for `url`.
    pub fn attempts(&self, url: &str) -> u32 {
        self.attempts.borrow().get(url).copied().unwrap_or(0)
    }

    /// Total attempts across all URLs.
    pub fn total_attempts(&self) -> u32 {
        self.attempts.borrow().values().sum()
    }
}

impl PackageTransport for FlakyTransport {
    fn download(&self, url: &str, file: &mut File) -> Result<u64, HttpError> {
        let attempt = {
            let mut attempts = self.attempts.borrow_mut();
            let count = attempts.entry(url.to_owned()).or_insert(0);
            *count += 1;
            *count
        };
        let Some(script) = self.scripts.get(url) else {
            return Err(HttpError::NotFound {
                url: url.to_owned(),
            });
        };
        if attempt <= script.failures {
            return Err(HttpError::Transfer {
                url: url.to_owned(),
                reason: format!("connection reset (attempt {attempt})"),
            });
        }
        file.write_all(&script.body)?;
        Ok(script.body.len() as u64)
    }
}

/// Launcher that records invocations and reports a fixed exit code.
pub struct RecordingLauncher {
    exit_code: i32,
    launched: RefCell<Vec<(Utf8PathBuf, String)>>,
}

impl RecordingLauncher {
    /// Create a launcher whose processes exit with `exit_code`.
    pub fn exiting_with(exit_code: i32) -> Self {
        Self {
            exit_code,
            launched: RefCell::new(Vec::new()),
        }
    }

    /// File names of launched programs, in order.
    pub fn launched_programs(&self) -> Vec<String> {
        self.launched
            .borrow()
            .iter()
            .filter_map(|(program, _)| program.file_name().map(str::to_owned))
            .collect()
    }
}

impl ProcessLauncher for RecordingLauncher {
    fn launch(&self, program: &Utf8Path, args: &str) -> std::io::Result<ExitStatus> {
        self.launched
            .borrow_mut()
            .push((program.to_owned(), args.to_owned()));
        Ok(exit_status(self.exit_code))
    }
}

/// Probe that always reaches the host.
pub struct ReachableHost;

impl ConnectivityProbe for ReachableHost {
    fn probe(&self, _url: &str) -> Result<(), HttpError> {
        Ok(())
    }
}
