//! Append-only run logs.
//!
//! Three tab-separated logs live in the cache directory: the install log
//! (one line per processed package), the error log (one line per captured
//! error), and the discovery log (one line per resolved catalog). Each line
//! starts with a UTC timestamp.

use camino::{Utf8Path, Utf8PathBuf};
use log::warn;
use std::fs::OpenOptions;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

const INSTALL_LOG: &str = "install.log";
const ERROR_LOG: &str = "errors.log";
const DISCOVERY_LOG: &str = "discovered_models.log";

/// Writer for the run's install, error and discovery logs.
#[derive(Debug, Clone)]
pub struct RunLog {
    dir: Utf8PathBuf,
}

impl RunLog {
    /// Log into `dir`, which is created on first write.
    #[must_use]
    pub fn new(dir: Utf8PathBuf) -> Self {
        Self { dir }
    }

    /// Path of the install log.
    #[must_use]
    pub fn install_log_path(&self) -> Utf8PathBuf {
        self.dir.join(INSTALL_LOG)
    }

    /// Path of the error log.
    #[must_use]
    pub fn error_log_path(&self) -> Utf8PathBuf {
        self.dir.join(ERROR_LOG)
    }

    /// Path of the discovery log.
    #[must_use]
    pub fn discovery_log_path(&self) -> Utf8PathBuf {
        self.dir.join(DISCOVERY_LOG)
    }

    /// Record a processed package: id, status, version, name.
    pub fn package(&self, id: &str, status: &str, version: &str, name: &str) {
        self.append_best_effort(&self.install_log_path(), &[id, status, version, name]);
    }

    /// Record a captured error.
    pub fn error(&self, context: &str, message: &str) {
        self.append_best_effort(&self.error_log_path(), &[context, message]);
    }

    /// Record the model and effective feature version a catalog resolved to.
    pub fn discovery(&self, model: &str, platform: &str, feature_version: &str) {
        self.append_best_effort(
            &self.discovery_log_path(),
            &[model, platform, feature_version],
        );
    }

    fn append_best_effort(&self, path: &Utf8Path, fields: &[&str]) {
        if let Err(e) = append_line(path, fields) {
            warn!("could not append to {path}: {e}");
        }
    }
}

/// Append one timestamped, tab-separated line to `path`.
///
/// # Errors
///
/// Returns an I/O error if the directory or file cannot be written.
pub fn append_line(path: &Utf8Path, fields: &[&str]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let sanitised: Vec<String> = fields
        .iter()
        .map(|field| field.replace(['\t', '\r', '\n'], " "))
        .collect();
    writeln!(file, "{}\t{}", now_utc_iso8601(), sanitised.join("\t"))
}

/// Return the current UTC time as an ISO 8601 string (`YYYY-MM-DDThh:mm:ssZ`).
///
/// Uses `std::time::SystemTime` to avoid pulling in `chrono`. A clock set
/// before the epoch renders as the epoch.
#[must_use]
pub fn now_utc_iso8601() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs());
    format_epoch_secs(secs)
}

/// Format a Unix epoch timestamp as `YYYY-MM-DDThh:mm:ssZ`.
fn format_epoch_secs(epoch_secs: u64) -> String {
    let (year, month, day) = civil_from_epoch(epoch_secs);
    let day_secs = epoch_secs % 86_400;
    let hour = day_secs / 3_600;
    let minute = (day_secs % 3_600) / 60;
    let second = day_secs % 60;
    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}Z")
}

/// Convert a Unix epoch timestamp to a `(year, month, day)` triple.
///
/// Howard Hinnant's `civil_from_days` algorithm.
fn civil_from_epoch(epoch_secs: u64) -> (u64, u64, u64) {
    let z = epoch_secs / 86_400 + 719_468;
    let era = z / 146_097;
    let doe = z % 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + u64::from(month <= 2);
    (year, month, day)
}
