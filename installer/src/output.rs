//! Output formatting for the installer CLI.
//!
//! Human-readable tables go to stderr alongside progress lines; the JSON
//! summary is written to stdout so it can be piped.

use crate::catalog::PackageRecord;
use crate::pipeline::{PackageOutcome, PackageReport};
use serde::Serialize;
use std::io::Write;

/// Write one line to `stderr`, ignoring failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Render the packages offered for selection.
///
/// Columns: id, name, category, version, size and release date.
///
/// # Examples
///
/// ```
/// use hpdrivers::output::format_candidates;
///
/// let table = format_candidates(&[]);
/// assert!(table.contains("No packages match"));
/// ```
#[must_use]
pub fn format_candidates(records: &[&PackageRecord]) -> String {
    if records.is_empty() {
        return String::from("No packages match the selected categories.");
    }
    let rows: Vec<[String; 6]> = records
        .iter()
        .map(|r| {
            [
                r.id.to_string(),
                r.name.clone(),
                r.category.to_string(),
                r.version.to_string(),
                r.size.map_or_else(|| "-".to_owned(), format_size),
                r.date_released.clone(),
            ]
        })
        .collect();
    render_table(
        ["Id", "Name", "Category", "Version", "Size", "Released"],
        &rows,
    )
}

/// Render the final per-package status table.
///
/// # Examples
///
/// ```
/// use hpdrivers::output::format_status_table;
///
/// assert!(format_status_table(&[]).contains("No packages were processed"));
/// ```
#[must_use]
pub fn format_status_table(reports: &[PackageReport]) -> String {
    if reports.is_empty() {
        return String::from("No packages were processed.");
    }
    let rows: Vec<[String; 4]> = reports
        .iter()
        .map(|r| {
            [
                r.id.clone(),
                r.name.clone(),
                r.version.clone(),
                r.outcome.to_string(),
            ]
        })
        .collect();
    let mut table = render_table(["Id", "Name", "Version", "Status"], &rows);
    let failed = count(reports, PackageOutcome::Failed);
    table.push_str(&format!(
        "\n{} installed, {} already installed, {} downloaded, {failed} failed",
        count(reports, PackageOutcome::Installed),
        count(reports, PackageOutcome::AlreadyInstalled),
        count(reports, PackageOutcome::Downloaded),
    ));
    table
}

fn count(reports: &[PackageReport], outcome: PackageOutcome) -> usize {
    reports.iter().filter(|r| r.outcome == outcome).count()
}

fn format_size(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB {
        format!("{} MB", bytes.div_ceil(MIB))
    } else {
        format!("{} KB", bytes.div_ceil(1024))
    }
}

fn render_table<const N: usize>(headers: [&str; N], rows: &[[String; N]]) -> String {
    let mut widths = headers.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let mut out = String::new();
    let header_cells = headers.map(str::to_owned);
    push_row(&mut out, &header_cells, &widths);
    let rule = widths.map(|w| "-".repeat(w));
    push_row(&mut out, &rule, &widths);
    for row in rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

/// Machine-readable summary of a run.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    /// Platform board id.
    pub platform: &'a str,
    /// Feature version of the catalog that was used.
    pub feature_version: String,
    /// How many older feature versions were tried first.
    pub fallback_steps: usize,
    /// One entry per processed package.
    pub packages: &'a [PackageReport],
}

/// Format a run summary as pretty-printed JSON.
#[must_use]
pub fn format_json(summary: &RunSummary<'_>) -> String {
    serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_owned())
}
