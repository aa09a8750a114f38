//! Dotted package version ordering.
//!
//! Vendor versions are dot-separated numeric segments with occasional
//! trailing text (`6.0.9239.1 A 1`). Ordering compares segments
//! numerically after zero-padding the shorter sequence on the right, so
//! `1.10` is newer than `1.9` and `1.2` equals `1.2.0.0`.

use std::cmp::Ordering;
use std::fmt;

/// A package version string with numeric, component-wise ordering.
///
/// The original text is kept for persistence and display. Each segment is
/// ordered by its leading decimal digits; a segment without digits counts
/// as zero and one too large for `u64` saturates.
///
/// # Examples
///
/// ```
/// use hpdrivers::version::PackageVersion;
///
/// let older = PackageVersion::new("1.9.0");
/// let newer = PackageVersion::new("1.10");
/// assert!(newer > older);
/// assert_eq!(PackageVersion::new("1.2"), PackageVersion::new("1.2.0.0"));
/// ```
#[derive(Debug, Clone)]
pub struct PackageVersion {
    raw: String,
    segments: Vec<u64>,
}

impl PackageVersion {
    /// Parse a version string; never fails.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let raw = raw.trim().to_owned();
        let segments = raw.split('.').map(leading_number).collect();
        Self { raw, segments }
    }

    /// The version text as it appeared in the catalog.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Numeric segments used for ordering.
    #[must_use]
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }
}

fn leading_number(segment: &str) -> u64 {
    let digits: String = segment
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return 0;
    }
    significant.parse().unwrap_or(u64::MAX)
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let width = self.segments.len().max(other.segments.len());
        let padded = |segments: &[u64], index: usize| segments.get(index).copied().unwrap_or(0);
        (0..width)
            .map(|index| padded(&self.segments, index).cmp(&padded(&other.segments, index)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for PackageVersion {}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for PackageVersion {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
