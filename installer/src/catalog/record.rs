//! Package records and the catalog document that holds them.

use super::sha256_digest::Sha256Digest;
use crate::platform::FeatureVersion;
use crate::softpaq_id::SoftpaqId;
use crate::version::PackageVersion;
use std::fmt;

/// Package category, resolved once from the catalog's free-text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Device drivers; always selected.
    Driver,
    /// Hardware diagnostics.
    Diagnostic,
    /// Vendor utilities.
    Utility,
    /// Dock firmware and software.
    Dock,
    /// Application software.
    Software,
    /// Device firmware.
    Firmware,
    /// Manageability agents and providers.
    Manageability,
    /// System BIOS updates.
    Bios,
    /// A category text matching none of the known names.
    Other,
}

/// Known category names, matched case-insensitively.
const CATEGORY_NAMES: [(&str, Category); 8] = [
    ("driver", Category::Driver),
    ("diagnostic", Category::Diagnostic),
    ("utility", Category::Utility),
    ("dock", Category::Dock),
    ("software", Category::Software),
    ("firmware", Category::Firmware),
    ("manageability", Category::Manageability),
    ("bios", Category::Bios),
];

impl Category {
    /// Classify a free-text catalog category such as `Driver - Audio`.
    ///
    /// The known name that occurs earliest in the text wins, so
    /// `Firmware - Dock` is firmware and `Dock - Firmware` is a dock.
    ///
    /// # Examples
    ///
    /// ```
    /// use hpdrivers::catalog::record::Category;
    ///
    /// assert_eq!(Category::classify("Driver - Network"), Category::Driver);
    /// assert_eq!(Category::classify("BIOS"), Category::Bios);
    /// assert_eq!(Category::classify("Operating System - Enhancements"), Category::Other);
    /// ```
    #[must_use]
    pub fn classify(text: &str) -> Self {
        let lower = text.to_ascii_lowercase();
        CATEGORY_NAMES
            .iter()
            .filter_map(|(name, category)| lower.find(name).map(|at| (at, *category)))
            .min_by_key(|(at, _)| *at)
            .map_or(Self::Other, |(_, category)| category)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Driver => "Driver",
            Self::Diagnostic => "Diagnostic",
            Self::Utility => "Utility",
            Self::Dock => "Dock",
            Self::Software => "Software",
            Self::Firmware => "Firmware",
            Self::Manageability => "Manageability",
            Self::Bios => "BIOS",
            Self::Other => "Other",
        };
        f.write_str(name)
    }
}

/// The vendor's unattended install command split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SilentInstallCommand {
    executable: String,
    arguments: String,
}

impl SilentInstallCommand {
    /// Split a command line into a leading executable token and the
    /// trailing argument string.
    ///
    /// The executable may be double-quoted. Returns `None` when no
    /// executable token is present.
    ///
    /// # Examples
    ///
    /// ```
    /// use hpdrivers::catalog::record::SilentInstallCommand;
    ///
    /// let cmd = SilentInstallCommand::parse(r#""Setup.exe" /s /v"/qn""#).expect("command");
    /// assert_eq!(cmd.executable(), "Setup.exe");
    /// assert_eq!(cmd.arguments(), r#"/s /v"/qn""#);
    /// ```
    #[must_use]
    pub fn parse(command: &str) -> Option<Self> {
        let command = command.trim();
        let (executable, rest) = match command.strip_prefix('"') {
            Some(quoted) => quoted.split_once('"').unwrap_or((quoted, "")),
            None => command
                .split_once(char::is_whitespace)
                .unwrap_or((command, "")),
        };
        let executable = executable.trim();
        if executable.is_empty() {
            return None;
        }
        Some(Self {
            executable: executable.to_owned(),
            arguments: rest.trim().to_owned(),
        })
    }

    /// The executable token, without quotes.
    #[must_use]
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Everything after the executable token; may be empty.
    #[must_use]
    pub fn arguments(&self) -> &str {
        &self.arguments
    }

    /// Whether the softpaq must be extracted before running a nested setup.
    #[must_use]
    pub fn runs_nested_setup(&self) -> bool {
        !self.arguments.is_empty()
    }
}

impl fmt::Display for SilentInstallCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.arguments.is_empty() {
            write!(f, "\"{}\"", self.executable)
        } else {
            write!(f, "\"{}\" {}", self.executable, self.arguments)
        }
    }
}

/// One downloadable package listed in a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    /// Unique package id.
    pub id: SoftpaqId,
    /// Display name.
    pub name: String,
    /// Category resolved at parse time.
    pub category: Category,
    /// Available version.
    pub version: PackageVersion,
    /// Absolute download URL.
    pub url: String,
    /// Expected digest of the binary, when the catalog lists one.
    pub sha256: Option<Sha256Digest>,
    /// Binary size in bytes, when listed.
    pub size: Option<u64>,
    /// Release date as printed in the catalog.
    pub date_released: String,
    /// Unattended install command.
    pub silent_install: SilentInstallCommand,
}

/// Parsed catalog for one platform, tagged with the feature version that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogDocument {
    feature_version: FeatureVersion,
    records: Vec<PackageRecord>,
}

impl CatalogDocument {
    /// Create a document; callers guarantee ids are unique.
    #[must_use]
    pub fn new(feature_version: FeatureVersion, records: Vec<PackageRecord>) -> Self {
        Self {
            feature_version,
            records,
        }
    }

    /// Effective feature version after any fallback.
    #[must_use]
    pub fn feature_version(&self) -> FeatureVersion {
        self.feature_version
    }

    /// Records in manifest order.
    #[must_use]
    pub fn records(&self) -> &[PackageRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Driver - Audio", Category::Driver)]
    #[case("driver - keyboard, mouse and input devices", Category::Driver)]
    #[case("Diagnostic", Category::Diagnostic)]
    #[case("Utility - Tools", Category::Utility)]
    #[case("Dock - Firmware", Category::Dock)]
    #[case("Firmware - Dock", Category::Firmware)]
    #[case("Software - Security", Category::Software)]
    #[case("Manageability - Driver Pack", Category::Manageability)]
    #[case("BIOS - System Firmware", Category::Bios)]
    #[case("Operating System - Enhancements and QFEs", Category::Other)]
    fn classifies_free_text_categories(#[case] text: &str, #[case] expected: Category) {
        assert_eq!(Category::classify(text), expected);
    }

    #[rstest]
    #[case::quoted_nested(r#""Setup.exe" /s"#, "Setup.exe", "/s")]
    #[case::quoted_alone(r#""sp12345.exe""#, "sp12345.exe", "")]
    #[case::bare_with_args("install.cmd /quiet /norestart", "install.cmd", "/quiet /norestart")]
    #[case::bare_alone("sp12345.exe", "sp12345.exe", "")]
    #[case::quoted_with_spaces(r#""HP Setup.exe"  -s "#, "HP Setup.exe", "-s")]
    fn splits_executable_from_arguments(
        #[case] command: &str,
        #[case] executable: &str,
        #[case] arguments: &str,
    ) {
        let parsed = SilentInstallCommand::parse(command).expect("command");
        assert_eq!(parsed.executable(), executable);
        assert_eq!(parsed.arguments(), arguments);
        assert_eq!(parsed.runs_nested_setup(), !arguments.is_empty());
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("   ")]
    #[case::empty_quotes(r#""" /s"#)]
    fn rejects_commands_without_executable(#[case] command: &str) {
        assert!(SilentInstallCommand::parse(command).is_none());
    }
}
