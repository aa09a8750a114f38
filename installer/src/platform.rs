//! Platform identity: board id, OS type, and OS feature version.
//!
//! The platform scopes every catalog lookup. It is derived once per run,
//! either from explicit overrides or by probing the running system through
//! a [`CommandExecutor`].

use crate::command::{CommandExecutor, stdout_of};
use crate::error::{InstallerError, Result};
use log::debug;
use std::fmt;
use std::str::FromStr;

/// Oldest two-digit year the fallback search will try (2020).
pub const FLOOR_YEAR: u8 = 20;

/// First Windows build number that identifies Windows 11.
const WINDOWS_11_FIRST_BUILD: u32 = 22_000;

const CURRENT_VERSION_KEY: &str = r"HKLM\SOFTWARE\Microsoft\Windows NT\CurrentVersion";

/// Half-year release slot of a feature version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Half {
    /// First half-year release.
    H1,
    /// Second half-year release.
    H2,
}

/// An OS semiannual release tag such as `22H2`.
///
/// Ordering follows release chronology: `22H1 < 22H2 < 23H1`.
///
/// # Examples
///
/// ```
/// use hpdrivers::platform::FeatureVersion;
///
/// let tag: FeatureVersion = "23h1".parse().expect("valid tag");
/// assert_eq!(tag.to_string(), "23H1");
/// assert_eq!(tag.previous().to_string(), "22H2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureVersion {
    year: u8,
    half: Half,
}

impl FeatureVersion {
    /// Create a feature version from a two-digit year and half.
    #[must_use]
    pub const fn new(year: u8, half: Half) -> Self {
        Self { year, half }
    }

    /// Two-digit release year.
    #[must_use]
    pub const fn year(self) -> u8 {
        self.year
    }

    /// Half-year slot.
    #[must_use]
    pub const fn half(self) -> Half {
        self.half
    }

    /// The release immediately before this one: `H2 -> H1` in the same
    /// year, `H1 -> H2` in the previous year.
    #[must_use]
    pub const fn previous(self) -> Self {
        match self.half {
            Half::H2 => Self::new(self.year, Half::H1),
            Half::H1 => Self::new(self.year.saturating_sub(1), Half::H2),
        }
    }

    /// Whether this tag is at or above the search floor.
    #[must_use]
    pub const fn is_searchable(self) -> bool {
        self.year >= FLOOR_YEAR
    }

    /// Iterate from this tag down to the floor, newest first.
    ///
    /// The sequence is strictly decreasing and ends at `20H1`; a tag below
    /// the floor yields nothing.
    pub fn fallback_sequence(self) -> impl Iterator<Item = Self> {
        std::iter::successors(Some(self), |tag| Some(tag.previous()))
            .take_while(|tag| tag.is_searchable())
    }
}

impl fmt::Display for FeatureVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let half = match self.half {
            Half::H1 => "H1",
            Half::H2 => "H2",
        };
        write!(f, "{:02}{half}", self.year)
    }
}

impl FromStr for FeatureVersion {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || InstallerError::InvalidFeatureVersion {
            value: s.to_owned(),
        };
        let upper = s.trim().to_ascii_uppercase();
        let (year, half) = upper.split_once('H').ok_or_else(invalid)?;
        if year.len() != 2 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: u8 = year.parse().map_err(|_| invalid())?;
        let half = match half {
            "1" => Half::H1,
            "2" => Half::H2,
            _ => return Err(invalid()),
        };
        Ok(Self::new(year, half))
    }
}

/// Windows major release the catalog is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsType {
    /// Windows 10.
    Windows10,
    /// Windows 11.
    Windows11,
}

impl OsType {
    /// The numeric major version used in catalog file names.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Windows10 => 10,
            Self::Windows11 => 11,
        }
    }

    /// Classify a Windows build number.
    #[must_use]
    pub const fn from_build(build: u32) -> Self {
        if build >= WINDOWS_11_FIRST_BUILD {
            Self::Windows11
        } else {
            Self::Windows10
        }
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl FromStr for OsType {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "10" => Ok(Self::Windows10),
            "11" => Ok(Self::Windows11),
            other => Err(InstallerError::PlatformDetection {
                reason: format!("unsupported OS type \"{other}\"; expected 10 or 11"),
            }),
        }
    }
}

/// Hardware and OS identity a catalog is resolved for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    id: String,
    os_type: OsType,
    feature_version: FeatureVersion,
}

impl Platform {
    /// Create a platform; the board id is upper-cased.
    #[must_use]
    pub fn new(id: &str, os_type: OsType, feature_version: FeatureVersion) -> Self {
        Self {
            id: id.trim().to_ascii_uppercase(),
            os_type,
            feature_version,
        }
    }

    /// Board identifier, e.g. `8A78`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Windows major release.
    #[must_use]
    pub fn os_type(&self) -> OsType {
        self.os_type
    }

    /// Installed OS feature version.
    #[must_use]
    pub fn feature_version(&self) -> FeatureVersion {
        self.feature_version
    }

    /// Catalog file stem for a feature version: `<id>_64_<os>.0.<tag>`.
    #[must_use]
    pub fn catalog_stem(&self, feature_version: FeatureVersion) -> String {
        format!(
            "{}_64_{}.0.{feature_version}",
            self.id,
            self.os_type.number()
        )
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Windows {} {})",
            self.id, self.os_type, self.feature_version
        )
    }
}

/// Caller-supplied values that replace environment probes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformOverrides {
    /// Board identifier.
    pub platform: Option<String>,
    /// Windows major release.
    pub os_type: Option<OsType>,
    /// Installed feature version.
    pub feature_version: Option<FeatureVersion>,
}

/// A platform plus the marketing model name used in the discovery log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedPlatform {
    /// Platform identity.
    pub platform: Platform,
    /// Human-readable model name, e.g. `HP EliteBook 840 G9`.
    pub model: String,
}

/// Resolve the platform, probing only for values not overridden.
///
/// # Errors
///
/// Returns [`InstallerError::PlatformDetection`] when a probe fails for a
/// value that was not overridden.
pub fn detect_platform(
    executor: &dyn CommandExecutor,
    overrides: &PlatformOverrides,
) -> Result<DetectedPlatform> {
    let id = match &overrides.platform {
        Some(id) => id.clone(),
        None => cim_property(executor, "Win32_BaseBoard", "Product").ok_or_else(|| {
            InstallerError::PlatformDetection {
                reason: "could not read baseboard product".to_owned(),
            }
        })?,
    };

    let os_type = match overrides.os_type {
        Some(os_type) => os_type,
        None => {
            let build = registry_value(executor, "CurrentBuild")
                .and_then(|value| value.parse::<u32>().ok())
                .ok_or_else(|| InstallerError::PlatformDetection {
                    reason: "could not read CurrentBuild".to_owned(),
                })?;
            OsType::from_build(build)
        }
    };

    let feature_version = match overrides.feature_version {
        Some(tag) => tag,
        None => registry_value(executor, "DisplayVersion")
            .ok_or_else(|| InstallerError::PlatformDetection {
                reason: "could not read DisplayVersion".to_owned(),
            })?
            .parse()?,
    };

    let model = cim_property(executor, "Win32_ComputerSystem", "Model")
        .unwrap_or_else(|| "unknown model".to_owned());

    let platform = Platform::new(&id, os_type, feature_version);
    debug!("detected platform {platform}, model {model}");
    Ok(DetectedPlatform { platform, model })
}

fn cim_property(executor: &dyn CommandExecutor, class: &str, property: &str) -> Option<String> {
    let script = format!("(Get-CimInstance {class}).{property}");
    stdout_of(
        executor,
        "powershell",
        &["-NoProfile", "-NonInteractive", "-Command", &script],
    )
}

fn registry_value(executor: &dyn CommandExecutor, name: &str) -> Option<String> {
    let output = stdout_of(executor, "reg", &["query", CURRENT_VERSION_KEY, "/v", name])?;
    parse_reg_query(&output, name)
}

/// Extract the data column from `reg query` output for `name`.
fn parse_reg_query(output: &str, name: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with(name))
        .and_then(|line| line.split_whitespace().last())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, stdout_output};
    use rstest::rstest;

    #[rstest]
    #[case::second_half("22H2", "22H1")]
    #[case::first_half("23H1", "22H2")]
    #[case::floor("20H1", "19H2")]
    fn previous_steps_back_one_release(#[case] from: &str, #[case] expected: &str) {
        let tag: FeatureVersion = from.parse().expect("valid tag");
        assert_eq!(tag.previous().to_string(), expected);
    }

    #[rstest]
    #[case("24H2")]
    #[case("23H1")]
    #[case("20H1")]
    fn fallback_sequence_is_strictly_decreasing_and_bounded(#[case] start: &str) {
        let tag: FeatureVersion = start.parse().expect("valid tag");
        let sequence: Vec<_> = tag.fallback_sequence().collect();
        assert_eq!(sequence.first(), Some(&tag));
        assert!(sequence.windows(2).all(|pair| pair.first() > pair.last()));
        assert_eq!(
            sequence.last().map(ToString::to_string).as_deref(),
            Some("20H1")
        );
        let bound = usize::from(tag.year() - FLOOR_YEAR) * 2 + 2;
        assert!(sequence.len() <= bound);
    }

    #[test]
    fn fallback_sequence_below_floor_is_empty() {
        let tag = FeatureVersion::new(19, Half::H2);
        assert_eq!(tag.fallback_sequence().count(), 0);
    }

    #[rstest]
    #[case::no_half("22")]
    #[case::bad_half("22H3")]
    #[case::four_digit_year("2022H2")]
    #[case::empty("")]
    fn rejects_malformed_feature_versions(#[case] value: &str) {
        let result = value.parse::<FeatureVersion>();
        assert!(matches!(
            result,
            Err(InstallerError::InvalidFeatureVersion { .. })
        ));
    }

    #[rstest]
    #[case(19_045, OsType::Windows10)]
    #[case(22_000, OsType::Windows11)]
    #[case(22_631, OsType::Windows11)]
    fn os_type_follows_build_number(#[case] build: u32, #[case] expected: OsType) {
        assert_eq!(OsType::from_build(build), expected);
    }

    #[test]
    fn catalog_stem_uses_vendor_layout() {
        let platform = Platform::new("8a78", OsType::Windows10, FeatureVersion::new(22, Half::H2));
        assert_eq!(
            platform.catalog_stem(FeatureVersion::new(21, Half::H1)),
            "8A78_64_10.0.21H1"
        );
    }

    #[test]
    fn parse_reg_query_extracts_data_column() {
        let output = concat!(
            "HKEY_LOCAL_MACHINE\\SOFTWARE\\Microsoft\\Windows NT\\CurrentVersion\r\n",
            "    DisplayVersion    REG_SZ    22H2\r\n"
        );
        assert_eq!(
            parse_reg_query(output, "DisplayVersion").as_deref(),
            Some("22H2")
        );
    }

    #[test]
    fn overrides_skip_identity_probes() {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: "powershell",
            args: vec![
                "-NoProfile",
                "-NonInteractive",
                "-Command",
                "(Get-CimInstance Win32_ComputerSystem).Model",
            ],
            result: Ok(failure_output("no cim")),
        }]);
        let overrides = PlatformOverrides {
            platform: Some("8A78".to_owned()),
            os_type: Some(OsType::Windows11),
            feature_version: Some(FeatureVersion::new(23, Half::H2)),
        };

        let detected = detect_platform(&executor, &overrides).expect("overrides suffice");
        assert_eq!(detected.platform.id(), "8A78");
        assert_eq!(detected.model, "unknown model");
        executor.assert_finished();
    }

    #[test]
    fn probes_fill_missing_values() {
        let executor = StubExecutor::new(vec![
            ExpectedCall {
                cmd: "powershell",
                args: vec![
                    "-NoProfile",
                    "-NonInteractive",
                    "-Command",
                    "(Get-CimInstance Win32_BaseBoard).Product",
                ],
                result: Ok(stdout_output("8a78\r\n")),
            },
            ExpectedCall {
                cmd: "reg",
                args: vec!["query", CURRENT_VERSION_KEY, "/v", "CurrentBuild"],
                result: Ok(stdout_output("    CurrentBuild    REG_SZ    19045\r\n")),
            },
            ExpectedCall {
                cmd: "reg",
                args: vec!["query", CURRENT_VERSION_KEY, "/v", "DisplayVersion"],
                result: Ok(stdout_output("    DisplayVersion    REG_SZ    22H2\r\n")),
            },
            ExpectedCall {
                cmd: "powershell",
                args: vec![
                    "-NoProfile",
                    "-NonInteractive",
                    "-Command",
                    "(Get-CimInstance Win32_ComputerSystem).Model",
                ],
                result: Ok(stdout_output("HP EliteBook 840 G9\r\n")),
            },
        ]);

        let detected =
            detect_platform(&executor, &PlatformOverrides::default()).expect("probe succeeds");
        assert_eq!(
            detected.platform,
            Platform::new("8A78", OsType::Windows10, FeatureVersion::new(22, Half::H2))
        );
        assert_eq!(detected.model, "HP EliteBook 840 G9");
        executor.assert_finished();
    }

    #[test]
    fn missing_board_id_is_a_detection_error() {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: "powershell",
            args: vec![
                "-NoProfile",
                "-NonInteractive",
                "-Command",
                "(Get-CimInstance Win32_BaseBoard).Product",
            ],
            result: Ok(failure_output("")),
        }]);
        let result = detect_platform(&executor, &PlatformOverrides::default());
        assert!(matches!(
            result,
            Err(InstallerError::PlatformDetection { .. })
        ));
    }
}
