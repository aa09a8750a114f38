//! Catalog deserialization.
//!
//! Parses the vendor `ImagePal` XML into a [`CatalogDocument`]. Each
//! `Solutions/UpdateInfo` element becomes a [`PackageRecord`]; required
//! fields are checked and categories are classified here so later stages
//! never re-read free text.

use super::record::{CatalogDocument, Category, PackageRecord, SilentInstallCommand};
use super::sha256_digest::Sha256Digest;
use crate::error::{InstallerError, Result};
use crate::platform::FeatureVersion;
use crate::softpaq_id::SoftpaqId;
use crate::version::PackageVersion;
use log::debug;
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
struct ImagePal {
    #[serde(rename = "Solutions", default)]
    solutions: Option<Solutions>,
}

#[derive(Debug, Deserialize)]
struct Solutions {
    #[serde(rename = "UpdateInfo", default)]
    updates: Vec<RawUpdateInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct RawUpdateInfo {
    #[serde(rename = "Id")]
    id: Option<String>,
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Category")]
    category: Option<String>,
    #[serde(rename = "Version")]
    version: Option<String>,
    #[serde(rename = "Url")]
    url: Option<String>,
    #[serde(rename = "Sha256")]
    sha256: Option<String>,
    #[serde(rename = "Size")]
    size: Option<String>,
    #[serde(rename = "DateReleased")]
    date_released: Option<String>,
    #[serde(rename = "SilentInstall")]
    silent_install: Option<String>,
}

/// Parse catalog XML into a document tagged with `feature_version`.
///
/// # Errors
///
/// Returns [`InstallerError::MalformedCatalog`] if the XML is invalid, an
/// entry lacks an id, version, URL or silent-install command, a digest is
/// not valid hex, or an id appears twice.
///
/// # Examples
///
/// ```
/// use hpdrivers::catalog::parser::parse_catalog;
/// use hpdrivers::platform::FeatureVersion;
///
/// let xml = concat!(
///     "<ImagePal><Solutions><UpdateInfo>",
///     "<Id>sp12345</Id><Name>Audio</Name><Category>Driver - Audio</Category>",
///     "<Version>1.2.3.4</Version><Url>ftp.hp.com/pub/softpaq/sp12345.exe</Url>",
///     "<SilentInstall>\"Setup.exe\" /s</SilentInstall>",
///     "</UpdateInfo></Solutions></ImagePal>",
/// );
/// let tag: FeatureVersion = "22H2".parse().expect("tag");
/// let doc = parse_catalog(xml, tag).expect("valid catalog");
/// assert_eq!(doc.records().len(), 1);
/// assert_eq!(doc.records()[0].url, "https://ftp.hp.com/pub/softpaq/sp12345.exe");
/// ```
pub fn parse_catalog(xml: &str, feature_version: FeatureVersion) -> Result<CatalogDocument> {
    let xml = xml.trim_start_matches('\u{feff}');
    let image: ImagePal = quick_xml::de::from_str(xml).map_err(|e| malformed(e.to_string()))?;
    let raw_updates = image.solutions.map(|s| s.updates).unwrap_or_default();

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(raw_updates.len());
    for (index, raw) in raw_updates.into_iter().enumerate() {
        let record = convert_entry(index, raw)?;
        if !seen.insert(record.id.clone()) {
            return Err(malformed(format!("duplicate package id {}", record.id)));
        }
        records.push(record);
    }

    debug!(
        "parsed {} package records for feature version {feature_version}",
        records.len()
    );
    Ok(CatalogDocument::new(feature_version, records))
}

fn convert_entry(index: usize, raw: RawUpdateInfo) -> Result<PackageRecord> {
    let id = required(raw.id, "Id", &format!("entry {index}"))?;
    if !is_plain_file_name(&id) {
        return Err(malformed(format!("Id \"{id}\" is not a plain file name")));
    }
    let version = required(raw.version, "Version", &id)?;
    let url = required(raw.url, "Url", &id)?;
    let silent_install = required(raw.silent_install, "SilentInstall", &id)?;
    let silent_install = SilentInstallCommand::parse(&silent_install)
        .ok_or_else(|| malformed(format!("{id}: SilentInstall has no executable")))?;
    if silent_install.runs_nested_setup() && !is_contained_path(silent_install.executable()) {
        return Err(malformed(format!(
            "{id}: SilentInstall executable \"{}\" escapes the package directory",
            silent_install.executable()
        )));
    }

    let sha256 = match non_blank(raw.sha256) {
        Some(hex) => Some(
            hex.parse::<Sha256Digest>()
                .map_err(|e| malformed(format!("{id}: {e}")))?,
        ),
        None => None,
    };
    let size = non_blank(raw.size).and_then(|size| size.parse().ok());
    let category = non_blank(raw.category).map_or(Category::Other, |c| Category::classify(&c));

    Ok(PackageRecord {
        name: non_blank(raw.name).unwrap_or_else(|| id.clone()),
        id: SoftpaqId::from(id),
        category,
        version: PackageVersion::new(&version),
        url: normalise_url(&url),
        sha256,
        size,
        date_released: non_blank(raw.date_released).unwrap_or_default(),
        silent_install,
    })
}

/// Ids become file and directory names, so they must be one path component.
fn is_plain_file_name(value: &str) -> bool {
    !value.contains(['/', '\\', ':']) && value != "." && value != ".."
}

/// Nested setup paths are joined onto the package directory and must stay
/// inside it on every host: relative, no drive, no `..` segment.
fn is_contained_path(value: &str) -> bool {
    !value.starts_with(['/', '\\'])
        && !value.contains(':')
        && value.split(['/', '\\']).all(|segment| segment != "..")
}

fn required(value: Option<String>, field: &str, entry: &str) -> Result<String> {
    non_blank(value).ok_or_else(|| malformed(format!("{entry}: missing required field {field}")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Catalog URLs are usually scheme-less (`ftp.hp.com/pub/...`).
fn normalise_url(url: &str) -> String {
    if url.contains("://") {
        url.to_owned()
    } else {
        format!("https://{url}")
    }
}

fn malformed(reason: String) -> InstallerError {
    InstallerError::MalformedCatalog { reason }
}
