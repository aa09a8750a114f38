//! Category-based selection of catalog records.

use super::record::{Category, PackageRecord};

/// Categories added by the extra-software option.
const SOFTWARE_CATEGORIES: [Category; 6] = [
    Category::Diagnostic,
    Category::Utility,
    Category::Dock,
    Category::Software,
    Category::Firmware,
    Category::Manageability,
];

/// Which optional category groups to include beyond drivers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Include diagnostics, utilities, docks, software, firmware and
    /// manageability packages.
    pub show_software: bool,
    /// Include BIOS updates.
    pub bios: bool,
}

impl FilterOptions {
    /// Whether records of `category` pass this filter.
    #[must_use]
    pub fn includes(self, category: Category) -> bool {
        match category {
            Category::Driver => true,
            Category::Bios => self.bios,
            Category::Other => false,
            other => self.show_software && SOFTWARE_CATEGORIES.contains(&other),
        }
    }
}

/// Select the records relevant to `options`, preserving manifest order.
///
/// # Examples
///
/// ```
/// use hpdrivers::catalog::filter::{FilterOptions, filter_records};
///
/// let selected = filter_records(&[], FilterOptions::default());
/// assert!(selected.is_empty());
/// ```
#[must_use]
pub fn filter_records(records: &[PackageRecord], options: FilterOptions) -> Vec<&PackageRecord> {
    records
        .iter()
        .filter(|record| options.includes(record.category))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parser::parse_catalog;
    use crate::platform::{FeatureVersion, Half};
    use crate::test_utils::CatalogXml;
    use rstest::rstest;

    fn mixed_records() -> Vec<PackageRecord> {
        let xml = CatalogXml::new()
            .entry("BIOS", "sp1", "1.0")
            .entry("Driver - Audio", "sp2", "1.0")
            .entry("Software - Security", "sp3", "1.0")
            .entry("Firmware", "sp4", "1.0")
            .entry("Driver - Network", "sp5", "1.0")
            .entry("Operating System - Enhancements", "sp6", "1.0")
            .render();
        parse_catalog(&xml, FeatureVersion::new(22, Half::H2))
            .expect("valid catalog")
            .records()
            .to_vec()
    }

    #[rstest]
    #[case::drivers_only(FilterOptions::default(), &["sp2", "sp5"])]
    #[case::with_software(
        FilterOptions { show_software: true, bios: false },
        &["sp2", "sp3", "sp4", "sp5"]
    )]
    #[case::with_bios(FilterOptions { show_software: false, bios: true }, &["sp1", "sp2", "sp5"])]
    #[case::everything(
        FilterOptions { show_software: true, bios: true },
        &["sp1", "sp2", "sp3", "sp4", "sp5"]
    )]
    fn selects_categories_in_manifest_order(
        #[case] options: FilterOptions,
        #[case] expected: &[&str],
    ) {
        let records = mixed_records();
        let ids: Vec<_> = filter_records(&records, options)
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, expected);
    }
}
