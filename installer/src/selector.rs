//! Choosing which filtered packages to process.
//!
//! The interactive selector prints the candidate table and reads a line of
//! ids from its input. `*` selects everything; an empty line selects
//! nothing. Ids are matched case-insensitively and returned in catalog
//! order regardless of the order they were typed.

use crate::catalog::PackageRecord;
use crate::error::{InstallerError, Result};
use crate::output::{format_candidates, write_stderr_line};
use std::collections::BTreeSet;
use std::io::{BufRead, Write};

/// Picks the subset of candidate packages to process.
pub trait Selector {
    /// Return the chosen records, preserving candidate order.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Selection`] if the choice cannot be read
    /// or names unknown packages.
    fn select<'r>(&mut self, candidates: &[&'r PackageRecord]) -> Result<Vec<&'r PackageRecord>>;
}

/// Selects every candidate without prompting.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectAll;

impl Selector for SelectAll {
    fn select<'r>(&mut self, candidates: &[&'r PackageRecord]) -> Result<Vec<&'r PackageRecord>> {
        Ok(candidates.to_vec())
    }
}

/// Prompts for ids on `output` and reads the answer from `input`.
pub struct PromptSelector<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSelector<R, W> {
    /// Create a selector over the given streams.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Selector for PromptSelector<R, W> {
    fn select<'r>(&mut self, candidates: &[&'r PackageRecord]) -> Result<Vec<&'r PackageRecord>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        write_stderr_line(&mut self.output, format_candidates(candidates));
        write_stderr_line(
            &mut self.output,
            "Enter package ids separated by commas or spaces (* for all, blank for none):",
        );
        let mut answer = String::new();
        self.input
            .read_line(&mut answer)
            .map_err(|e| InstallerError::Selection {
                reason: e.to_string(),
            })?;
        parse_selection(&answer, candidates)
    }
}

/// Resolve a typed answer against `candidates`.
///
/// # Errors
///
/// Returns [`InstallerError::Selection`] naming any id that is not a
/// candidate.
pub fn parse_selection<'r>(
    answer: &str,
    candidates: &[&'r PackageRecord],
) -> Result<Vec<&'r PackageRecord>> {
    let wanted: BTreeSet<String> = answer
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    if wanted.contains("*") {
        return Ok(candidates.to_vec());
    }

    let unknown: Vec<&str> = wanted
        .iter()
        .filter(|id| !candidates.iter().any(|r| r.id.as_str().eq_ignore_ascii_case(id)))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(InstallerError::Selection {
            reason: format!("unknown package ids: {}", unknown.join(", ")),
        });
    }

    Ok(candidates
        .iter()
        .filter(|r| wanted.contains(&r.id.as_str().to_ascii_lowercase()))
        .copied()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parser::parse_catalog;
    use crate::catalog::record::CatalogDocument;
    use crate::platform::{FeatureVersion, Half};
    use crate::test_utils::CatalogXml;
    use rstest::{fixture, rstest};

    #[fixture]
    fn document() -> CatalogDocument {
        let xml = CatalogXml::new()
            .driver("sp1", "1.0")
            .driver("sp2", "1.0")
            .driver("sp3", "1.0")
            .render();
        parse_catalog(&xml, FeatureVersion::new(22, Half::H2)).expect("valid catalog")
    }

    fn ids(records: &[&PackageRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.to_string()).collect()
    }

    #[rstest]
    #[case::star("*\n", &["sp1", "sp2", "sp3"])]
    #[case::reordered("sp3, SP1\n", &["sp1", "sp3"])]
    #[case::spaces("sp2   sp3", &["sp2", "sp3"])]
    #[case::blank("\n", &[])]
    fn prompt_answers_select_in_catalog_order(
        document: CatalogDocument,
        #[case] answer: &str,
        #[case] expected: &[&str],
    ) {
        let candidates: Vec<_> = document.records().iter().collect();
        let mut prompt = Vec::new();
        let mut selector = PromptSelector::new(answer.as_bytes(), &mut prompt);

        let chosen = selector.select(&candidates).expect("selection");

        assert_eq!(ids(&chosen), expected);
        let shown = String::from_utf8(prompt).expect("UTF-8 prompt");
        assert!(shown.contains("sp2"));
    }

    #[rstest]
    fn unknown_ids_are_rejected(document: CatalogDocument) {
        let candidates: Vec<_> = document.records().iter().collect();
        let err = parse_selection("sp1, sp9", &candidates).expect_err("unknown id");
        assert!(err.to_string().contains("sp9"));
    }

    #[rstest]
    fn select_all_takes_everything(document: CatalogDocument) {
        let candidates: Vec<_> = document.records().iter().collect();
        let chosen = SelectAll.select(&candidates).expect("selection");
        assert_eq!(chosen.len(), 3);
    }
}
