//! Semantic wrapper for softpaq identifiers.
//!
//! This module provides the [`SoftpaqId`] newtype for type-safe handling of
//! package ids (`sp12345`) throughout the installer.

use std::fmt;

/// A vendor package identifier such as `sp12345`.
///
/// Ids are compared as given; the catalog parser trims surrounding
/// whitespace before wrapping them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoftpaqId(String);

impl SoftpaqId {
    /// Create a new softpaq id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Downloaded binary file name, `<id>.exe`.
    #[must_use]
    pub fn binary_filename(&self) -> String {
        format!("{}.exe", self.0)
    }
}

impl AsRef<str> for SoftpaqId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SoftpaqId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for SoftpaqId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for SoftpaqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
