//! Package digests published in the catalog.
//!
//! HP catalogs publish the SHA-256 of each softpaq as hex, usually in upper
//! case. Digests are stored in lower case so they compare equal to locally
//! computed ones.

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const HEX_LEN: usize = 64;

/// Text that is not a SHA-256 hex digest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidDigest {
    /// Wrong number of characters.
    #[error("SHA-256 digest has {0} characters, expected 64")]
    Length(usize),
    /// A character outside `[0-9a-fA-F]`.
    #[error("SHA-256 digest contains non-hex character '{0}'")]
    NonHex(char),
}

/// A SHA-256 digest in lower-case hex.
///
/// # Examples
///
/// ```
/// use hpdrivers::catalog::Sha256Digest;
///
/// let published: Sha256Digest = "AB".repeat(32).parse().expect("digest");
/// assert_eq!(published.as_str(), "ab".repeat(32));
/// assert_ne!(published, Sha256Digest::of_bytes(b"softpaq"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Lower-case hex form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digest of an in-memory buffer.
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    /// Digest of the file at `path`, streamed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read.
    pub fn of_file(path: &Path) -> std::io::Result<Self> {
        let mut file = std::fs::File::open(path)?;
        let mut hasher = Sha256::new();
        std::io::copy(&mut file, &mut hasher)?;
        Ok(Self(format!("{:x}", hasher.finalize())))
    }
}

impl FromStr for Sha256Digest {
    type Err = InvalidDigest;

    fn from_str(s: &str) -> Result<Self, InvalidDigest> {
        let hex = s.trim();
        if let Some(bad) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(InvalidDigest::NonHex(bad));
        }
        if hex.len() != HEX_LEN {
            return Err(InvalidDigest::Length(hex.len()));
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }
}

impl TryFrom<&str> for Sha256Digest {
    type Error = InvalidDigest;

    fn try_from(value: &str) -> Result<Self, InvalidDigest> {
        value.parse()
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
