//! Platform catalogs: retrieval, extraction, parsing and filtering.
//!
//! # Sub-modules
//!
//! - [`archive`] - Cabinet extraction of the XML catalog.
//! - [`filter`] - Category-based record selection.
//! - [`parser`] - `ImagePal` XML parsing into [`record::CatalogDocument`].
//! - [`record`] - Package records, categories and install commands.
//! - [`resolver`] - Catalog lookup with feature-version fallback and caching.
//! - [`sha256_digest`] - SHA-256 digest newtype (`Sha256Digest`).
//! - [`source`] - Catalog download trait and HTTP implementation.

pub mod archive;
pub mod filter;
pub mod parser;
pub mod record;
pub mod resolver;
pub mod sha256_digest;
pub mod source;

pub use record::{CatalogDocument, Category, PackageRecord, SilentInstallCommand};
pub use resolver::{CatalogOrigin, CatalogResolver, Resolution};
pub use sha256_digest::Sha256Digest;
