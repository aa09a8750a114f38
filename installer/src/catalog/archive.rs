//! Catalog archive extraction.
//!
//! The vendor ships each catalog as a Microsoft Cabinet holding a single
//! XML document. Extraction happens in memory; the caller decides where the
//! archive and document are cached.

use std::io::{Cursor, Read};

/// Errors arising from catalog archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The bytes are not a readable cabinet, or a member could not be read.
    #[error("cabinet I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The cabinet holds no XML member.
    #[error("cabinet contains no XML catalog")]
    MissingCatalog,

    /// The XML member is not valid UTF-8.
    #[error("catalog {name} is not valid UTF-8")]
    NotUtf8 {
        /// Member name inside the cabinet.
        name: String,
    },
}

/// Extract the XML catalog from cabinet bytes.
///
/// The first member whose name ends in `.xml` (any case) is returned.
///
/// # Errors
///
/// Returns [`ArchiveError::Io`] if the cabinet is corrupt,
/// [`ArchiveError::MissingCatalog`] if no XML member exists, or
/// [`ArchiveError::NotUtf8`] if the member is not UTF-8 text.
pub fn extract_catalog_xml(cabinet_bytes: &[u8]) -> Result<String, ArchiveError> {
    let mut cabinet = cab::Cabinet::new(Cursor::new(cabinet_bytes))?;
    let names: Vec<String> = cabinet
        .folder_entries()
        .flat_map(|folder| {
            folder
                .file_entries()
                .map(|file| file.name().to_owned())
                .collect::<Vec<_>>()
        })
        .collect();
    let member = names
        .into_iter()
        .find(|name| name.to_ascii_lowercase().ends_with(".xml"))
        .ok_or(ArchiveError::MissingCatalog)?;

    let mut bytes = Vec::new();
    cabinet.read_file(&member)?.read_to_end(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| ArchiveError::NotUtf8 { name: member })
}
