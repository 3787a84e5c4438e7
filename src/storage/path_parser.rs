//! Path conventions of the filesystem tree
//!
//! A document is a directory holding a settings file ([`DOCUMENT_FILE`]) and
//! one markdown file per item, named after the item identifier:
//!
//! ```text
//! root/
//!   sys/
//!     .req-document.toml
//!     SYS001.md
//!     SYS002.md
//! ```

use std::path::{Path, PathBuf};

use crate::domain::{Identifier, IdentifierError, Prefix};

/// The name of the settings file marking a document directory.
pub const DOCUMENT_FILE: &str = ".req-document.toml";

/// The name of the tree-level metadata directory, which never holds
/// documents.
pub const METADATA_DIR: &str = ".req";

/// Parse the identifier of an item file belonging to the document `prefix`.
///
/// # Errors
///
/// Returns an error if:
/// - The path has no usable file name or is not a markdown file
/// - The file name does not start with `prefix` followed by digits
pub fn parse_identifier_from_path(path: &Path, prefix: &Prefix) -> Result<Identifier, ParseError> {
    if path.extension().and_then(|s| s.to_str()) != Some("md") {
        return Err(ParseError::InvalidPath);
    }

    let filename_stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or(ParseError::InvalidPath)?;

    Identifier::parse_with_prefix(filename_stem, prefix).map_err(ParseError::Identifier)
}

/// Construct the path of an item file inside the document directory.
#[must_use]
pub fn construct_path_from_identifier(document: &Path, identifier: &Identifier) -> PathBuf {
    document.join(identifier.to_string()).with_extension("md")
}

/// The settings file of the document directory at `document`.
#[must_use]
pub fn document_file(document: &Path) -> PathBuf {
    document.join(DOCUMENT_FILE)
}

/// Errors that can occur while parsing an item path.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    /// The path is not a markdown file with a UTF-8 name.
    #[error("Invalid path")]
    InvalidPath,

    /// The file name is not an identifier of the document.
    #[error(transparent)]
    Identifier(IdentifierError),
}
