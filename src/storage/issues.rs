use std::{fmt, path::PathBuf};

use serde::Serialize;

use crate::domain::{Identifier, Prefix};

/// A problem found while analysing a requirement tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    /// A document names a parent document that does not exist.
    MissingParent {
        /// The document declaring the parent.
        document: Prefix,
        /// The missing parent.
        parent: Prefix,
    },
    /// An item links to something that is not an item in the tree.
    BrokenLink {
        /// The linking item.
        item: Identifier,
        /// The unresolved reference.
        link: String,
    },
    /// An item has no text.
    EmptyText {
        /// The empty item.
        item: Identifier,
    },
    /// An item file could not be loaded.
    Unloadable {
        /// The item file.
        path: PathBuf,
        /// Why it could not be loaded.
        message: String,
    },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingParent { document, parent } => {
                write!(f, "{document}: parent document {parent} does not exist")
            }
            Self::BrokenLink { item, link } => write!(f, "{item}: linked item {link} does not exist"),
            Self::EmptyText { item } => write!(f, "{item}: no text"),
            Self::Unloadable { path, message } => {
                write!(f, "{}: {message}", path.display())
            }
        }
    }
}
