//! The requirement tree capability.
//!
//! The importer never touches storage directly. It resolves documents through
//! a [`RequirementTree`] and edits items through a [`RequirementDocument`].
//! [`Directory`](crate::storage::Directory) is the filesystem implementation.

use std::{
    io,
    path::{Path, PathBuf},
};

use crate::{
    domain::{Identifier, Item, Prefix},
    storage::markdown::LoadError,
};

/// A tree of requirement documents.
pub trait RequirementTree {
    /// The handle to a single document in this tree.
    type Document: RequirementDocument;

    /// The root directory of the tree.
    fn root(&self) -> &Path;

    /// Create a new, empty document.
    ///
    /// # Errors
    ///
    /// - [`TreeError::AlreadyExists`] if a document with this prefix exists
    /// - [`TreeError::InvalidParent`] if `parent` is not a known document
    /// - any other variant if the document cannot be written
    fn create_document(
        &mut self,
        path: &Path,
        prefix: &Prefix,
        parent: Option<&Prefix>,
        digits: usize,
    ) -> Result<Self::Document, TreeError>;

    /// Find an existing document by its prefix.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::DocumentNotFound`] if there is no such document,
    /// or another variant if its items cannot be loaded.
    fn find_document(&self, prefix: &Prefix) -> Result<Self::Document, TreeError>;
}

/// A document: a collection of requirement items sharing one prefix.
///
/// Every mutation is persisted before the method returns.
pub trait RequirementDocument {
    /// The document prefix.
    fn prefix(&self) -> &Prefix;

    /// The parent document, or `None` for the root document.
    fn parent(&self) -> Option<&Prefix>;

    /// The width item numbers are padded to.
    fn digits(&self) -> usize;

    /// The identifier an item with this number has in this document.
    fn identifier(&self, number: u32) -> Identifier {
        Identifier::with_digits(self.prefix().clone(), number, self.digits())
    }

    /// The items in the document, in no particular order.
    fn items(&self) -> impl Iterator<Item = &Item>;

    /// Add an empty item with the given number.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::DuplicateItem`] if the number is taken, or another
    /// variant if the item cannot be written.
    fn add_item(&mut self, number: u32) -> Result<Identifier, TreeError>;

    /// Look up an item.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::ItemNotFound`] if there is no such item.
    fn find_item(&self, identifier: &Identifier) -> Result<&Item, TreeError>;

    /// Remove an item, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::ItemNotFound`] if there is no such item, or
    /// another variant if it cannot be deleted.
    fn remove_item(&mut self, identifier: &Identifier) -> Result<Item, TreeError>;

    /// Replace the text of an item.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::ItemNotFound`] if there is no such item, or
    /// another variant if it cannot be written.
    fn set_text(&mut self, identifier: &Identifier, text: String) -> Result<(), TreeError>;

    /// Set a named attribute of an item.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::ItemNotFound`] if there is no such item, or
    /// another variant if it cannot be written.
    fn set_attribute(
        &mut self,
        identifier: &Identifier,
        name: &str,
        value: String,
    ) -> Result<(), TreeError>;

    /// Replace all links of an item.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::ItemNotFound`] if there is no such item, or
    /// another variant if it cannot be written.
    fn set_links(&mut self, identifier: &Identifier, links: Vec<String>)
    -> Result<(), TreeError>;
}

/// Errors raised by a requirement tree.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// A document with this prefix already exists.
    #[error("document {0} already exists")]
    AlreadyExists(Prefix),

    /// The declared parent document does not exist.
    #[error("parent document {0} not found")]
    InvalidParent(Prefix),

    /// There is no document with this prefix.
    #[error("document {0} not found")]
    DocumentNotFound(Prefix),

    /// There is no item with this identifier.
    #[error("item {0} not found")]
    ItemNotFound(Identifier),

    /// An item with this number already exists.
    #[error("item {0} already exists")]
    DuplicateItem(Identifier),

    /// Another document already lives at this path.
    #[error("{} already contains a document", .0.display())]
    PathInUse(PathBuf),

    /// Two document directories declare the same prefix.
    #[error("document {prefix} is defined twice: {} and {}", .first.display(), .second.display())]
    DuplicateDocument {
        /// The shared prefix.
        prefix: Prefix,
        /// The first directory found.
        first: PathBuf,
        /// The second directory found.
        second: PathBuf,
    },

    /// A document settings file could not be read.
    #[error("invalid document settings at {}: {message}", .path.display())]
    Settings {
        /// The settings file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// An item file could not be loaded.
    #[error("failed to load {}", .path.display())]
    Load {
        /// The item file.
        path: PathBuf,
        /// Why it could not be loaded.
        source: LoadError,
    },

    /// A file could not be written or removed.
    #[error("I/O error at {}", .path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

impl TreeError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
