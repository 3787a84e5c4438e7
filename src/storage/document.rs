//! A requirement document stored as a directory of markdown files.

use std::{
    collections::BTreeMap,
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use walkdir::WalkDir;

use crate::{
    domain::{Identifier, InvalidPrefixError, Item, Prefix, identifier::DEFAULT_DIGITS},
    storage::{
        markdown::{LoadError, MarkdownItem},
        path_parser::{construct_path_from_identifier, document_file, parse_identifier_from_path},
        tree::{RequirementDocument, TreeError},
    },
};

/// The settings of a document, stored in its directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Versions", into = "Versions")]
pub struct DocumentSettings {
    prefix: Prefix,
    parent: Option<Prefix>,
    digits: usize,
}

impl DocumentSettings {
    /// Settings for a new document.
    #[must_use]
    pub const fn new(prefix: Prefix, parent: Option<Prefix>, digits: usize) -> Self {
        Self {
            prefix,
            parent,
            digits,
        }
    }

    /// The document prefix.
    #[must_use]
    pub const fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    /// The parent document, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<&Prefix> {
        self.parent.as_ref()
    }

    /// The width item numbers are padded to.
    #[must_use]
    pub const fn digits(&self) -> usize {
        self.digits
    }

    /// Read the settings of the document directory at `document`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Settings`] if the file is missing or invalid.
    pub fn load(document: &Path) -> Result<Self, TreeError> {
        let path = document_file(document);
        let settings_error = |message: String| TreeError::Settings {
            path: path.clone(),
            message,
        };

        let content = fs::read_to_string(&path)
            .map_err(|e| settings_error(format!("Failed to read document settings: {e}")))?;
        toml::from_str(&content)
            .map_err(|e| settings_error(format!("Failed to parse document settings: {e}")))
    }

    /// Write the settings into the document directory at `document`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, document: &Path) -> Result<(), TreeError> {
        let path = document_file(document);
        let content = toml::to_string_pretty(self).map_err(|e| TreeError::Settings {
            path: path.clone(),
            message: format!("Failed to serialize document settings: {e}"),
        })?;
        fs::write(&path, content).map_err(TreeError::io(path))
    }
}

const fn default_digits() -> usize {
    DEFAULT_DIGITS
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        prefix: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent: Option<String>,
        #[serde(default = "default_digits")]
        digits: usize,
    },
}

impl TryFrom<Versions> for DocumentSettings {
    type Error = InvalidPrefixError;

    fn try_from(versions: Versions) -> Result<Self, Self::Error> {
        match versions {
            Versions::V1 {
                prefix,
                parent,
                digits,
            } => Ok(Self {
                prefix: Prefix::new(prefix)?,
                parent: parent.map(Prefix::new).transpose()?,
                digits,
            }),
        }
    }
}

impl From<DocumentSettings> for Versions {
    fn from(settings: DocumentSettings) -> Self {
        Self::V1 {
            prefix: settings.prefix.to_string(),
            parent: settings.parent.map(|p| p.to_string()),
            digits: settings.digits,
        }
    }
}

/// A document backed by a directory on disk.
///
/// Items are held in memory and written through on every change.
#[derive(Debug)]
pub struct FileDocument {
    path: PathBuf,
    settings: DocumentSettings,
    items: BTreeMap<u32, Item>,
}

/// An item file that could not be loaded.
pub type LoadFailure = (PathBuf, LoadError);

impl FileDocument {
    /// Create a new, empty document directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or its settings cannot be written,
    /// or if the directory already holds an item file that cannot be loaded.
    /// Nothing is written in the latter case.
    pub(crate) fn create(path: PathBuf, settings: DocumentSettings) -> Result<Self, TreeError> {
        fs::create_dir_all(&path).map_err(TreeError::io(&path))?;
        let document = Self::load(path, settings)?;

        document.settings.save(&document.path)?;
        tracing::info!(
            "Created document {} at {}",
            document.settings.prefix,
            document.path.display()
        );
        Ok(document)
    }

    /// Load a document and all of its items.
    ///
    /// # Errors
    ///
    /// Returns an error if any item file cannot be loaded.
    #[instrument(level = "debug", skip(settings), fields(prefix = %settings.prefix))]
    pub fn load(path: PathBuf, settings: DocumentSettings) -> Result<Self, TreeError> {
        let (document, failures) = Self::load_lenient(path, settings);
        match failures.into_iter().next() {
            Some((path, source)) => Err(TreeError::Load { path, source }),
            None => Ok(document),
        }
    }

    /// Load a document, collecting the item files that fail to load instead
    /// of giving up.
    #[must_use]
    pub fn load_lenient(path: PathBuf, settings: DocumentSettings) -> (Self, Vec<LoadFailure>) {
        let item_paths = collect_item_paths(&path, &settings.prefix);

        let (loaded, failures): (Vec<_>, Vec<_>) = item_paths
            .into_par_iter()
            .map(|(item_path, identifier)| {
                MarkdownItem::load(&item_path, identifier)
                    .map(Item::from)
                    .map_err(|e| (item_path, e))
            })
            .partition(Result::is_ok);

        let items = loaded
            .into_iter()
            .flatten()
            .map(|item| (item.number(), item))
            .collect();
        let failures = failures.into_iter().filter_map(Result::err).collect();

        (
            Self {
                path,
                settings,
                items,
            },
            failures,
        )
    }

    /// The directory this document lives in.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The settings of this document.
    #[must_use]
    pub const fn settings(&self) -> &DocumentSettings {
        &self.settings
    }

    fn item_mut(&mut self, identifier: &Identifier) -> Result<&mut Item, TreeError> {
        if identifier.prefix() != &self.settings.prefix {
            return Err(TreeError::ItemNotFound(identifier.clone()));
        }
        self.items
            .get_mut(&identifier.number())
            .ok_or_else(|| TreeError::ItemNotFound(identifier.clone()))
    }

    fn update(
        &mut self,
        identifier: &Identifier,
        edit: impl FnOnce(&mut Item),
    ) -> Result<(), TreeError> {
        let document = self.path.clone();
        let item = self.item_mut(identifier)?;
        edit(item);
        save(&document, item)
    }
}

fn save(document: &Path, item: &Item) -> Result<(), TreeError> {
    let path = construct_path_from_identifier(document, item.identifier());
    MarkdownItem::from(item.clone())
        .save(&path)
        .map_err(TreeError::io(path))
}

fn collect_item_paths(document: &Path, prefix: &Prefix) -> Vec<(PathBuf, Identifier)> {
    WalkDir::new(document)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension() == Some(OsStr::new("md")))
        .filter_map(
            |entry| match parse_identifier_from_path(entry.path(), prefix) {
                Ok(identifier) => Some((entry.into_path(), identifier)),
                Err(e) => {
                    tracing::debug!(
                        "Skipping file that is not an item of {prefix}: {}: {e}",
                        entry.path().display()
                    );
                    None
                }
            },
        )
        .collect()
}

impl RequirementDocument for FileDocument {
    fn prefix(&self) -> &Prefix {
        &self.settings.prefix
    }

    fn parent(&self) -> Option<&Prefix> {
        self.settings.parent.as_ref()
    }

    fn digits(&self) -> usize {
        self.settings.digits
    }

    fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    fn add_item(&mut self, number: u32) -> Result<Identifier, TreeError> {
        let identifier = self.identifier(number);
        if self.items.contains_key(&number) {
            return Err(TreeError::DuplicateItem(identifier));
        }

        let item = Item::new(identifier.clone());
        save(&self.path, &item)?;
        self.items.insert(number, item);

        tracing::debug!("Added item {identifier}");
        Ok(identifier)
    }

    fn find_item(&self, identifier: &Identifier) -> Result<&Item, TreeError> {
        if identifier.prefix() != &self.settings.prefix {
            return Err(TreeError::ItemNotFound(identifier.clone()));
        }
        self.items
            .get(&identifier.number())
            .ok_or_else(|| TreeError::ItemNotFound(identifier.clone()))
    }

    fn remove_item(&mut self, identifier: &Identifier) -> Result<Item, TreeError> {
        let number = self.item_mut(identifier)?.number();
        let path = construct_path_from_identifier(&self.path, self.items[&number].identifier());
        fs::remove_file(&path).map_err(TreeError::io(&path))?;

        tracing::debug!("Removed item {identifier}");
        self.items
            .remove(&number)
            .ok_or_else(|| TreeError::ItemNotFound(identifier.clone()))
    }

    fn set_text(&mut self, identifier: &Identifier, text: String) -> Result<(), TreeError> {
        self.update(identifier, |item| item.set_text(text))
    }

    fn set_attribute(
        &mut self,
        identifier: &Identifier,
        name: &str,
        value: String,
    ) -> Result<(), TreeError> {
        self.update(identifier, |item| {
            item.set_attribute(name.to_string(), value);
        })
    }

    fn set_links(
        &mut self,
        identifier: &Identifier,
        links: Vec<String>,
    ) -> Result<(), TreeError> {
        self.update(identifier, |item| item.set_links(links))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::domain::item::NOTE;

    fn prefix(s: &str) -> Prefix {
        Prefix::new(s.to_string()).unwrap()
    }

    fn setup_document() -> (TempDir, FileDocument) {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let path = tmp.path().join("sys");
        let settings = DocumentSettings::new(prefix("SYS"), None, 3);
        let document = FileDocument::create(path, settings).unwrap();
        (tmp, document)
    }

    fn reload(document: &FileDocument) -> FileDocument {
        let settings = DocumentSettings::load(document.path()).unwrap();
        FileDocument::load(document.path().to_path_buf(), settings).unwrap()
    }

    #[test]
    fn settings_round_trip() {
        let (_tmp, document) = setup_document();
        let settings = DocumentSettings::load(document.path()).unwrap();
        assert_eq!(&settings, document.settings());
    }

    #[test]
    fn settings_with_invalid_prefix_fail() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            document_file(tmp.path()),
            "_version = \"1\"\nprefix = \"not valid\"\n",
        )
        .unwrap();
        let result = DocumentSettings::load(tmp.path());
        assert!(matches!(result, Err(TreeError::Settings { .. })));
    }

    #[test]
    fn can_add_item() {
        let (_tmp, mut document) = setup_document();
        let identifier = document.add_item(7).unwrap();

        assert_eq!(identifier.to_string(), "SYS007");
        assert!(document.path().join("SYS007.md").exists());
        assert_eq!(reload(&document).items().count(), 1);
    }

    #[test]
    fn adding_an_existing_number_fails() {
        let (_tmp, mut document) = setup_document();
        document.add_item(1).unwrap();
        assert!(matches!(
            document.add_item(1),
            Err(TreeError::DuplicateItem(_))
        ));
    }

    #[test]
    fn edits_are_written_through() {
        let (_tmp, mut document) = setup_document();
        let identifier = document.add_item(2).unwrap();
        document
            .set_text(&identifier, "The system shall work.".to_string())
            .unwrap();
        document
            .set_attribute(&identifier, NOTE, "a note".to_string())
            .unwrap();
        document
            .set_links(&identifier, vec!["USR001".to_string()])
            .unwrap();

        let reloaded = reload(&document);
        let item = reloaded.find_item(&identifier).unwrap();
        assert_eq!(item.text(), "The system shall work.");
        assert_eq!(item.note(), Some("a note"));
        assert_eq!(item.links(), ["USR001".to_string()]);
    }

    #[test]
    fn can_remove_item() {
        let (_tmp, mut document) = setup_document();
        let identifier = document.add_item(3).unwrap();
        let removed = document.remove_item(&identifier).unwrap();

        assert_eq!(removed.identifier(), &identifier);
        assert!(!document.path().join("SYS003.md").exists());
        assert!(matches!(
            document.find_item(&identifier),
            Err(TreeError::ItemNotFound(_))
        ));
    }

    #[test]
    fn missing_items_are_not_found() {
        let (_tmp, mut document) = setup_document();
        let identifier = document.identifier(9);
        assert!(matches!(
            document.remove_item(&identifier),
            Err(TreeError::ItemNotFound(_))
        ));
        assert!(matches!(
            document.set_text(&identifier, String::new()),
            Err(TreeError::ItemNotFound(_))
        ));

        let other = Identifier::new(prefix("USR"), 9);
        assert!(matches!(
            document.find_item(&other),
            Err(TreeError::ItemNotFound(_))
        ));
    }

    #[test]
    fn foreign_files_are_ignored() {
        let (_tmp, document) = setup_document();
        fs::write(document.path().join("README.md"), "# Notes").unwrap();
        assert_eq!(reload(&document).items().count(), 0);
    }

    #[test]
    fn broken_item_files_are_reported() {
        let (_tmp, document) = setup_document();
        fs::write(document.path().join("SYS001.md"), "not an item").unwrap();

        let settings = document.settings().clone();
        let (lenient, failures) = FileDocument::load_lenient(document.path().to_path_buf(), settings.clone());
        assert_eq!(lenient.items().count(), 0);
        assert_eq!(failures.len(), 1);

        let strict = FileDocument::load(document.path().to_path_buf(), settings);
        assert!(matches!(strict, Err(TreeError::Load { .. })));
    }
}
