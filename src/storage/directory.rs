//! A filesystem backed tree of requirement documents
//!
//! The [`Directory`] indexes every document below a root directory. Documents
//! are loaded on demand through the [`RequirementTree`] capability.

use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
};

use tracing::instrument;
use walkdir::WalkDir;

use crate::{
    domain::{Identifier, Prefix},
    storage::{
        document::{DocumentSettings, FileDocument},
        issues::Issue,
        path_parser::{DOCUMENT_FILE, METADATA_DIR},
        tree::{RequirementDocument, RequirementTree, TreeError},
    },
};

/// A filesystem backed tree of requirement documents.
#[derive(Debug)]
pub struct Directory {
    /// The root of the directory documents are stored in.
    root: PathBuf,
    /// The known documents, keyed by prefix.
    documents: BTreeMap<Prefix, Entry>,
}

#[derive(Debug, Clone)]
struct Entry {
    path: PathBuf,
    settings: DocumentSettings,
}

impl Directory {
    /// Open the tree rooted at `root`, indexing every document below it.
    ///
    /// # Errors
    ///
    /// Returns an error if a document's settings cannot be read, or if two
    /// documents declare the same prefix.
    #[instrument(level = "debug")]
    pub fn open(root: PathBuf) -> Result<Self, TreeError> {
        let mut documents = BTreeMap::new();

        for path in collect_document_paths(&root) {
            let settings = DocumentSettings::load(&path)?;
            let prefix = settings.prefix().clone();

            if let Some(existing) = documents.get(&prefix) {
                let Entry { path: first, .. } = existing;
                return Err(TreeError::DuplicateDocument {
                    prefix,
                    first: first.clone(),
                    second: path,
                });
            }

            tracing::debug!("Found document {prefix} at {}", path.display());
            documents.insert(prefix, Entry { path, settings });
        }

        Ok(Self { root, documents })
    }

    /// The prefixes of all documents in the tree.
    pub fn prefixes(&self) -> impl Iterator<Item = &Prefix> {
        self.documents.keys()
    }

    /// The settings of every document, with the directory it lives in.
    pub fn documents(&self) -> impl Iterator<Item = (&Path, &DocumentSettings)> {
        self.documents
            .values()
            .map(|entry| (entry.path.as_path(), &entry.settings))
    }

    /// Analyse the tree for problems.
    ///
    /// This never fails: anything that cannot be loaded is reported as an
    /// issue.
    #[must_use]
    pub fn issues(&self) -> Vec<Issue> {
        let mut issues = Vec::new();

        for (prefix, entry) in &self.documents {
            if let Some(parent) = entry
                .settings
                .parent()
                .filter(|parent| !self.documents.contains_key(*parent))
            {
                issues.push(Issue::MissingParent {
                    document: prefix.clone(),
                    parent: parent.clone(),
                });
            }
        }

        let loaded: Vec<_> = self
            .documents
            .values()
            .map(|entry| FileDocument::load_lenient(entry.path.clone(), entry.settings.clone()))
            .collect();

        let known: HashSet<(Prefix, u32)> = loaded
            .iter()
            .flat_map(|(document, _)| document.items())
            .map(|item| (item.identifier().prefix().clone(), item.number()))
            .collect();

        for (document, failures) in loaded {
            for (path, error) in failures {
                issues.push(Issue::Unloadable {
                    path,
                    message: error.to_string(),
                });
            }

            for item in document.items() {
                if item.text().trim().is_empty() {
                    issues.push(Issue::EmptyText {
                        item: item.identifier().clone(),
                    });
                }

                for link in item.links() {
                    let resolves = link.parse::<Identifier>().is_ok_and(|target| {
                        known.contains(&(target.prefix().clone(), target.number()))
                    }) || self.resolves_with_known_prefix(link, &known);

                    if !resolves {
                        issues.push(Issue::BrokenLink {
                            item: item.identifier().clone(),
                            link: link.clone(),
                        });
                    }
                }
            }
        }

        issues
    }

    /// Resolve a link against every known prefix, for prefixes which end in
    /// digits themselves.
    fn resolves_with_known_prefix(&self, link: &str, known: &HashSet<(Prefix, u32)>) -> bool {
        self.documents.keys().any(|prefix| {
            Identifier::parse_with_prefix(link, prefix)
                .is_ok_and(|target| known.contains(&(prefix.clone(), target.number())))
        })
    }
}

fn collect_document_paths(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != METADATA_DIR)
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == DOCUMENT_FILE)
        .filter_map(|entry| entry.path().parent().map(Path::to_path_buf))
        .collect()
}

impl RequirementTree for Directory {
    type Document = FileDocument;

    fn root(&self) -> &Path {
        &self.root
    }

    #[instrument(level = "debug", skip(self))]
    fn create_document(
        &mut self,
        path: &Path,
        prefix: &Prefix,
        parent: Option<&Prefix>,
        digits: usize,
    ) -> Result<FileDocument, TreeError> {
        if self.documents.contains_key(prefix) {
            return Err(TreeError::AlreadyExists(prefix.clone()));
        }

        if let Some(parent) = parent.filter(|parent| !self.documents.contains_key(*parent)) {
            return Err(TreeError::InvalidParent(parent.clone()));
        }

        if path.join(DOCUMENT_FILE).exists() {
            return Err(TreeError::PathInUse(path.to_path_buf()));
        }

        let settings = DocumentSettings::new(prefix.clone(), parent.cloned(), digits);
        let document = FileDocument::create(path.to_path_buf(), settings.clone())?;

        self.documents.insert(
            prefix.clone(),
            Entry {
                path: path.to_path_buf(),
                settings,
            },
        );

        Ok(document)
    }

    fn find_document(&self, prefix: &Prefix) -> Result<FileDocument, TreeError> {
        let entry = self
            .documents
            .get(prefix)
            .ok_or_else(|| TreeError::DocumentNotFound(prefix.clone()))?;

        FileDocument::load(entry.path.clone(), entry.settings.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn prefix(s: &str) -> Prefix {
        Prefix::new(s.to_string()).unwrap()
    }

    fn setup_temp_directory() -> (TempDir, Directory) {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let path = tmp.path().to_path_buf();
        (tmp, Directory::open(path).unwrap())
    }

    fn create(directory: &mut Directory, name: &str, parent: Option<&str>) -> FileDocument {
        let path = directory.root().join(name.to_lowercase());
        directory
            .create_document(&path, &prefix(name), parent.map(prefix).as_ref(), 3)
            .unwrap()
    }

    #[test]
    fn can_create_and_find_document() {
        let (_tmp, mut directory) = setup_temp_directory();
        let mut created = create(&mut directory, "SYS", None);
        created.add_item(1).unwrap();

        let found = directory.find_document(&prefix("SYS")).unwrap();
        assert_eq!(found.prefix(), &prefix("SYS"));
        assert_eq!(found.items().count(), 1);
    }

    #[test]
    fn reopening_finds_documents() {
        let (tmp, mut directory) = setup_temp_directory();
        create(&mut directory, "SYS", None);
        create(&mut directory, "USR", Some("SYS"));

        let reopened = Directory::open(tmp.path().to_path_buf()).unwrap();
        let prefixes: Vec<_> = reopened.prefixes().map(Prefix::as_str).collect();
        assert_eq!(prefixes, ["SYS", "USR"]);

        let usr = reopened.find_document(&prefix("USR")).unwrap();
        assert_eq!(usr.parent(), Some(&prefix("SYS")));
    }

    #[test]
    fn creating_an_existing_document_fails() {
        let (_tmp, mut directory) = setup_temp_directory();
        create(&mut directory, "SYS", None);

        let path = directory.root().join("elsewhere");
        let result = directory.create_document(&path, &prefix("SYS"), None, 3);
        assert!(matches!(result, Err(TreeError::AlreadyExists(p)) if p == prefix("SYS")));
    }

    #[test]
    fn creating_with_unknown_parent_fails() {
        let (_tmp, mut directory) = setup_temp_directory();
        let path = directory.root().join("usr");
        let result = directory.create_document(&path, &prefix("USR"), Some(&prefix("SYS")), 3);
        assert!(matches!(result, Err(TreeError::InvalidParent(p)) if p == prefix("SYS")));
        assert!(!path.exists());
    }

    #[test]
    fn creating_in_an_occupied_directory_fails() {
        let (_tmp, mut directory) = setup_temp_directory();
        create(&mut directory, "SYS", None);

        let path = directory.root().join("sys");
        let result = directory.create_document(&path, &prefix("HW"), None, 3);
        assert!(matches!(result, Err(TreeError::PathInUse(_))));
    }

    #[test]
    fn creating_over_an_unreadable_item_fails() {
        let (_tmp, mut directory) = setup_temp_directory();
        let path = directory.root().join("sys");
        fs::create_dir_all(&path).unwrap();
        let item = path.join("SYS001.md");
        fs::write(&item, "hand written, not an item").unwrap();

        let result = directory.create_document(&path, &prefix("SYS"), None, 3);

        assert!(matches!(result, Err(TreeError::Load { .. })));
        assert_eq!(
            fs::read_to_string(&item).unwrap(),
            "hand written, not an item"
        );
        assert!(!path.join(DOCUMENT_FILE).exists());
        assert_eq!(directory.prefixes().count(), 0);
    }

    #[test]
    fn finding_unknown_document_fails() {
        let (_tmp, directory) = setup_temp_directory();
        let result = directory.find_document(&prefix("SYS"));
        assert!(matches!(result, Err(TreeError::DocumentNotFound(_))));
    }

    #[test]
    fn duplicate_prefixes_are_rejected() {
        let tmp = TempDir::new().unwrap();
        for name in ["a", "b"] {
            let path = tmp.path().join(name);
            fs::create_dir_all(&path).unwrap();
            DocumentSettings::new(prefix("SYS"), None, 3)
                .save(&path)
                .unwrap();
        }

        let result = Directory::open(tmp.path().to_path_buf());
        assert!(matches!(result, Err(TreeError::DuplicateDocument { .. })));
    }

    #[test]
    fn metadata_directory_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(METADATA_DIR);
        fs::create_dir_all(&path).unwrap();
        DocumentSettings::new(prefix("SYS"), None, 3)
            .save(&path)
            .unwrap();

        let directory = Directory::open(tmp.path().to_path_buf()).unwrap();
        assert_eq!(directory.prefixes().count(), 0);
    }

    #[test]
    fn issues_are_reported() {
        let (_tmp, mut directory) = setup_temp_directory();
        let mut sys = create(&mut directory, "SYS", None);
        let mut usr = create(&mut directory, "USR", Some("SYS"));

        let target = sys.add_item(1).unwrap();
        sys.set_text(&target, "Target".to_string()).unwrap();

        let linked = usr.add_item(1).unwrap();
        usr.set_text(&linked, "Linked".to_string()).unwrap();
        usr.set_links(&linked, vec!["SYS001".to_string(), "SYS009".to_string()])
            .unwrap();

        let empty = usr.add_item(2).unwrap();

        fs::write(usr.path().join("USR003.md"), "garbage").unwrap();

        let issues = directory.issues();
        assert_eq!(issues.len(), 3, "{issues:?}");
        assert!(issues.contains(&Issue::BrokenLink {
            item: linked,
            link: "SYS009".to_string()
        }));
        assert!(issues.contains(&Issue::EmptyText { item: empty }));
        assert!(
            issues
                .iter()
                .any(|issue| matches!(issue, Issue::Unloadable { .. }))
        );
    }

    #[test]
    fn missing_parent_is_reported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("usr");
        fs::create_dir_all(&path).unwrap();
        DocumentSettings::new(prefix("USR"), Some(prefix("SYS")), 3)
            .save(&path)
            .unwrap();

        let directory = Directory::open(tmp.path().to_path_buf()).unwrap();
        assert_eq!(
            directory.issues(),
            vec![Issue::MissingParent {
                document: prefix("USR"),
                parent: prefix("SYS"),
            }]
        );
    }
}
