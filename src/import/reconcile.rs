//! Reconciling parsed records with a requirement tree.
//!
//! A [`Session`] holds an open tree between import passes. Each pass walks the
//! events of one paragraph stream, resolves a document per block header,
//! creates or updates an item per record, and finally removes every item of
//! the block's document which the stream no longer mentions.

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{
    domain::{
        Config, Identifier,
        identifier::DEFAULT_DIGITS,
        item::{NOTE, RATIONALE},
    },
    import::{
        grammar::Grammar,
        parser::{BlockHeader, Event, Field, ParseError, Parser},
    },
    storage::{RequirementDocument, RequirementTree, TreeError},
};

/// How a block header is resolved to a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Resolution {
    /// Create the document, or use the existing one if it is already there.
    #[default]
    CreateOrFind,
    /// Only use existing documents.
    FindOnly,
}

/// A change made to the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "item", rename_all = "snake_case")]
pub enum Outcome {
    /// A new item was added.
    Created(Identifier),
    /// An existing item was rewritten.
    Updated(Identifier),
    /// An item missing from the document was removed.
    Deleted(Identifier),
}

impl Outcome {
    /// The affected item.
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        match self {
            Self::Created(id) | Self::Updated(id) | Self::Deleted(id) => id,
        }
    }

    /// The console wording of this kind of change.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Created(_) => "new requirement",
            Self::Updated(_) => "update requirement",
            Self::Deleted(_) => "delete requirement",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb(), self.identifier())
    }
}

/// Everything one import pass changed, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    /// The changes, in the order they were made.
    pub outcomes: Vec<Outcome>,
    /// The number of created items.
    pub created: usize,
    /// The number of updated items.
    pub updated: usize,
    /// The number of deleted items.
    pub deleted: usize,
}

impl Report {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created(_) => self.created += 1,
            Outcome::Updated(_) => self.updated += 1,
            Outcome::Deleted(_) => self.deleted += 1,
        }
        self.outcomes.push(outcome);
    }

    /// Whether the pass changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Errors which abort an import pass.
///
/// Changes made before the error stay in the tree. The pending deletions of
/// the block being read are not carried out.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The paragraph stream is not valid tag grammar.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The tree refused a change.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// An open requirement tree and the settings used to import into it.
#[derive(Debug)]
pub struct Session<T> {
    tree: T,
    grammar: Grammar,
    digits: usize,
    resolution: Resolution,
}

impl<T: RequirementTree> Session<T> {
    /// Open a session on `tree` with default settings.
    pub fn new(tree: T) -> Self {
        Self {
            tree,
            grammar: Grammar::default(),
            digits: DEFAULT_DIGITS,
            resolution: Resolution::default(),
        }
    }

    /// Open a session on `tree` using the grammar and padding of `config`.
    pub fn with_config(tree: T, config: &Config) -> Self {
        Self::new(tree)
            .grammar(config.grammar)
            .digits(config.digits())
    }

    /// Set the grammar documents are read with.
    #[must_use]
    pub const fn grammar(mut self, grammar: Grammar) -> Self {
        self.grammar = grammar;
        self
    }

    /// Set the padding width of documents created by this session.
    #[must_use]
    pub const fn digits(mut self, digits: usize) -> Self {
        self.digits = digits;
        self
    }

    /// Set how block headers are resolved to documents.
    #[must_use]
    pub const fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Change how block headers are resolved for subsequent passes.
    pub const fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
    }

    /// The open tree.
    pub const fn tree(&self) -> &T {
        &self.tree
    }

    /// Close the session, returning the tree.
    pub fn into_tree(self) -> T {
        self.tree
    }

    /// Run one import pass over `paragraphs`.
    ///
    /// `on_outcome` is called for every change as soon as it is written.
    ///
    /// # Errors
    ///
    /// Returns an error if the paragraphs cannot be parsed, if a document
    /// cannot be resolved, or if the tree refuses a change.
    #[instrument(skip_all, fields(grammar = %self.grammar, resolution = ?self.resolution))]
    pub fn import<P, F>(&mut self, paragraphs: P, mut on_outcome: F) -> Result<Report, ImportError>
    where
        P: IntoIterator<Item = String>,
        F: FnMut(&Outcome),
    {
        let mut report = Report::default();
        let mut emit = |outcome: Outcome| {
            info!("{outcome}");
            on_outcome(&outcome);
            report.record(outcome);
        };

        let mut block: Option<Block<T::Document>> = None;

        for event in Parser::new(paragraphs, self.grammar) {
            match event? {
                Event::Header(header) => {
                    if let Some(finished) = block.take() {
                        finished.finish(&mut emit)?;
                    }
                    let document = self.resolve(&header)?;
                    block = Some(Block::open(document));
                }
                Event::Field(field) => match block.as_mut() {
                    Some(block) => block.apply(field, &mut emit)?,
                    None => debug!("Ignoring field outside of a block"),
                },
            }
        }

        if let Some(finished) = block {
            finished.finish(&mut emit)?;
        }

        info!(
            "Import finished: {} created, {} updated, {} deleted",
            report.created, report.updated, report.deleted
        );
        Ok(report)
    }

    fn resolve(&mut self, header: &BlockHeader) -> Result<T::Document, TreeError> {
        let BlockHeader { prefix, parent } = header;

        match self.resolution {
            Resolution::FindOnly => self.tree.find_document(prefix),
            Resolution::CreateOrFind => {
                let path = self.tree.root().join(prefix.directory_name());
                match self
                    .tree
                    .create_document(&path, prefix, parent.as_ref(), self.digits)
                {
                    Err(TreeError::AlreadyExists(_)) => {
                        debug!("Document {prefix} already exists");
                        self.tree.find_document(prefix)
                    }
                    result => result,
                }
            }
        }
    }
}

/// The records of one block, applied to one document.
struct Block<D> {
    document: D,
    /// Numbers of the items the document held when the block began.
    existing: HashMap<u32, Identifier>,
    seen: HashSet<u32>,
    active: Option<Identifier>,
}

impl<D: RequirementDocument> Block<D> {
    fn open(document: D) -> Self {
        let existing = document
            .items()
            .map(|item| (item.number(), item.identifier().clone()))
            .collect();
        debug!("Resolved document {}", document.prefix());

        Self {
            document,
            existing,
            seen: HashSet::new(),
            active: None,
        }
    }

    fn apply(&mut self, field: Field, emit: &mut impl FnMut(Outcome)) -> Result<(), TreeError> {
        if let Field::Number(number) = field {
            let identifier = if self.existing.contains_key(&number) {
                let identifier = self.document.identifier(number);
                let identifier = self.document.find_item(&identifier)?.identifier().clone();
                emit(Outcome::Updated(identifier.clone()));
                identifier
            } else {
                let identifier = self.document.add_item(number)?;
                emit(Outcome::Created(identifier.clone()));
                identifier
            };
            self.seen.insert(number);
            self.active = Some(identifier);
            return Ok(());
        }

        let Some(active) = &self.active else {
            debug!("Ignoring field before the first record");
            return Ok(());
        };

        match field {
            Field::Number(_) => Ok(()),
            Field::Links(links) => self.document.set_links(active, links),
            Field::Text(text) => self.document.set_text(active, text),
            Field::Rationale(rationale) => {
                self.document.set_attribute(active, RATIONALE, rationale)
            }
            Field::Note(note) => self.document.set_attribute(active, NOTE, note),
        }
    }

    fn finish(mut self, emit: &mut impl FnMut(Outcome)) -> Result<(), TreeError> {
        let mut stale: Vec<u32> = self
            .existing
            .keys()
            .filter(|number| !self.seen.contains(*number))
            .copied()
            .collect();
        stale.sort_unstable();

        for number in stale {
            let identifier = self.document.identifier(number);
            let removed = self.document.remove_item(&identifier)?;
            emit(Outcome::Deleted(removed.identifier().clone()));
        }

        Ok(())
    }
}
