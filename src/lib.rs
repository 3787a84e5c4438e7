//! Requirements from Word documents
//!
//! Requirement records are written into `.docx` documents as tagged
//! paragraphs. This crate reads them and reconciles a plain-text requirements
//! tree with the document: new records become items, known records update
//! their items and items no longer in the document are removed.
//!
//! ```no_run
//! use docxreq::{Directory, Session, paragraphs_from_docx};
//!
//! # fn main() -> anyhow::Result<()> {
//! let tree = Directory::open("requirements".into())?;
//! let mut session = Session::new(tree);
//!
//! let paragraphs = paragraphs_from_docx(std::path::Path::new("spec.docx"))?;
//! let report = session.import(paragraphs, |outcome| println!("{outcome}"))?;
//! println!("{} created", report.created);
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub use domain::{Config, Identifier, Item, Prefix};

/// Parsing tagged paragraphs and applying them to a tree.
pub mod import;
pub use import::{Grammar, ImportError, Outcome, Report, Resolution, Session};

pub mod source;
pub use source::{SourceError, paragraphs_from_docx};

/// Filesystem storage for requirement trees.
pub mod storage;
pub use storage::{Directory, Issue, RequirementDocument, RequirementTree, TreeError};
