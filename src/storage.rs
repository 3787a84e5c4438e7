pub mod directory;
/// Documents stored as directories.
pub mod document;
/// Problems found in a requirement tree.
pub mod issues;
/// Markdown serialization for items.
pub mod markdown;
pub mod path_parser;
pub mod tree;

pub use directory::Directory;
pub use document::{DocumentSettings, FileDocument};
pub use issues::Issue;
pub use markdown::{LoadError, MarkdownItem};
pub use tree::{RequirementDocument, RequirementTree, TreeError};
