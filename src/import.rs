/// Grammar variants and their field labels.
pub mod grammar;
pub mod parser;
/// Sequential access to a paragraph stream.
pub mod reader;
pub mod reconcile;

pub use grammar::{Grammar, UnknownGrammarError};
pub use parser::{BlockHeader, Event, Field, ParseError, Parser};
pub use reader::{EndOfStream, ParagraphReader};
pub use reconcile::{ImportError, Outcome, Report, Resolution, Session};
