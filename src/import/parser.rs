//! The tag grammar parser.
//!
//! [`Parser`] scans a paragraph stream and turns the tagged paragraphs into a
//! sequence of [`Event`]s. Record fields are emitted one at a time, in grammar
//! order, so that a consumer can apply each value as soon as it is read.

use std::num::ParseIntError;

use tracing::{debug, trace, warn};

use crate::{
    domain::{InvalidPrefixError, Prefix},
    import::{
        grammar::{FieldTag, Grammar, REQ_TYPE},
        reader::ParagraphReader,
    },
};

/// The header of a block of records, read from a `REQ_TYPE` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// The prefix of the document the block's records belong to.
    pub prefix: Prefix,
    /// The prefix of the parent document, or `None` for the tree root.
    pub parent: Option<Prefix>,
}

/// One field value of a requirement record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// The item number. Opens a record.
    Number(u32),
    /// References to other items, already split and trimmed.
    Links(Vec<String>),
    /// The requirement text.
    Text(String),
    /// The rationale.
    Rationale(String),
    /// The note.
    Note(String),
}

/// Something the parser recognised in the paragraph stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A new block of records begins.
    Header(BlockHeader),
    /// A field of the current record.
    Field(Field),
}

/// Errors which make the rest of a document unreadable.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    /// A `REQ_NUM` value is not a non-negative integer.
    #[error("malformed record at paragraph {paragraph}: '{value}' is not a requirement number")]
    MalformedRecord {
        /// The offending value.
        value: String,
        /// The 1-based position of the value paragraph.
        paragraph: usize,
        /// Why the value could not be parsed.
        source: ParseIntError,
    },

    /// A `REQ_TYPE` block names an invalid prefix or parent.
    #[error("invalid document prefix at paragraph {paragraph}")]
    InvalidPrefix {
        /// The 1-based position of the prefix paragraph.
        paragraph: usize,
        /// Why the prefix is invalid.
        source: InvalidPrefixError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scanning,
    InRecord { field: usize },
    Done,
}

/// A streaming parser for tagged requirement paragraphs.
///
/// The parser is an iterator of events. Reaching the end of the paragraph
/// stream ends the iteration, wherever it happens. After an error the parser
/// yields nothing more.
#[derive(Debug)]
pub struct Parser<I> {
    reader: ParagraphReader<I>,
    grammar: Grammar,
    state: State,
    seen_header: bool,
}

impl<I> Parser<I>
where
    I: Iterator<Item = String>,
{
    /// Create a parser over `paragraphs` using the given grammar.
    pub fn new<P>(paragraphs: P, grammar: Grammar) -> Self
    where
        P: IntoIterator<IntoIter = I>,
    {
        Self {
            reader: ParagraphReader::new(paragraphs),
            grammar,
            state: State::Scanning,
            seen_header: false,
        }
    }

    /// The grammar this parser reads.
    #[must_use]
    pub const fn grammar(&self) -> Grammar {
        self.grammar
    }

    fn scan(&mut self) -> Result<Option<Event>, ParseError> {
        loop {
            let Ok(text) = self.reader.read_next() else {
                return Ok(None);
            };

            if text.is_empty() {
                continue;
            }

            if text == REQ_TYPE {
                return self.header();
            }

            if text == self.grammar.record_label() {
                if self.seen_header {
                    return self.field(0);
                }
                warn!(
                    paragraph = self.reader.position(),
                    "ignoring record before the first {REQ_TYPE} block"
                );
                continue;
            }

            trace!(paragraph = self.reader.position(), "skipping untagged paragraph");
        }
    }

    fn header(&mut self) -> Result<Option<Event>, ParseError> {
        let Ok(prefix) = self.reader.read_next_skipping_one() else {
            return Ok(None);
        };
        let prefix_position = self.reader.position() - 1;
        let Ok(parent) = self.reader.read_next() else {
            return Ok(None);
        };
        let parent_position = self.reader.position();

        let prefix = parse_prefix(&prefix, prefix_position)?;
        let parent = match parent.trim() {
            "" => None,
            parent => Some(parse_prefix(parent, parent_position)?),
        };

        debug!(%prefix, parent = ?parent.as_ref().map(Prefix::as_str), "document block");
        self.seen_header = true;
        Ok(Some(Event::Header(BlockHeader { prefix, parent })))
    }

    fn field(&mut self, index: usize) -> Result<Option<Event>, ParseError> {
        let fields = self.grammar.fields();
        let tag = fields[index];

        let Ok(value) = self.reader.read_next() else {
            return Ok(None);
        };
        let value_position = self.reader.position();
        let Ok(separator) = self.reader.skip_one() else {
            return Ok(None);
        };

        match fields.get(index + 1) {
            Some(&next) => {
                let expected = self.grammar.label(next);
                if separator.trim() != expected {
                    warn!(
                        paragraph = self.reader.position(),
                        expected, found = %separator, "unexpected field label"
                    );
                }
                self.state = State::InRecord { field: index + 1 };
            }
            None => self.state = State::Scanning,
        }

        let field = match tag {
            FieldTag::Number => {
                let number = value.trim().parse::<u32>().map_err(|source| {
                    ParseError::MalformedRecord {
                        value: value.clone(),
                        paragraph: value_position,
                        source,
                    }
                })?;
                Field::Number(number)
            }
            FieldTag::Links => Field::Links(split_links(&value)),
            FieldTag::Text => Field::Text(value),
            FieldTag::Rationale => Field::Rationale(value),
            FieldTag::Note => Field::Note(value),
        };

        Ok(Some(Event::Field(field)))
    }
}

fn parse_prefix(value: &str, paragraph: usize) -> Result<Prefix, ParseError> {
    Prefix::new(value.trim().to_string())
        .map_err(|source| ParseError::InvalidPrefix { paragraph, source })
}

/// Split a `REQ_LINKS` value into its references.
///
/// References are separated by commas. Surrounding whitespace is trimmed and
/// empty references are dropped.
#[must_use]
pub fn split_links(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|link| !link.is_empty())
        .map(String::from)
        .collect()
}

impl<I> Iterator for Parser<I>
where
    I: Iterator<Item = String>,
{
    type Item = Result<Event, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = match self.state {
            State::Done => return None,
            State::Scanning => self.scan(),
            State::InRecord { field } => self.field(field),
        };

        match result {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.state = State::Done;
                None
            }
            Err(error) => {
                self.state = State::Done;
                Some(Err(error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn parse(paragraphs: &[&str], grammar: Grammar) -> Vec<Result<Event, ParseError>> {
        Parser::new(
            paragraphs
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            grammar,
        )
        .collect()
    }

    fn header(prefix: &str, parent: Option<&str>) -> Event {
        Event::Header(BlockHeader {
            prefix: Prefix::new(prefix.to_string()).unwrap(),
            parent: parent.map(|p| Prefix::new(p.to_string()).unwrap()),
        })
    }

    #[test]
    fn full_record() {
        let events = parse(
            &[
                "",
                "REQ_TYPE",
                "SYS",
                "REQ_PARENT",
                "",
                "REQ_NUM",
                "7",
                "REQ_LINKS",
                "A1, ,B2",
                "REQ_TEXT",
                "The system shall work.",
                "REQ_RATIO",
                "Because.",
                "REQ_NOTE",
                "None.",
                "",
            ],
            Grammar::Full,
        );

        let events: Vec<_> = events.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            events,
            vec![
                header("SYS", None),
                Event::Field(Field::Number(7)),
                Event::Field(Field::Links(vec!["A1".to_string(), "B2".to_string()])),
                Event::Field(Field::Text("The system shall work.".to_string())),
                Event::Field(Field::Rationale("Because.".to_string())),
                Event::Field(Field::Note("None.".to_string())),
            ]
        );
    }

    #[test]
    fn lite_record_has_no_links() {
        let events = parse(
            &[
                "REQ_TYPE", "USR", "REQ_PARENT", "SYS", "REQ_NUM", "1", "REQ_TEXT", "text",
                "REQ_RAT", "why", "REQ_NOTE", "note", "",
            ],
            Grammar::Lite,
        );

        let events: Vec<_> = events.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            events,
            vec![
                header("USR", Some("SYS")),
                Event::Field(Field::Number(1)),
                Event::Field(Field::Text("text".to_string())),
                Event::Field(Field::Rationale("why".to_string())),
                Event::Field(Field::Note("note".to_string())),
            ]
        );
    }

    #[test]
    fn record_before_header_is_ignored() {
        let events = parse(&["REQ_NUM", "1", "REQ_LINKS", ""], Grammar::Full);
        assert!(events.is_empty());
    }

    #[test]
    fn malformed_number_fails_and_stops() {
        let events = parse(
            &[
                "REQ_TYPE", "SYS", "", "", "REQ_NUM", "abc", "REQ_LINKS", "", "REQ_TEXT", "t",
                "REQ_RATIO", "", "REQ_NOTE", "", "",
            ],
            Grammar::Full,
        );

        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1],
            Err(ParseError::MalformedRecord { value, paragraph: 6, .. }) if value == "abc"
        ));
    }

    #[test]
    fn end_of_stream_mid_record_ends_cleanly() {
        let events = parse(
            &["REQ_TYPE", "SYS", "", "", "REQ_NUM", "3", "REQ_LINKS", "X1"],
            Grammar::Full,
        );

        // the links value has no separator after it, so it is never delivered
        let events: Vec<_> = events.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            events,
            vec![header("SYS", None), Event::Field(Field::Number(3))]
        );
    }

    #[test]
    fn end_of_stream_in_header_ends_cleanly() {
        assert!(parse(&["REQ_TYPE", "SYS", ""], Grammar::Full).is_empty());
    }

    #[test]
    fn invalid_prefix_fails() {
        let events = parse(&["REQ_TYPE", "2 bad", "", ""], Grammar::Full);
        assert!(matches!(
            events.as_slice(),
            [Err(ParseError::InvalidPrefix { paragraph: 2, .. })]
        ));
    }

    #[test]
    fn untagged_paragraphs_are_skipped() {
        let events = parse(
            &["Introduction", "Some prose.", "REQ_TYPE", "SYS", "", "", "More prose."],
            Grammar::Full,
        );
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn labels_are_case_sensitive() {
        assert!(parse(&["req_type", "SYS", "", ""], Grammar::Full).is_empty());
    }

    #[test_case("A1, ,B2", &["A1", "B2"]; "blank segment")]
    #[test_case("", &[]; "empty")]
    #[test_case(" SYS001 ,SYS002,", &["SYS001", "SYS002"]; "whitespace and trailing comma")]
    #[test_case("USR010", &["USR010"]; "single")]
    fn links_are_split_and_trimmed(value: &str, expected: &[&str]) {
        assert_eq!(split_links(value), expected);
    }
}
