use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The label paragraph that opens a document block.
pub const REQ_TYPE: &str = "REQ_TYPE";

/// A field of a requirement record, in the order the grammar lists it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldTag {
    /// `REQ_NUM`: the item number. Always the first field.
    Number,
    /// `REQ_LINKS`: comma separated references to other items.
    Links,
    /// `REQ_TEXT`: the requirement statement.
    Text,
    /// `REQ_RATIO` or `REQ_RAT`, depending on the grammar.
    Rationale,
    /// `REQ_NOTE`: a free-form note.
    Note,
}

/// The tag grammar a document is written in.
///
/// A record is the label `REQ_NUM` followed by one value paragraph per field,
/// each value followed by one separator paragraph (normally the label of the
/// next field).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grammar {
    /// `REQ_NUM`, `REQ_LINKS`, `REQ_TEXT`, `REQ_RATIO`, `REQ_NOTE`
    #[default]
    Full,
    /// `REQ_NUM`, `REQ_TEXT`, `REQ_RAT`, `REQ_NOTE`
    Lite,
}

impl Grammar {
    /// The fields of a record, in document order.
    #[must_use]
    pub const fn fields(self) -> &'static [FieldTag] {
        match self {
            Self::Full => &[
                FieldTag::Number,
                FieldTag::Links,
                FieldTag::Text,
                FieldTag::Rationale,
                FieldTag::Note,
            ],
            Self::Lite => &[
                FieldTag::Number,
                FieldTag::Text,
                FieldTag::Rationale,
                FieldTag::Note,
            ],
        }
    }

    /// The label paragraph written in front of `field`'s value.
    #[must_use]
    pub const fn label(self, field: FieldTag) -> &'static str {
        match (self, field) {
            (_, FieldTag::Number) => "REQ_NUM",
            (_, FieldTag::Links) => "REQ_LINKS",
            (_, FieldTag::Text) => "REQ_TEXT",
            (Self::Full, FieldTag::Rationale) => "REQ_RATIO",
            (Self::Lite, FieldTag::Rationale) => "REQ_RAT",
            (_, FieldTag::Note) => "REQ_NOTE",
        }
    }

    /// The label paragraph that opens a record.
    #[must_use]
    pub const fn record_label(self) -> &'static str {
        self.label(FieldTag::Number)
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Lite => write!(f, "lite"),
        }
    }
}

/// Error returned when parsing an unknown grammar name.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown grammar '{0}': expected 'full' or 'lite'")]
pub struct UnknownGrammarError(String);

impl FromStr for Grammar {
    type Err = UnknownGrammarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "lite" => Ok(Self::Lite),
            _ => Err(UnknownGrammarError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn number_is_always_first() {
        for grammar in [Grammar::Full, Grammar::Lite] {
            assert_eq!(grammar.fields()[0], FieldTag::Number);
            assert_eq!(grammar.record_label(), "REQ_NUM");
        }
    }

    #[test]
    fn lite_grammar_has_no_links() {
        assert!(!Grammar::Lite.fields().contains(&FieldTag::Links));
        assert!(Grammar::Full.fields().contains(&FieldTag::Links));
    }

    #[test_case(Grammar::Full, "REQ_RATIO")]
    #[test_case(Grammar::Lite, "REQ_RAT")]
    fn rationale_spelling(grammar: Grammar, expected: &str) {
        assert_eq!(grammar.label(FieldTag::Rationale), expected);
    }

    #[test_case("full", Grammar::Full)]
    #[test_case("LITE", Grammar::Lite)]
    fn parse_grammar(s: &str, expected: Grammar) {
        assert_eq!(s.parse::<Grammar>().unwrap(), expected);
        assert_eq!(expected.to_string(), s.to_ascii_lowercase());
    }

    #[test]
    fn parse_unknown_grammar_fails() {
        assert!("verbose".parse::<Grammar>().is_err());
    }
}
