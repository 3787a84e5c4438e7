use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    str::FromStr,
};

use non_empty_string::NonEmptyString;
use serde::{Serialize, Serializer};

/// The default number of digits an identifier's number is padded to.
pub const DEFAULT_DIGITS: usize = 3;

/// A validated document-type prefix (e.g. `SYS`, `USR`, `L2_HW`).
///
/// A prefix must start with an ASCII letter. The remaining characters may be
/// ASCII letters, digits, `_` or `-`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Prefix(NonEmptyString);

impl Prefix {
    /// Creates a new `Prefix` from a string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPrefixError` if the string is empty, does not start
    /// with an ASCII letter, or contains other characters than ASCII
    /// alphanumerics, `_` and `-`.
    pub fn new(s: String) -> Result<Self, InvalidPrefixError> {
        let non_empty =
            NonEmptyString::new(s.clone()).map_err(|_| InvalidPrefixError(s.clone()))?;

        let mut chars = s.chars();
        let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        if !starts_with_letter || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(InvalidPrefixError(s));
        }

        Ok(Self(non_empty))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The name of the directory a document with this prefix lives in.
    #[must_use]
    pub fn directory_name(&self) -> String {
        self.as_str().to_lowercase()
    }
}

impl TryFrom<String> for Prefix {
    type Error = InvalidPrefixError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Prefix {
    type Error = InvalidPrefixError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl AsRef<str> for Prefix {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for Prefix {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Prefix {
    type Err = InvalidPrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl Hash for Prefix {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Serialize for Prefix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Error returned when a string is not a valid document prefix.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error(
    "Invalid prefix '{0}': must start with a letter and contain only letters, digits, '_' or '-'"
)]
pub struct InvalidPrefixError(String);

/// The identifier of a requirement item.
///
/// Format: `{PREFIX}{NUMBER}`, where the number is zero-padded to the width
/// of the owning document (3 digits unless configured otherwise).
///
/// Examples: `SYS007`, `SYS042`, `USR123`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier {
    prefix: Prefix,
    number: u32,
    digits: usize,
}

impl Identifier {
    /// Create an identifier padded to the default width of 3 digits.
    #[must_use]
    pub const fn new(prefix: Prefix, number: u32) -> Self {
        Self::with_digits(prefix, number, DEFAULT_DIGITS)
    }

    /// Create an identifier padded to `digits` digits.
    ///
    /// Numbers wider than `digits` are never truncated.
    #[must_use]
    pub const fn with_digits(prefix: Prefix, number: u32, digits: usize) -> Self {
        Self {
            prefix,
            number,
            digits,
        }
    }

    /// Returns the document prefix.
    #[must_use]
    pub const fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    /// Returns the item number.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// Returns the pad width of the number.
    #[must_use]
    pub const fn digits(&self) -> usize {
        self.digits
    }

    /// Parse an identifier whose prefix is already known.
    ///
    /// This is unambiguous even when the prefix itself ends in digits
    /// (`L2` + `007`), which [`Identifier::from_str`] cannot handle.
    ///
    /// # Errors
    ///
    /// Returns an error if `s` does not start with `prefix` or the remainder
    /// is not a number.
    pub fn parse_with_prefix(s: &str, prefix: &Prefix) -> Result<Self, Error> {
        let rest = s
            .strip_prefix(prefix.as_str())
            .ok_or_else(|| Error::Syntax(s.to_string()))?;
        let number = parse_number(s, rest)?;
        Ok(Self::with_digits(prefix.clone(), number, rest.len()))
    }
}

fn parse_number(s: &str, digits: &str) -> Result<u32, Error> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::Number(s.to_string(), digits.to_string()));
    }
    digits
        .parse::<u32>()
        .map_err(|_| Error::Number(s.to_string(), digits.to_string()))
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{:0width$}",
            self.prefix,
            self.number,
            width = self.digits
        )
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Errors that can occur during identifier parsing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The identifier has no prefix, or does not start with the expected one.
    #[error("Invalid identifier format: {0}")]
    Syntax(String),

    /// The numeric part of the identifier is missing or out of range.
    #[error("Invalid number in identifier '{0}': expected digits, got '{1}'")]
    Number(String, String),

    /// The prefix part of the identifier is invalid.
    #[error(transparent)]
    Prefix(#[from] InvalidPrefixError),
}

impl FromStr for Identifier {
    type Err = Error;

    /// Splits the trailing run of ASCII digits off as the number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map_or(s.len(), |(i, _)| i);

        let (prefix_str, digits) = s.split_at(split);
        if prefix_str.is_empty() {
            return Err(Error::Syntax(s.to_string()));
        }

        let number = parse_number(s, digits)?;
        let prefix = Prefix::new(prefix_str.to_string())?;

        Ok(Self::with_digits(prefix, number, digits.len()))
    }
}

impl TryFrom<&str> for Identifier {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}
