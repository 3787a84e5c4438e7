use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::Identifier;

/// The attribute holding an item's rationale.
pub const RATIONALE: &str = "rationale";

/// The attribute holding an item's note.
pub const NOTE: &str = "note";

/// A single requirement within a requirement document.
///
/// Items are keyed by their [`Identifier`]. Besides the text body, an item
/// carries an ordered list of links to other items and a free-form map of
/// string attributes (`rationale`, `note`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub(crate) uuid: Uuid,
    pub(crate) identifier: Identifier,
    pub(crate) created: DateTime<Utc>,
    pub(crate) text: String,
    pub(crate) links: Vec<String>,
    pub(crate) attributes: BTreeMap<String, String>,
}

impl Item {
    /// Construct a new, empty [`Item`].
    ///
    /// A new UUID is automatically generated.
    #[must_use]
    pub fn new(identifier: Identifier) -> Self {
        Self::new_with_uuid(identifier, Uuid::new_v4())
    }

    pub(crate) fn new_with_uuid(identifier: Identifier, uuid: Uuid) -> Self {
        Self {
            uuid,
            identifier,
            created: Utc::now(),
            text: String::new(),
            links: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// The identifier of this item.
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// The item number (the numeric part of the identifier).
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.identifier.number()
    }

    /// The unique, stable identifier of this item
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// When the item was first created
    #[must_use]
    pub const fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// The body of the item.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the body of the item verbatim.
    pub fn set_text(&mut self, text: String) {
        self.text = text;
    }

    /// The references this item links to, in the order they were set.
    #[must_use]
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Replace all links on the item.
    pub fn set_links(&mut self, links: Vec<String>) {
        self.links = links;
    }

    /// Look up a named attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Set a named attribute, returning the previous value if there was one.
    pub fn set_attribute(&mut self, name: String, value: String) -> Option<String> {
        self.attributes.insert(name, value)
    }

    /// All attributes, ordered by name.
    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// The item's rationale, if set.
    #[must_use]
    pub fn rationale(&self) -> Option<&str> {
        self.attribute(RATIONALE)
    }

    /// The item's note, if set.
    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.attribute(NOTE)
    }
}
