use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::Path,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Identifier, Item};

const DELIMITER: &str = "---\n";

/// An item serialized as markdown with YAML frontmatter.
///
/// The frontmatter carries the metadata, links and attributes. Everything
/// after the closing delimiter is the item text, byte for byte.
#[derive(Debug, Clone)]
pub struct MarkdownItem {
    frontmatter: FrontMatter,
    identifier: Identifier,
    text: String,
}

impl MarkdownItem {
    fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let frontmatter = serde_yaml::to_string(&self.frontmatter)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        writer.write_all(DELIMITER.as_bytes())?;
        writer.write_all(frontmatter.as_bytes())?;
        writer.write_all(DELIMITER.as_bytes())?;
        writer.write_all(self.text.as_bytes())?;
        writer.flush()
    }

    pub(crate) fn read<R: Read>(reader: &mut R, identifier: Identifier) -> Result<Self, LoadError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;

        let rest = content.strip_prefix(DELIMITER).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                "Expected frontmatter starting with '---'",
            )
        })?;

        // The frontmatter ends at the first line consisting only of the delimiter
        let end = rest.find("\n---\n").ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "Unterminated frontmatter")
        })?;
        let (frontmatter, text) = rest.split_at(end + 1);
        let text = &text[DELIMITER.len()..];

        let frontmatter: FrontMatter = serde_yaml::from_str(frontmatter)?;

        Ok(Self {
            frontmatter,
            identifier,
            text: text.to_string(),
        })
    }

    /// Writes the item to a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written to.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer)
    }

    /// Reads an item from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path, identifier: Identifier) -> Result<Self, LoadError> {
        let mut file = File::open(path).map_err(|io_error| match io_error.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound,
            _ => LoadError::Io(io_error),
        })?;
        Self::read(&mut file, identifier)
    }
}

/// Errors that can occur when loading an item from markdown.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The item file was not found.
    #[error("item file not found")]
    NotFound,
    /// An I/O error occurred.
    #[error("failed to read item file: {0}")]
    Io(#[from] io::Error),
    /// The YAML frontmatter could not be parsed.
    #[error("invalid frontmatter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(from = "FrontMatterVersion")]
#[serde(into = "FrontMatterVersion")]
struct FrontMatter {
    uuid: Uuid,
    created: DateTime<Utc>,
    links: Vec<String>,
    attributes: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum FrontMatterVersion {
    #[serde(rename = "1")]
    V1 {
        uuid: Uuid,
        created: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        links: Vec<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attributes: BTreeMap<String, String>,
    },
}

impl From<FrontMatterVersion> for FrontMatter {
    fn from(version: FrontMatterVersion) -> Self {
        match version {
            FrontMatterVersion::V1 {
                uuid,
                created,
                links,
                attributes,
            } => Self {
                uuid,
                created,
                links,
                attributes,
            },
        }
    }
}

impl From<FrontMatter> for FrontMatterVersion {
    fn from(front_matter: FrontMatter) -> Self {
        let FrontMatter {
            uuid,
            created,
            links,
            attributes,
        } = front_matter;
        Self::V1 {
            uuid,
            created,
            links,
            attributes,
        }
    }
}

impl From<Item> for MarkdownItem {
    fn from(item: Item) -> Self {
        let Item {
            uuid,
            identifier,
            created,
            text,
            links,
            attributes,
        } = item;

        Self {
            frontmatter: FrontMatter {
                uuid,
                created,
                links,
                attributes,
            },
            identifier,
            text,
        }
    }
}

impl From<MarkdownItem> for Item {
    fn from(item: MarkdownItem) -> Self {
        let MarkdownItem {
            frontmatter:
                FrontMatter {
                    uuid,
                    created,
                    links,
                    attributes,
                },
            identifier,
            text,
        } = item;

        Self {
            uuid,
            identifier,
            created,
            text,
            links,
            attributes,
        }
    }
}
