use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{domain::identifier::DEFAULT_DIGITS, import::Grammar};

/// Configuration for importing requirements into a tree.
///
/// Stored as TOML in `.req/config.toml` under the root of the requirements
/// tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The tag grammar documents are written in.
    ///
    /// The two grammars differ in whether `REQ_LINKS` is part of each record
    /// and in the spelling of the rationale tag.
    pub grammar: Grammar,

    /// The number of digits in the identifiers of newly created documents.
    ///
    /// Numbers are padded to this width with leading zeros.
    /// For example, 'SYS001' (3 digits) or 'SYS0001' (4 digits).
    digits: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grammar: Grammar::default(),
            digits: default_digits(),
        }
    }
}

impl Config {
    /// The location of the configuration file for the tree at `root`.
    #[must_use]
    pub fn path(root: &Path) -> PathBuf {
        root.join(".req").join("config.toml")
    }

    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Loads the configuration of the tree at `root`, falling back to the
    /// defaults if the tree has no configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file exists but cannot be read or
    /// parsed.
    pub fn load_or_default(root: &Path) -> Result<Self, String> {
        let path = Self::path(root);
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the number of digits for padding identifiers.
    #[must_use]
    pub const fn digits(&self) -> usize {
        self.digits
    }

    /// Sets the number of digits for padding identifiers.
    pub const fn set_digits(&mut self, digits: usize) {
        self.digits = digits;
    }
}

const fn default_digits() -> usize {
    DEFAULT_DIGITS
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        grammar: Grammar,

        #[serde(default = "default_digits")]
        digits: usize,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 { grammar, digits } => Self { grammar, digits },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            grammar: config.grammar,
            digits: config.digits,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\ngrammar = \"lite\"\ndigits = 4\n")
            .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.grammar, Grammar::Lite);
        assert_eq!(config.digits(), 4);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\ngrammar = \"verbose\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
        assert_eq!(actual.grammar, Grammar::Full);
        assert_eq!(actual.digits(), 3);
    }

    #[test]
    fn save_then_load_or_default() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join(".req")).unwrap();

        let mut config = Config::default();
        config.grammar = Grammar::Lite;
        config.set_digits(5);
        config.save(&Config::path(tmp.path())).unwrap();

        assert_eq!(Config::load_or_default(tmp.path()).unwrap(), config);
    }

    #[test]
    fn missing_config_falls_back_to_default() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(
            Config::load_or_default(tmp.path()).unwrap(),
            Config::default()
        );
    }

    #[test]
    fn invalid_config_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join(".req")).unwrap();
        std::fs::write(
            Config::path(tmp.path()),
            "_version = \"1\"\ngrammar = \"lite\"\ndigits = \"4\"\n",
        )
        .unwrap();

        let error = Config::load_or_default(tmp.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }
}
