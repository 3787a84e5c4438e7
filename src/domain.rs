//! Domain models for requirement import.
//!
//! This module contains the core domain types: document prefixes, item
//! identifiers, requirement items and the importer configuration.

mod config;
pub use config::Config;

/// Document prefixes and item identifiers.
pub mod identifier;
pub use identifier::{Error as IdentifierError, Identifier, InvalidPrefixError, Prefix};

/// Requirement items.
pub mod item;
pub use item::Item;
