//! Validation of names embedded literally into generated SQL.
//!
//! Validation is a blacklist: a name is accepted unchanged unless it is blank,
//! contains whitespace, contains an ASCII control character, or contains one of
//! [`FORBIDDEN_CHARS`]. Unicode letters pass as-is.

use std::fmt;

use crate::error::{ConversionError, ConversionResult};

pub const FORBIDDEN_CHARS: &[char] = &[
    '"', '\'', ';', '[', ']', '(', ')', '\\', '/', '\n', '\r', '@', '-', '*', '%', '`',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Database,
    Schema,
    Table,
    Column,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IdentifierKind::Database => "database",
            IdentifierKind::Schema => "schema",
            IdentifierKind::Table => "table",
            IdentifierKind::Column => "column",
        };
        f.write_str(label)
    }
}

/// A name that passed [`validate`]; safe to splice into statement text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn validate(name: &str, kind: IdentifierKind) -> ConversionResult<Identifier> {
    let reject = |reason: String| ConversionError::InvalidIdentifier {
        kind,
        name: name.to_string(),
        reason,
    };

    if name.trim().is_empty() {
        return Err(reject("name is empty".to_string()));
    }
    if let Some(ch) = name.chars().find(|ch| ch.is_whitespace()) {
        return Err(reject(format!("contains whitespace {ch:?}")));
    }
    if let Some(ch) = name.chars().find(|ch| FORBIDDEN_CHARS.contains(ch)) {
        return Err(reject(format!("contains forbidden character {ch:?}")));
    }
    if let Some(ch) = name.chars().find(|&ch| (ch as u32) < 32) {
        return Err(reject(format!("contains control character {ch:?}")));
    }
    Ok(Identifier(name.to_string()))
}

pub fn validate_columns(columns: &[String]) -> ConversionResult<Vec<Identifier>> {
    columns
        .iter()
        .map(|column| validate(column, IdentifierKind::Column))
        .collect()
}
