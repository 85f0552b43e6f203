use std::fmt;

use crate::error::BootstrapError;

/// MySQL caps identifiers at 64 characters.
const MAX_IDENTIFIER_LEN: usize = 64;

/// A database name that is safe to interpolate into DDL between backticks.
///
/// Identifiers cannot be bound as parameters, so the name is checked against an
/// allow-list of ASCII letters, digits and `_` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseName(String);

impl DatabaseName {
    pub fn parse(raw: &str) -> Result<Self, BootstrapError> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_IDENTIFIER_LEN
            && raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(BootstrapError::InvalidDatabaseName(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backtick-quoted form for statement text.
    pub fn quoted(&self) -> String {
        format!("`{}`", self.0)
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DatabaseName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
