use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::impl_str_serde;

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum EntryNameError {
    #[error("Invalid entry name: {0:?}")]
    SyntaxError(String),
}

/// Identifies a manifest for its whole lifetime. An entry never changes id;
/// moving an entry around the tree allocates a new one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn generate() -> EntryId {
        EntryId(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> EntryId {
        EntryId(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(EntryId(Uuid::parse_str(raw)?))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(Uuid);

impl BlockId {
    pub fn generate() -> BlockId {
        BlockId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single path segment: 1-256 bytes, no `/`, no NUL, and neither of the
/// dot entries.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryName(String);

impl EntryName {
    pub const MAX_BYTES: usize = 256;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for EntryName {
    type Err = EntryNameError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let valid = !raw.is_empty()
            && raw.len() <= Self::MAX_BYTES
            && raw != "."
            && raw != ".."
            && !raw.bytes().any(|byte| byte == b'/' || byte == b'\0');

        if !valid {
            return Err(EntryNameError::SyntaxError(raw.to_string()));
        }

        Ok(EntryName(raw.to_string()))
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl_str_serde!(EntryName);

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_entry_ids_are_unique() {
        assert_ne!(EntryId::generate(), EntryId::generate());
    }

    #[test]
    fn test_entry_id_display_round_trip() {
        let id = EntryId::generate();
        let reparsed: EntryId = id.to_string().parse().unwrap();

        assert_eq!(reparsed, id);
    }

    #[rstest]
    #[case("a.txt")]
    #[case("...")]
    #[case("with space")]
    #[case("ünicode")]
    fn test_valid_entry_names(#[case] raw: &str) {
        assert!(raw.parse::<EntryName>().is_ok());
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("..")]
    #[case("a/b")]
    #[case("a\0b")]
    fn test_invalid_entry_names(#[case] raw: &str) {
        assert!(raw.parse::<EntryName>().is_err());
    }

    #[test]
    fn test_entry_name_byte_boundary() {
        let exactly_max = "x".repeat(EntryName::MAX_BYTES);
        let one_over = "x".repeat(EntryName::MAX_BYTES + 1);

        assert!(exactly_max.parse::<EntryName>().is_ok());
        assert!(one_over.parse::<EntryName>().is_err());
    }
}
