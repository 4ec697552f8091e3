use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::{BlockId, EntryId};

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum SecretKeyError {
    #[error("Invalid base64 key data")]
    InvalidEncoding,

    #[error("Invalid key size (expected {expected} bytes, got {got})")]
    InvalidSize { expected: usize, got: usize },
}

/// Symmetric key protecting a single manifest or block. The core never
/// touches the cipher itself; it only carries the key alongside the id.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SecretKey([u8; SecretKey::SIZE]);

impl SecretKey {
    pub const SIZE: usize = 32;

    pub fn generate() -> SecretKey {
        SecretKey(rand::random())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<SecretKey, SecretKeyError> {
        let bytes: [u8; Self::SIZE] = bytes
            .try_into()
            .map_err(|_| SecretKeyError::InvalidSize { expected: Self::SIZE, got: bytes.len() })?;

        Ok(SecretKey(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; Self::SIZE] {
        &self.0
    }
}

// Key material stays out of logs and error messages.
impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

impl Serialize for SecretKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&BASE64.encode(self.0))
    }
}

impl<'de> Deserialize<'de> for SecretKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let bytes = BASE64
            .decode(&raw)
            .map_err(|_| serde::de::Error::custom(SecretKeyError::InvalidEncoding))?;

        SecretKey::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// The sole handle by which one manifest references another: the entry id
/// plus the key its blob is encrypted with.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Access {
    pub id: EntryId,
    pub key: SecretKey,
}

impl Access {
    pub fn generate() -> Access {
        Access {
            id: EntryId::generate(),
            key: SecretKey::generate(),
        }
    }
}

/// A clean block already known to the server. `digest` is the base64 hash
/// the block layer verifies on download; opaque here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAccess {
    pub id: BlockId,
    pub key: SecretKey,
    pub offset: u64,
    pub size: u64,
    pub digest: String,
}

/// A locally written block not yet flushed to the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyBlockAccess {
    pub id: BlockId,
    pub key: SecretKey,
    pub offset: u64,
    pub size: u64,
}
