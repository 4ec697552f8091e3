use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::manifest::{LocalManifest, RemoteManifest};

/// Schema version of the on-disk envelope. Readers reject anything else.
pub const FORMAT_VERSION: u32 = 1;

#[derive(thiserror::Error, Clone, Debug)]
pub enum SerdeError {
    #[error("Invalid manifest data ({0})")]
    InvalidData(#[from] Arc<serde_json::Error>),

    #[error("Missing serialization format field")]
    MissingFormat,

    #[error("Unknown serialization format ({0})")]
    UnknownFormat(u64),

    #[error("Remote manifest version must be at least 1 (got {0})")]
    InvalidVersion(u32),
}

impl From<serde_json::Error> for SerdeError {
    fn from(error: serde_json::Error) -> Self {
        SerdeError::InvalidData(Arc::new(error))
    }
}

// The envelope is `{ "format": 1, "type": "<variant>", ...fields }`. The
// `type` tag comes from the manifest enums themselves; `format` is spliced
// in here so the variant types stay schema-agnostic.

fn seal(mut value: Value) -> Result<Bytes, SerdeError> {
    if let Value::Object(ref mut fields) = value {
        fields.insert("format".to_string(), FORMAT_VERSION.into());
    }

    Ok(Bytes::from(serde_json::to_vec(&value)?))
}

fn unseal(raw: &[u8]) -> Result<Value, SerdeError> {
    let value: Value = serde_json::from_slice(raw)?;

    let format = value
        .get("format")
        .and_then(Value::as_u64)
        .ok_or(SerdeError::MissingFormat)?;

    if format != FORMAT_VERSION as u64 {
        return Err(SerdeError::UnknownFormat(format));
    }

    Ok(value)
}

pub fn dump_local_manifest(manifest: &LocalManifest) -> Result<Bytes, SerdeError> {
    seal(serde_json::to_value(manifest)?)
}

pub fn load_local_manifest(raw: &[u8]) -> Result<LocalManifest, SerdeError> {
    Ok(serde_json::from_value(unseal(raw)?)?)
}

pub fn dump_remote_manifest(manifest: &RemoteManifest) -> Result<Bytes, SerdeError> {
    seal(serde_json::to_value(manifest)?)
}

pub fn load_remote_manifest(raw: &[u8]) -> Result<RemoteManifest, SerdeError> {
    let manifest: RemoteManifest = serde_json::from_value(unseal(raw)?)?;

    if manifest.version() == 0 {
        return Err(SerdeError::InvalidVersion(0));
    }

    Ok(manifest)
}
