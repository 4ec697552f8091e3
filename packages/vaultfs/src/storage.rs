use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use vaultfs_primitives::{Access, EntryId};

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum BlobStoreError {
    #[error("No blob stored for this access")]
    Missing,

    #[error("Blob store failure: {0}")]
    Internal(String),
}

/// Key→bytes store holding the serialized manifests, keyed by access. The
/// production implementation encrypts each blob with the access key before
/// it touches disk; the core only sees plaintext bytes. Reads and writes
/// may suspend: this is the single suspension point of every filesystem
/// operation.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, access: &Access) -> Result<Bytes, BlobStoreError>;

    /// `durable` requests an fsync-grade write; best-effort stores may
    /// ignore it.
    async fn set(&self, access: &Access, raw: Bytes, durable: bool) -> Result<(), BlobStoreError>;

    /// Idempotent: clearing an absent blob is not an error.
    async fn clear(&self, access: &Access) -> Result<(), BlobStoreError>;
}

/// In-memory store, used as the test double and during bootstrap before a
/// disk-backed store is configured.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<EntryId, Bytes>,
}

impl MemoryBlobStore {
    pub fn new() -> MemoryBlobStore {
        MemoryBlobStore::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, access: &Access) -> Result<Bytes, BlobStoreError> {
        self.blobs
            .get(&access.id)
            .map(|blob| blob.clone())
            .ok_or(BlobStoreError::Missing)
    }

    async fn set(&self, access: &Access, raw: Bytes, _durable: bool) -> Result<(), BlobStoreError> {
        self.blobs.insert(access.id, raw);
        Ok(())
    }

    async fn clear(&self, access: &Access) -> Result<(), BlobStoreError> {
        self.blobs.remove(&access.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryBlobStore::new();
        let access = Access::generate();

        assert_eq!(store.get(&access).await, Err(BlobStoreError::Missing));

        store.set(&access, Bytes::from_static(b"blob"), false).await.unwrap();
        assert_eq!(store.get(&access).await.unwrap(), Bytes::from_static(b"blob"));

        store.clear(&access).await.unwrap();
        assert_eq!(store.get(&access).await, Err(BlobStoreError::Missing));

        // clearing twice stays fine
        store.clear(&access).await.unwrap();
    }
}
