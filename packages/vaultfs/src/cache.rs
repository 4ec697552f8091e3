use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;
use vaultfs_primitives::{Access, DeviceId, EntryId};

use crate::error::FsError;
use crate::manifest::{LocalManifest, LocalUserManifest, dump_local_manifest, load_local_manifest};
use crate::storage::{BlobStore, BlobStoreError};

/// Write-through view over the blob store. Lookups hit the in-memory map
/// first; only positive results are cached. The store write always happens
/// before the memory update, so a cancellation at the store suspension
/// point leaves both layers consistent.
pub struct ManifestCache {
    root_access: Access,
    local_author: DeviceId,
    store: Arc<dyn BlobStore>,
    entries: DashMap<EntryId, LocalManifest>,
}

impl ManifestCache {
    pub fn new(root_access: Access, local_author: DeviceId, store: Arc<dyn BlobStore>) -> ManifestCache {
        ManifestCache {
            root_access,
            local_author,
            store,
            entries: DashMap::new(),
        }
    }

    pub fn root_access(&self) -> &Access {
        &self.root_access
    }

    /// The bool is true when the manifest was just loaded (or synthesised)
    /// rather than served from memory; the owner uses it to fire
    /// workspace-loaded notifications exactly once.
    pub async fn get(&self, access: &Access) -> Result<(LocalManifest, bool), FsError> {
        if let Some(entry) = self.entries.get(&access.id) {
            return Ok((entry.clone(), false));
        }

        let manifest = match self.store.get(access).await {
            Ok(raw) => load_local_manifest(&raw)?,

            Err(BlobStoreError::Missing) => {
                if *access == self.root_access {
                    // Lazy root: the user manifest is always readable, even
                    // before the first sync ever happened.
                    debug!(author = %self.local_author, "synthesizing v0 user manifest");
                    LocalManifest::User(LocalUserManifest::new(self.local_author.clone()))
                } else {
                    return Err(FsError::LocalMiss(access.clone()));
                }
            }

            Err(error) => return Err(FsError::Storage(error)),
        };

        self.entries.insert(access.id, manifest.clone());

        Ok((manifest, true))
    }

    pub async fn set(&self, access: &Access, manifest: &LocalManifest) -> Result<(), FsError> {
        let raw = dump_local_manifest(manifest)?;

        self.store
            .set(access, raw, false)
            .await
            .map_err(FsError::Storage)?;
        self.entries.insert(access.id, manifest.clone());

        Ok(())
    }

    /// Drops the entry from both layers, typically because the remote copy
    /// changed and the local one is now outdated.
    pub async fn invalidate(&self, access: &Access) -> Result<(), FsError> {
        debug!(entry = %access.id, "invalidating manifest");

        self.store.clear(access).await.map_err(FsError::Storage)?;
        self.entries.remove(&access.id);

        Ok(())
    }
}
