use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use vaultfs_primitives::{Access, DeviceId, EntryId, EntryName, FsPath, UserId};

use crate::cache::ManifestCache;
use crate::device::LocalDevice;
use crate::error::FsError;
use crate::events::{EventBus, FsEvent};
use crate::manifest::LocalManifest;
use crate::storage::BlobStore;

mod copy;
mod mutate;
mod resolve;

pub use resolve::HopCollector;

/// The local view of the user's manifest tree: a path resolver and a set of
/// POSIX-flavoured mutations layered over the manifest cache. Every write
/// goes through the cache (store first, memory second) and events fire only
/// once all writes of an operation have landed.
pub struct LocalFolderFs {
    device: LocalDevice,
    cache: ManifestCache,
    event_bus: EventBus,
}

/// Type-tagged metadata snapshot, the `stat(2)` of the manifest tree.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryStat {
    File {
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
        base_version: u32,
        is_placeholder: bool,
        need_sync: bool,
        size: u64,
    },
    Folder {
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
        base_version: u32,
        is_placeholder: bool,
        need_sync: bool,
        children: Vec<EntryName>,
    },
    Root {
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
        base_version: u32,
        is_placeholder: bool,
        need_sync: bool,
        children: Vec<EntryName>,
    },
    Workspace {
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
        base_version: u32,
        is_placeholder: bool,
        need_sync: bool,
        children: Vec<EntryName>,
        creator: UserId,
        participants: Vec<UserId>,
    },
}

impl EntryStat {
    pub fn is_folder(&self) -> bool {
        !matches!(self, EntryStat::File { .. })
    }

    pub fn children(&self) -> Option<&[EntryName]> {
        match self {
            EntryStat::File { .. } => None,
            EntryStat::Folder { children, .. }
            | EntryStat::Root { children, .. }
            | EntryStat::Workspace { children, .. } => Some(children),
        }
    }

    pub fn updated(&self) -> DateTime<Utc> {
        match self {
            EntryStat::File { updated, .. }
            | EntryStat::Folder { updated, .. }
            | EntryStat::Root { updated, .. }
            | EntryStat::Workspace { updated, .. } => *updated,
        }
    }

    pub fn need_sync(&self) -> bool {
        match self {
            EntryStat::File { need_sync, .. }
            | EntryStat::Folder { need_sync, .. }
            | EntryStat::Root { need_sync, .. }
            | EntryStat::Workspace { need_sync, .. } => *need_sync,
        }
    }
}

/// What the sync engine should upload below a given entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncPlan {
    /// The entry itself only.
    Shallow,
    /// The entry and its whole subtree.
    Recursive,
    /// The entry plus the named children, each with its own plan.
    Children(BTreeMap<EntryName, SyncPlan>),
}

impl LocalFolderFs {
    pub fn new(device: LocalDevice, store: Arc<dyn BlobStore>, event_bus: EventBus) -> LocalFolderFs {
        let cache = ManifestCache::new(
            device.user_manifest_access.clone(),
            device.device_id.clone(),
            store,
        );

        LocalFolderFs { device, cache, event_bus }
    }

    pub fn root_access(&self) -> &Access {
        self.cache.root_access()
    }

    pub fn local_author(&self) -> &DeviceId {
        &self.device.device_id
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Cache read. Loading a workspace manifest for the first time makes it
    /// visible, which is announced on the bus.
    pub async fn get_manifest(&self, access: &Access) -> Result<LocalManifest, FsError> {
        let (manifest, freshly_loaded) = self.cache.get(access).await?;

        if freshly_loaded && manifest.is_workspace() {
            // Resolving the path can fail when the manifest was fetched by
            // bare access before its parent linked it; no event then.
            if let Ok((path, _, _)) = self.get_entry_path(access.id).await {
                self.event_bus.send(FsEvent::WorkspaceLoaded { path, id: access.id });
            }
        }

        Ok(manifest)
    }

    /// Write-through used by every mutation, and by the sync engine when it
    /// merges a remote manifest in.
    pub async fn set_manifest(&self, access: &Access, manifest: &LocalManifest) -> Result<(), FsError> {
        self.cache.set(access, manifest).await
    }

    /// Drops the local copy; the next read will surface a `LocalMiss` the
    /// sync engine resolves with a fresh fetch.
    pub async fn mark_outdated_manifest(&self, access: &Access) -> Result<(), FsError> {
        self.cache.invalidate(access).await
    }

    /// The root manifest is always available thanks to the lazy-root rule,
    /// hence no `LocalMiss` can come out of here.
    pub async fn get_user_manifest(&self) -> Result<LocalManifest, FsError> {
        let root_access = self.cache.root_access().clone();

        self.get_manifest(&root_access).await
    }

    /// Reverse lookup: the path currently leading to the entry. Walks the
    /// whole locally-known tree, skipping unfetched subtrees.
    pub async fn get_entry_path(
        &self,
        entry_id: EntryId,
    ) -> Result<(FsPath, Access, LocalManifest), FsError> {
        let root_access = self.cache.root_access().clone();

        let mut stack = vec![(FsPath::root(), root_access)];

        while let Some((path, access)) = stack.pop() {
            let manifest = match self.cache.get(&access).await {
                Ok((manifest, _)) => manifest,
                Err(FsError::LocalMiss(_)) => continue,
                Err(error) => return Err(error),
            };

            if access.id == entry_id {
                return Ok((path, access, manifest));
            }

            if let Some(children) = manifest.children() {
                for (name, child_access) in children {
                    stack.push((path.join(name.clone()), child_access.clone()));
                }
            }
        }

        Err(FsError::EntryNotFound(entry_id))
    }

    /// The notification topic for a change at `path`: the id of the
    /// containing workspace, or the root id when the user manifest itself
    /// is the target.
    pub async fn get_beacon(&self, path: &FsPath) -> Result<EntryId, FsError> {
        let Some(workspace_name) = path.parts().first() else {
            return Ok(self.cache.root_access().id);
        };

        let workspace_path = FsPath::root().join(workspace_name.clone());
        let (access, manifest) = self.retrieve_entry(&workspace_path, None).await?;
        debug_assert!(manifest.is_workspace());

        Ok(access.id)
    }

    /// Every topic this device can currently be notified on: the root plus
    /// each locally-known workspace. Workspaces whose manifest is not in
    /// the local store are skipped, not failed on.
    pub async fn get_local_beacons(&self) -> Result<Vec<EntryId>, FsError> {
        let mut beacons = vec![self.cache.root_access().id];

        let root_manifest = self.get_user_manifest().await?;
        let Some(children) = root_manifest.children() else {
            return Ok(beacons);
        };

        for child_access in children.values() {
            match self.get_manifest(child_access).await {
                Ok(manifest) if manifest.is_workspace() => beacons.push(child_access.id),
                Ok(_) => {}
                Err(FsError::LocalMiss(_)) => continue,
                Err(error) => return Err(error),
            }
        }

        Ok(beacons)
    }

    pub async fn stat(&self, path: &FsPath) -> Result<EntryStat, FsError> {
        let (_, manifest) = self.retrieve_entry(path, None).await?;

        Ok(match manifest {
            LocalManifest::File(file) => EntryStat::File {
                created: file.created,
                updated: file.updated,
                base_version: file.base_version,
                is_placeholder: file.is_placeholder,
                need_sync: file.need_sync,
                size: file.size,
            },

            LocalManifest::Workspace(workspace) => EntryStat::Workspace {
                created: workspace.created,
                updated: workspace.updated,
                base_version: workspace.base_version,
                is_placeholder: workspace.is_placeholder,
                need_sync: workspace.need_sync,
                children: workspace.children.keys().cloned().collect(),
                creator: workspace.creator,
                participants: workspace.participants,
            },

            // Plain folders and the user manifest share a shape; only the
            // path tells the root apart.
            folderish => {
                let children = folderish
                    .children()
                    .map(|children| children.keys().cloned().collect())
                    .unwrap_or_default();

                if path.is_root() {
                    EntryStat::Root {
                        created: folderish.created(),
                        updated: folderish.updated(),
                        base_version: folderish.base_version(),
                        is_placeholder: folderish.is_placeholder(),
                        need_sync: folderish.need_sync(),
                        children,
                    }
                } else {
                    EntryStat::Folder {
                        created: folderish.created(),
                        updated: folderish.updated(),
                        base_version: folderish.base_version(),
                        is_placeholder: folderish.is_placeholder(),
                        need_sync: folderish.need_sync(),
                        children,
                    }
                }
            }
        })
    }

    /// Placeholders cannot be synced on their own: the shallowest
    /// placeholder on the way to `path` becomes the entry to sync, and the
    /// plan is nested under the hops leading back down to `path`. With no
    /// placeholder in the way the request is returned untouched.
    pub async fn get_sync_strategy(
        &self,
        path: &FsPath,
        plan: SyncPlan,
    ) -> Result<(FsPath, SyncPlan), FsError> {
        let mut sync_path = None;

        for prefix in path.prefixes() {
            let (_, manifest) = self.retrieve_entry(&prefix, None).await?;

            if manifest.is_placeholder() {
                sync_path = Some(prefix);
                break;
            }
        }

        let Some(sync_path) = sync_path else {
            return Ok((path.clone(), plan));
        };

        let mut wrapped = plan;

        for prefix in path.prefixes().rev() {
            if prefix == sync_path {
                break;
            }

            let Some(name) = prefix.name() else {
                break;
            };

            wrapped = SyncPlan::Children(BTreeMap::from([(name.clone(), wrapped)]));
        }

        Ok((sync_path, wrapped))
    }

    /// Debug snapshot of the whole locally-known tree, accesses included.
    pub async fn dump(&self) -> Result<Value, FsError> {
        let root_access = self.cache.root_access().clone();

        self.dump_entry(&root_access).await
    }

    fn dump_entry<'a>(
        &'a self,
        access: &'a Access,
    ) -> Pin<Box<dyn Future<Output = Result<Value, FsError>> + 'a>> {
        Box::pin(async move {
            let access_value = serde_json::to_value(access)
                .map_err(crate::manifest::SerdeError::from)?;

            let manifest = match self.cache.get(access).await {
                Ok((manifest, _)) => manifest,
                Err(FsError::LocalMiss(_)) => {
                    return Ok(serde_json::json!({ "access": access_value }));
                }
                Err(error) => return Err(error),
            };

            let mut dumped = serde_json::to_value(&manifest)
                .map_err(crate::manifest::SerdeError::from)?;

            if let Some(children) = manifest.children() {
                let mut dumped_children = serde_json::Map::new();

                for (name, child_access) in children {
                    dumped_children.insert(
                        name.to_string(),
                        self.dump_entry(child_access).await?,
                    );
                }

                dumped["children"] = Value::Object(dumped_children);
            }

            dumped["access"] = access_value;

            Ok(dumped)
        })
    }
}
