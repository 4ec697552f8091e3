use std::collections::BTreeMap;

use tracing::debug;
use vaultfs_primitives::{Access, FsPath};

use crate::error::FsError;
use crate::events::FsEvent;
use crate::fs::LocalFolderFs;
use crate::manifest::{
    LocalFileManifest, LocalFolderManifest, LocalManifest, LocalWorkspaceManifest,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DeleteExpect {
    Anything,
    File,
    Folder,
}

impl LocalFolderFs {
    /// Creates an empty file at `path`.
    pub async fn touch(&self, path: &FsPath) -> Result<(), FsError> {
        let manifest = LocalManifest::File(LocalFileManifest::new(self.device.device_id.clone()));

        self.create_entry(path, manifest).await
    }

    /// Creates an empty folder at `path`.
    pub async fn mkdir(&self, path: &FsPath) -> Result<(), FsError> {
        let manifest =
            LocalManifest::Folder(LocalFolderManifest::new(self.device.device_id.clone()));

        self.create_entry(path, manifest).await
    }

    async fn create_entry(&self, path: &FsPath, child_manifest: LocalManifest) -> Result<(), FsError> {
        let Some(name) = path.name() else {
            return Err(FsError::Exists(path.clone()));
        };

        if path.parent().is_root() {
            return Err(FsError::PermissionDenied {
                path: path.clone(),
                dst: None,
                reason: "only workspaces are allowed at root level",
            });
        }

        let parent = path.parent();
        let (parent_access, parent_manifest) = self.retrieve_entry(&parent, None).await?;

        let Some(children) = parent_manifest.children() else {
            return Err(FsError::NotADirectory(parent));
        };

        if children.contains_key(name) {
            return Err(FsError::Exists(path.clone()));
        }

        let child_access = Access::generate();
        let parent_manifest = parent_manifest.evolve_children_and_mark_updated(
            BTreeMap::from([(name.clone(), Some(child_access.clone()))]),
        );

        self.set_manifest(&parent_access, &parent_manifest).await?;
        self.set_manifest(&child_access, &child_manifest).await?;

        debug!(path = %path, entry = %child_access.id, "created entry");
        self.event_bus.send(FsEvent::EntryUpdated { id: parent_access.id });
        self.event_bus.send(FsEvent::EntryUpdated { id: child_access.id });

        Ok(())
    }

    /// Creates a workspace, necessarily as a direct child of the root.
    pub async fn workspace_create(&self, path: &FsPath) -> Result<(), FsError> {
        let Some(name) = path.name() else {
            return Err(FsError::Exists(path.clone()));
        };

        if !path.parent().is_root() {
            return Err(FsError::PermissionDenied {
                path: path.clone(),
                dst: None,
                reason: "workspaces are only allowed at root level",
            });
        }

        let root_access = self.cache.root_access().clone();
        let root_manifest = self.get_user_manifest().await?;

        if root_manifest
            .children()
            .is_some_and(|children| children.contains_key(name))
        {
            return Err(FsError::Exists(path.clone()));
        }

        let child_access = Access::generate();
        let child_manifest =
            LocalManifest::Workspace(LocalWorkspaceManifest::new(self.device.device_id.clone()));
        let root_manifest = root_manifest.evolve_children_and_mark_updated(
            BTreeMap::from([(name.clone(), Some(child_access.clone()))]),
        );

        self.set_manifest(&root_access, &root_manifest).await?;
        self.set_manifest(&child_access, &child_manifest).await?;

        debug!(path = %path, workspace = %child_access.id, "created workspace");
        self.event_bus.send(FsEvent::EntryUpdated { id: root_access.id });
        self.event_bus.send(FsEvent::EntryUpdated { id: child_access.id });
        self.event_bus.send(FsEvent::WorkspaceLoaded {
            path: path.clone(),
            id: child_access.id,
        });

        Ok(())
    }

    /// The one rename that keeps the entry's access: a workspace's identity
    /// takes part in multi-user sharing, so renaming it only rewrites the
    /// root manifest's children mapping.
    pub async fn workspace_rename(&self, src: &FsPath, dst: &FsPath) -> Result<(), FsError> {
        let (_, src_manifest) = self.retrieve_entry(src, None).await?;

        if !src_manifest.is_workspace() {
            return Err(FsError::PermissionDenied {
                path: src.clone(),
                dst: Some(dst.clone()),
                reason: "not a workspace",
            });
        }

        if !dst.parent().is_root() {
            return Err(FsError::PermissionDenied {
                path: src.clone(),
                dst: Some(dst.clone()),
                reason: "workspaces must stay direct children of the root",
            });
        }

        let (Some(src_name), Some(dst_name)) = (src.name(), dst.name()) else {
            return Err(FsError::Exists(dst.clone()));
        };

        let root_access = self.cache.root_access().clone();
        let root_manifest = self.get_user_manifest().await?;

        let Some(children) = root_manifest.children() else {
            return Err(FsError::NotADirectory(FsPath::root()));
        };

        if children.contains_key(dst_name) {
            return Err(FsError::Exists(dst.clone()));
        }

        let moved_access = children
            .get(src_name)
            .cloned()
            .ok_or_else(|| FsError::NotFound(src.clone()))?;

        // The workspace's own manifest is untouched; only the mapping moves.
        let root_manifest = root_manifest.evolve_children_and_mark_updated(BTreeMap::from([
            (dst_name.clone(), Some(moved_access)),
            (src_name.clone(), None),
        ]));

        self.set_manifest(&root_access, &root_manifest).await?;

        debug!(src = %src, dst = %dst, "renamed workspace");
        self.event_bus.send(FsEvent::EntryUpdated { id: root_access.id });

        Ok(())
    }

    /// Removes a file or an empty folder.
    pub async fn delete(&self, path: &FsPath) -> Result<(), FsError> {
        self.delete_entry(path, DeleteExpect::Anything).await
    }

    /// Removes a file; refuses folders.
    pub async fn unlink(&self, path: &FsPath) -> Result<(), FsError> {
        self.delete_entry(path, DeleteExpect::File).await
    }

    /// Removes an empty folder; refuses files.
    pub async fn rmdir(&self, path: &FsPath) -> Result<(), FsError> {
        self.delete_entry(path, DeleteExpect::Folder).await
    }

    async fn delete_entry(&self, path: &FsPath, expect: DeleteExpect) -> Result<(), FsError> {
        let Some(name) = path.name() else {
            return Err(FsError::PermissionDenied {
                path: path.clone(),
                dst: None,
                reason: "cannot delete the root",
            });
        };

        let parent = path.parent();
        let (parent_access, parent_manifest) = self.retrieve_entry(&parent, None).await?;

        let Some(children) = parent_manifest.children() else {
            return Err(FsError::NotADirectory(parent));
        };

        let item_access = children
            .get(name)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.clone()))?;
        let item_manifest = self.get_manifest(&item_access).await?;

        if let Some(item_children) = item_manifest.children() {
            if expect == DeleteExpect::File {
                return Err(FsError::IsADirectory(path.clone()));
            }
            if !item_children.is_empty() {
                return Err(FsError::DirectoryNotEmpty(path.clone()));
            }
        } else if expect == DeleteExpect::Folder {
            return Err(FsError::NotADirectory(path.clone()));
        }

        let parent_manifest = parent_manifest
            .evolve_children_and_mark_updated(BTreeMap::from([(name.clone(), None)]));

        self.set_manifest(&parent_access, &parent_manifest).await?;

        debug!(path = %path, entry = %item_access.id, "unlinked entry");
        self.event_bus.send(FsEvent::EntryUpdated { id: parent_access.id });

        Ok(())
    }

    /// Relocates `src` to `dst`. The moved entry gets a fresh access (see
    /// [`LocalFolderFs::copy_entry`]); only workspaces keep theirs, through
    /// [`LocalFolderFs::workspace_rename`].
    pub async fn move_entry(&self, src: &FsPath, dst: &FsPath) -> Result<(), FsError> {
        self.transfer(src, dst, true).await
    }

    /// Recursive deep copy of `src` at `dst`. Every copied manifest gets a
    /// fresh access and restarts its sync lifetime as a placeholder.
    pub async fn copy_entry(&self, src: &FsPath, dst: &FsPath) -> Result<(), FsError> {
        self.transfer(src, dst, false).await
    }

    async fn transfer(&self, src: &FsPath, dst: &FsPath, delete_src: bool) -> Result<(), FsError> {
        let parent_src = src.parent();
        let parent_dst = dst.parent();

        // Moving or overwriting the root is never allowed, but resolution
        // errors on the other side take precedence.
        let (Some(src_name), Some(dst_name)) = (src.name(), dst.name()) else {
            return self.reject_root_transfer(src, dst).await;
        };

        if src == dst {
            let (_, src_manifest) = self.retrieve_entry(src, None).await?;

            if src_manifest.is_workspace() {
                return Err(FsError::PermissionDenied {
                    path: src.clone(),
                    dst: Some(dst.clone()),
                    reason: "cannot move or copy a workspace, rename it instead",
                });
            }

            return Ok(());
        }

        if parent_src == parent_dst {
            let (parent_access, parent_manifest) = self.retrieve_entry(&parent_src, None).await?;

            let Some(children) = parent_manifest.children() else {
                return Err(FsError::NotADirectory(parent_src));
            };

            if dst.starts_with(src) {
                return Err(FsError::InvalidArgument { src: src.clone(), dst: dst.clone() });
            }

            let src_access = children
                .get(src_name)
                .cloned()
                .ok_or_else(|| FsError::NotFound(src.clone()))?;
            let existing_dst_access = children.get(dst_name).cloned();

            let src_manifest = self.get_manifest(&src_access).await?;

            self.check_transfer_conflicts(&src_manifest, existing_dst_access, src, dst)
                .await?;

            let moved_access = self.recursive_manifest_copy(&src_manifest).await?;

            let mut changes = BTreeMap::from([(dst_name.clone(), Some(moved_access))]);
            if delete_src {
                changes.insert(src_name.clone(), None);
            }
            let parent_manifest = parent_manifest.evolve_children_and_mark_updated(changes);

            self.set_manifest(&parent_access, &parent_manifest).await?;

            debug!(src = %src, dst = %dst, delete_src, "transferred entry");
            self.event_bus.send(FsEvent::EntryUpdated { id: parent_access.id });

            return Ok(());
        }

        if parent_dst.is_root() {
            return Err(FsError::PermissionDenied {
                path: src.clone(),
                dst: Some(dst.clone()),
                reason: "only workspaces can live at root level",
            });
        }

        let (parent_src_access, parent_src_manifest) =
            self.retrieve_entry(&parent_src, None).await?;

        let Some(src_children) = parent_src_manifest.children() else {
            return Err(FsError::NotADirectory(parent_src));
        };

        let (parent_dst_access, parent_dst_manifest) =
            self.retrieve_entry(&parent_dst, None).await?;

        let Some(dst_children) = parent_dst_manifest.children() else {
            return Err(FsError::NotADirectory(parent_dst));
        };

        if dst.starts_with(src) {
            return Err(FsError::InvalidArgument { src: src.clone(), dst: dst.clone() });
        }

        let src_access = src_children
            .get(src_name)
            .cloned()
            .ok_or_else(|| FsError::NotFound(src.clone()))?;
        let existing_dst_access = dst_children.get(dst_name).cloned();

        let src_manifest = self.get_manifest(&src_access).await?;

        self.check_transfer_conflicts(&src_manifest, existing_dst_access, src, dst)
            .await?;

        let moved_access = self.recursive_manifest_copy(&src_manifest).await?;

        let parent_dst_manifest = parent_dst_manifest.evolve_children_and_mark_updated(
            BTreeMap::from([(dst_name.clone(), Some(moved_access))]),
        );

        self.set_manifest(&parent_dst_access, &parent_dst_manifest).await?;

        debug!(src = %src, dst = %dst, delete_src, "transferred entry");
        self.event_bus.send(FsEvent::EntryUpdated { id: parent_dst_access.id });

        if delete_src {
            let parent_src_manifest = parent_src_manifest
                .evolve_children_and_mark_updated(BTreeMap::from([(src_name.clone(), None)]));

            self.set_manifest(&parent_src_access, &parent_src_manifest).await?;
            self.event_bus.send(FsEvent::EntryUpdated { id: parent_src_access.id });
        }

        Ok(())
    }

    async fn reject_root_transfer(&self, src: &FsPath, dst: &FsPath) -> Result<(), FsError> {
        let other_parent = if src.is_root() { dst.parent() } else { src.parent() };
        let (_, other_parent_manifest) = self.retrieve_entry(&other_parent, None).await?;

        if !other_parent_manifest.is_folderish() {
            return Err(FsError::NotADirectory(other_parent));
        }

        Err(FsError::PermissionDenied {
            path: src.clone(),
            dst: Some(dst.clone()),
            reason: "cannot move or overwrite the root",
        })
    }

    async fn check_transfer_conflicts(
        &self,
        src_manifest: &LocalManifest,
        existing_dst_access: Option<Access>,
        src: &FsPath,
        dst: &FsPath,
    ) -> Result<(), FsError> {
        if src_manifest.is_workspace() {
            return Err(FsError::PermissionDenied {
                path: src.clone(),
                dst: Some(dst.clone()),
                reason: "cannot move or copy a workspace, rename it instead",
            });
        }

        let Some(existing_access) = existing_dst_access else {
            return Ok(());
        };

        let existing_manifest = self.get_manifest(&existing_access).await?;

        if src_manifest.is_folderish() {
            if existing_manifest.is_file() {
                return Err(FsError::NotADirectory(dst.clone()));
            }
            if existing_manifest
                .children()
                .is_some_and(|children| !children.is_empty())
            {
                return Err(FsError::DirectoryNotEmpty(dst.clone()));
            }
        } else if existing_manifest.is_folderish() {
            return Err(FsError::IsADirectory(dst.clone()));
        }

        Ok(())
    }
}
