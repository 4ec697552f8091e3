use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use vaultfs_primitives::{Access, EntryName};

use crate::error::FsError;
use crate::fs::LocalFolderFs;
use crate::manifest::{
    LocalFileManifest, LocalFolderManifest, LocalManifest, LocalWorkspaceManifest,
};

// An access never moves around the tree: a given access always points to
// the same path, which keeps sync notifications simple and prevents two
// paths (possibly in different workspaces) from sharing a manifest. So
// moving or copying means deep-copying the subtree under fresh accesses.
//
// The copy runs in two phases. The first walks the subtree and collects
// every access missing from the local store; if any, the whole operation
// aborts with the full list so the sync engine can prefetch atomically and
// no half-copied garbage is left behind. Only then does the second phase
// allocate accesses and write the copies bottom-up.

struct CopyNode {
    manifest: LocalManifest,
    children: BTreeMap<EntryName, CopyNode>,
}

impl LocalFolderFs {
    pub(crate) async fn recursive_manifest_copy(
        &self,
        manifest: &LocalManifest,
    ) -> Result<Access, FsError> {
        let plan = self.build_copy_plan(manifest).await?;

        self.apply_copy_plan(&plan).await
    }

    fn build_copy_plan<'a>(
        &'a self,
        manifest: &'a LocalManifest,
    ) -> Pin<Box<dyn Future<Output = Result<CopyNode, FsError>> + 'a>> {
        Box::pin(async move {
            let mut children = BTreeMap::new();
            let mut missing: Vec<Access> = Vec::new();

            if let Some(child_map) = manifest.children() {
                for (name, child_access) in child_map {
                    match self.get_manifest(child_access).await {
                        Ok(child_manifest) => match self.build_copy_plan(&child_manifest).await {
                            Ok(node) => {
                                children.insert(name.clone(), node);
                            }
                            Err(FsError::MultiLocalMiss(mut more)) => missing.append(&mut more),
                            Err(error) => return Err(error),
                        },

                        Err(FsError::LocalMiss(access)) => missing.push(access),
                        Err(error) => return Err(error),
                    }
                }
            }

            if !missing.is_empty() {
                return Err(FsError::MultiLocalMiss(missing));
            }

            Ok(CopyNode { manifest: manifest.clone(), children })
        })
    }

    fn apply_copy_plan<'a>(
        &'a self,
        node: &'a CopyNode,
    ) -> Pin<Box<dyn Future<Output = Result<Access, FsError>> + 'a>> {
        Box::pin(async move {
            let author = self.device.device_id.clone();
            let copy_access = Access::generate();

            let copy_manifest = match &node.manifest {
                LocalManifest::File(file) => LocalManifest::File(LocalFileManifest {
                    size: file.size,
                    blocks: file.blocks.clone(),
                    dirty_blocks: file.dirty_blocks.clone(),
                    ..LocalFileManifest::new(author)
                }),

                LocalManifest::Folder(_) => {
                    let mut copied_children = BTreeMap::new();

                    for (name, child_node) in &node.children {
                        let child_access = self.apply_copy_plan(child_node).await?;
                        copied_children.insert(name.clone(), child_access);
                    }

                    LocalManifest::Folder(LocalFolderManifest {
                        children: copied_children,
                        ..LocalFolderManifest::new(author)
                    })
                }

                LocalManifest::Workspace(_) => {
                    let mut copied_children = BTreeMap::new();

                    for (name, child_node) in &node.children {
                        let child_access = self.apply_copy_plan(child_node).await?;
                        copied_children.insert(name.clone(), child_access);
                    }

                    LocalManifest::Workspace(LocalWorkspaceManifest {
                        children: copied_children,
                        ..LocalWorkspaceManifest::new(author)
                    })
                }

                LocalManifest::User(_) => {
                    unreachable!("the user manifest roots the tree and is never copied")
                }
            };

            self.set_manifest(&copy_access, &copy_manifest).await?;

            Ok(copy_access)
        })
    }
}
