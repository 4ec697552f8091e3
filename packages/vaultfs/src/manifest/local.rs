use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vaultfs_primitives::{Access, BlockAccess, DeviceId, DirtyBlockAccess, EntryName, UserId};

use crate::manifest::remote::{
    FileManifest, FolderManifest, RemoteManifest, UserManifest, WorkspaceManifest,
};

// Local manifests are immutable values: every mutation goes through an
// `evolve_*` method returning a new value. A freshly created manifest is a
// placeholder (never seen by the server) at version 0 with `need_sync`
// raised.

fn merge_children(
    base: &BTreeMap<EntryName, Access>,
    changes: BTreeMap<EntryName, Option<Access>>,
) -> BTreeMap<EntryName, Access> {
    let mut merged = base.clone();

    for (name, access) in changes {
        match access {
            Some(access) => {
                merged.insert(name, access);
            }
            None => {
                merged.remove(&name);
            }
        }
    }

    merged
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalFileManifest {
    pub author: DeviceId,
    pub base_version: u32,
    pub need_sync: bool,
    pub is_placeholder: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub size: u64,
    pub blocks: Vec<BlockAccess>,
    pub dirty_blocks: Vec<DirtyBlockAccess>,
}

impl LocalFileManifest {
    pub fn new(author: DeviceId) -> LocalFileManifest {
        let now = Utc::now();

        LocalFileManifest {
            author,
            base_version: 0,
            need_sync: true,
            is_placeholder: true,
            created: now,
            updated: now,
            size: 0,
            blocks: Vec::new(),
            dirty_blocks: Vec::new(),
        }
    }

    pub fn to_remote(&self) -> FileManifest {
        FileManifest {
            author: self.author.clone(),
            version: self.base_version,
            created: self.created,
            updated: self.updated,
            size: self.size,
            blocks: self.blocks.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalFolderManifest {
    pub author: DeviceId,
    pub base_version: u32,
    pub need_sync: bool,
    pub is_placeholder: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub children: BTreeMap<EntryName, Access>,
}

impl LocalFolderManifest {
    pub fn new(author: DeviceId) -> LocalFolderManifest {
        let now = Utc::now();

        LocalFolderManifest {
            author,
            base_version: 0,
            need_sync: true,
            is_placeholder: true,
            created: now,
            updated: now,
            children: BTreeMap::new(),
        }
    }

    pub fn evolve_children_and_mark_updated(
        &self,
        changes: BTreeMap<EntryName, Option<Access>>,
    ) -> LocalFolderManifest {
        LocalFolderManifest {
            children: merge_children(&self.children, changes),
            updated: Utc::now(),
            need_sync: true,
            ..self.clone()
        }
    }

    pub fn evolve_children(&self, changes: BTreeMap<EntryName, Option<Access>>) -> LocalFolderManifest {
        LocalFolderManifest {
            children: merge_children(&self.children, changes),
            ..self.clone()
        }
    }

    pub fn to_remote(&self) -> FolderManifest {
        FolderManifest {
            author: self.author.clone(),
            version: self.base_version,
            created: self.created,
            updated: self.updated,
            children: self.children.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalWorkspaceManifest {
    pub author: DeviceId,
    pub base_version: u32,
    pub need_sync: bool,
    pub is_placeholder: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub children: BTreeMap<EntryName, Access>,
    pub creator: UserId,
    pub participants: Vec<UserId>,
}

impl LocalWorkspaceManifest {
    pub fn new(author: DeviceId) -> LocalWorkspaceManifest {
        let now = Utc::now();
        let creator = author.user_id();

        LocalWorkspaceManifest {
            author,
            base_version: 0,
            need_sync: true,
            is_placeholder: true,
            created: now,
            updated: now,
            children: BTreeMap::new(),
            participants: vec![creator.clone()],
            creator,
        }
    }

    pub fn evolve_children_and_mark_updated(
        &self,
        changes: BTreeMap<EntryName, Option<Access>>,
    ) -> LocalWorkspaceManifest {
        LocalWorkspaceManifest {
            children: merge_children(&self.children, changes),
            updated: Utc::now(),
            need_sync: true,
            ..self.clone()
        }
    }

    pub fn evolve_children(
        &self,
        changes: BTreeMap<EntryName, Option<Access>>,
    ) -> LocalWorkspaceManifest {
        LocalWorkspaceManifest {
            children: merge_children(&self.children, changes),
            ..self.clone()
        }
    }

    pub fn to_remote(&self) -> WorkspaceManifest {
        WorkspaceManifest {
            author: self.author.clone(),
            version: self.base_version,
            created: self.created,
            updated: self.updated,
            children: self.children.clone(),
            creator: self.creator.clone(),
            participants: self.participants.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalUserManifest {
    pub author: DeviceId,
    pub base_version: u32,
    pub need_sync: bool,
    pub is_placeholder: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub children: BTreeMap<EntryName, Access>,
    pub last_processed_message: u32,
}

impl LocalUserManifest {
    pub fn new(author: DeviceId) -> LocalUserManifest {
        let now = Utc::now();

        LocalUserManifest {
            author,
            base_version: 0,
            need_sync: true,
            is_placeholder: true,
            created: now,
            updated: now,
            children: BTreeMap::new(),
            last_processed_message: 0,
        }
    }

    pub fn evolve_children_and_mark_updated(
        &self,
        changes: BTreeMap<EntryName, Option<Access>>,
    ) -> LocalUserManifest {
        LocalUserManifest {
            children: merge_children(&self.children, changes),
            updated: Utc::now(),
            need_sync: true,
            ..self.clone()
        }
    }

    pub fn evolve_children(&self, changes: BTreeMap<EntryName, Option<Access>>) -> LocalUserManifest {
        LocalUserManifest {
            children: merge_children(&self.children, changes),
            ..self.clone()
        }
    }

    pub fn to_remote(&self) -> UserManifest {
        UserManifest {
            author: self.author.clone(),
            version: self.base_version,
            created: self.created,
            updated: self.updated,
            children: self.children.clone(),
            last_processed_message: self.last_processed_message,
        }
    }
}

/// The four local manifest shapes, tagged with the same discriminants the
/// on-disk envelope uses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LocalManifest {
    #[serde(rename = "local_file_manifest")]
    File(LocalFileManifest),

    #[serde(rename = "local_folder_manifest")]
    Folder(LocalFolderManifest),

    #[serde(rename = "local_workspace_manifest")]
    Workspace(LocalWorkspaceManifest),

    #[serde(rename = "local_user_manifest")]
    User(LocalUserManifest),
}

impl LocalManifest {
    pub fn is_file(&self) -> bool {
        matches!(self, LocalManifest::File(_))
    }

    /// Anything carrying a children mapping: folder, workspace or user.
    pub fn is_folderish(&self) -> bool {
        !self.is_file()
    }

    pub fn is_workspace(&self) -> bool {
        matches!(self, LocalManifest::Workspace(_))
    }

    pub fn author(&self) -> &DeviceId {
        match self {
            LocalManifest::File(manifest) => &manifest.author,
            LocalManifest::Folder(manifest) => &manifest.author,
            LocalManifest::Workspace(manifest) => &manifest.author,
            LocalManifest::User(manifest) => &manifest.author,
        }
    }

    pub fn base_version(&self) -> u32 {
        match self {
            LocalManifest::File(manifest) => manifest.base_version,
            LocalManifest::Folder(manifest) => manifest.base_version,
            LocalManifest::Workspace(manifest) => manifest.base_version,
            LocalManifest::User(manifest) => manifest.base_version,
        }
    }

    pub fn need_sync(&self) -> bool {
        match self {
            LocalManifest::File(manifest) => manifest.need_sync,
            LocalManifest::Folder(manifest) => manifest.need_sync,
            LocalManifest::Workspace(manifest) => manifest.need_sync,
            LocalManifest::User(manifest) => manifest.need_sync,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        match self {
            LocalManifest::File(manifest) => manifest.is_placeholder,
            LocalManifest::Folder(manifest) => manifest.is_placeholder,
            LocalManifest::Workspace(manifest) => manifest.is_placeholder,
            LocalManifest::User(manifest) => manifest.is_placeholder,
        }
    }

    pub fn created(&self) -> DateTime<Utc> {
        match self {
            LocalManifest::File(manifest) => manifest.created,
            LocalManifest::Folder(manifest) => manifest.created,
            LocalManifest::Workspace(manifest) => manifest.created,
            LocalManifest::User(manifest) => manifest.created,
        }
    }

    pub fn updated(&self) -> DateTime<Utc> {
        match self {
            LocalManifest::File(manifest) => manifest.updated,
            LocalManifest::Folder(manifest) => manifest.updated,
            LocalManifest::Workspace(manifest) => manifest.updated,
            LocalManifest::User(manifest) => manifest.updated,
        }
    }

    /// `None` for file manifests.
    pub fn children(&self) -> Option<&BTreeMap<EntryName, Access>> {
        match self {
            LocalManifest::File(_) => None,
            LocalManifest::Folder(manifest) => Some(&manifest.children),
            LocalManifest::Workspace(manifest) => Some(&manifest.children),
            LocalManifest::User(manifest) => Some(&manifest.children),
        }
    }

    /// Children rewrite, bumping `updated` and raising `need_sync`. Callers
    /// check `is_folderish` first; a file manifest here is a logic error.
    pub fn evolve_children_and_mark_updated(
        &self,
        changes: BTreeMap<EntryName, Option<Access>>,
    ) -> LocalManifest {
        match self {
            LocalManifest::File(_) => unreachable!("children evolution on a file manifest"),
            LocalManifest::Folder(manifest) => {
                LocalManifest::Folder(manifest.evolve_children_and_mark_updated(changes))
            }
            LocalManifest::Workspace(manifest) => {
                LocalManifest::Workspace(manifest.evolve_children_and_mark_updated(changes))
            }
            LocalManifest::User(manifest) => {
                LocalManifest::User(manifest.evolve_children_and_mark_updated(changes))
            }
        }
    }

    pub fn to_remote(&self) -> RemoteManifest {
        match self {
            LocalManifest::File(manifest) => RemoteManifest::File(manifest.to_remote()),
            LocalManifest::Folder(manifest) => RemoteManifest::Folder(manifest.to_remote()),
            LocalManifest::Workspace(manifest) => RemoteManifest::Workspace(manifest.to_remote()),
            LocalManifest::User(manifest) => RemoteManifest::User(manifest.to_remote()),
        }
    }
}
