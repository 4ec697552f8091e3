use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vaultfs_primitives::{Access, BlockAccess, DeviceId, EntryName, UserId};

use crate::manifest::local::{
    LocalFileManifest, LocalFolderManifest, LocalManifest, LocalUserManifest,
    LocalWorkspaceManifest,
};

// Remote manifests are the server-observed versions. They carry a plain
// `version` (1 on first upload) instead of the local sync flags; converting
// to the local form yields a clean, already-synced manifest.

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileManifest {
    pub author: DeviceId,
    pub version: u32,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub size: u64,
    pub blocks: Vec<BlockAccess>,
}

impl FileManifest {
    pub fn to_local(&self) -> LocalFileManifest {
        LocalFileManifest {
            author: self.author.clone(),
            base_version: self.version,
            need_sync: false,
            is_placeholder: false,
            created: self.created,
            updated: self.updated,
            size: self.size,
            blocks: self.blocks.clone(),
            dirty_blocks: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FolderManifest {
    pub author: DeviceId,
    pub version: u32,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub children: BTreeMap<EntryName, Access>,
}

impl FolderManifest {
    pub fn to_local(&self) -> LocalFolderManifest {
        LocalFolderManifest {
            author: self.author.clone(),
            base_version: self.version,
            need_sync: false,
            is_placeholder: false,
            created: self.created,
            updated: self.updated,
            children: self.children.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceManifest {
    pub author: DeviceId,
    pub version: u32,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub children: BTreeMap<EntryName, Access>,
    pub creator: UserId,
    pub participants: Vec<UserId>,
}

impl WorkspaceManifest {
    pub fn to_local(&self) -> LocalWorkspaceManifest {
        LocalWorkspaceManifest {
            author: self.author.clone(),
            base_version: self.version,
            need_sync: false,
            is_placeholder: false,
            created: self.created,
            updated: self.updated,
            children: self.children.clone(),
            creator: self.creator.clone(),
            participants: self.participants.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserManifest {
    pub author: DeviceId,
    pub version: u32,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub children: BTreeMap<EntryName, Access>,
    pub last_processed_message: u32,
}

impl UserManifest {
    pub fn to_local(&self) -> LocalUserManifest {
        LocalUserManifest {
            author: self.author.clone(),
            base_version: self.version,
            need_sync: false,
            is_placeholder: false,
            created: self.created,
            updated: self.updated,
            children: self.children.clone(),
            last_processed_message: self.last_processed_message,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RemoteManifest {
    #[serde(rename = "file_manifest")]
    File(FileManifest),

    #[serde(rename = "folder_manifest")]
    Folder(FolderManifest),

    #[serde(rename = "workspace_manifest")]
    Workspace(WorkspaceManifest),

    #[serde(rename = "user_manifest")]
    User(UserManifest),
}

impl RemoteManifest {
    pub fn version(&self) -> u32 {
        match self {
            RemoteManifest::File(manifest) => manifest.version,
            RemoteManifest::Folder(manifest) => manifest.version,
            RemoteManifest::Workspace(manifest) => manifest.version,
            RemoteManifest::User(manifest) => manifest.version,
        }
    }

    pub fn to_local(&self) -> LocalManifest {
        match self {
            RemoteManifest::File(manifest) => LocalManifest::File(manifest.to_local()),
            RemoteManifest::Folder(manifest) => LocalManifest::Folder(manifest.to_local()),
            RemoteManifest::Workspace(manifest) => {
                LocalManifest::Workspace(manifest.to_local())
            }
            RemoteManifest::User(manifest) => LocalManifest::User(manifest.to_local()),
        }
    }
}
