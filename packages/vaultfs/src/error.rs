use vaultfs_primitives::{Access, EntryId, FsPath};

use crate::manifest::SerdeError;
use crate::storage::BlobStoreError;

#[derive(thiserror::Error, Clone, Debug)]
pub enum FsError {
    #[error("No such file or directory ({0})")]
    NotFound(FsPath),

    #[error("Not a directory ({0})")]
    NotADirectory(FsPath),

    #[error("Is a directory ({0})")]
    IsADirectory(FsPath),

    #[error("Directory not empty ({0})")]
    DirectoryNotEmpty(FsPath),

    #[error("File exists ({0})")]
    Exists(FsPath),

    #[error("Permission denied ({reason}) ({path})")]
    PermissionDenied {
        path: FsPath,
        dst: Option<FsPath>,
        reason: &'static str,
    },

    #[error("Invalid argument ({src} -> {dst})")]
    InvalidArgument { src: FsPath, dst: FsPath },

    #[error("No entry with id {0}")]
    EntryNotFound(EntryId),

    /// The manifest behind this access is not in the local store. Recovered
    /// by the sync engine fetching it, then retrying the operation.
    #[error("Manifest not available locally (entry {})", .0.id)]
    LocalMiss(Access),

    /// Bulk form of [`FsError::LocalMiss`], raised by operations that know
    /// every access they are missing up front.
    #[error("{} manifests not available locally", .0.len())]
    MultiLocalMiss(Vec<Access>),

    #[error(transparent)]
    Serde(#[from] SerdeError),

    #[error(transparent)]
    Storage(BlobStoreError),
}

impl FsError {
    /// POSIX errno equivalent reported at the filesystem boundary.
    pub fn errno(&self) -> i32 {
        match self {
            FsError::NotFound(_) | FsError::EntryNotFound(_) => 2, // ENOENT
            FsError::PermissionDenied { .. } => 13,                // EACCES
            FsError::Exists(_) => 17,                              // EEXIST
            FsError::NotADirectory(_) => 20,                       // ENOTDIR
            FsError::IsADirectory(_) => 21,                        // EISDIR
            FsError::InvalidArgument { .. } => 22,                 // EINVAL
            FsError::DirectoryNotEmpty(_) => 39,                   // ENOTEMPTY
            FsError::LocalMiss(_)
            | FsError::MultiLocalMiss(_)
            | FsError::Serde(_)
            | FsError::Storage(_) => 5, // EIO
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn sample_path() -> FsPath {
        "/w/a".parse().unwrap()
    }

    #[rstest]
    #[case(FsError::NotFound(sample_path()), 2)]
    #[case(FsError::PermissionDenied { path: sample_path(), dst: None, reason: "root" }, 13)]
    #[case(FsError::Exists(sample_path()), 17)]
    #[case(FsError::NotADirectory(sample_path()), 20)]
    #[case(FsError::IsADirectory(sample_path()), 21)]
    #[case(FsError::InvalidArgument { src: sample_path(), dst: sample_path() }, 22)]
    #[case(FsError::DirectoryNotEmpty(sample_path()), 39)]
    #[case(FsError::LocalMiss(Access::generate()), 5)]
    #[case(FsError::MultiLocalMiss(vec![Access::generate()]), 5)]
    fn test_errno_mapping(#[case] error: FsError, #[case] errno: i32) {
        assert_eq!(error.errno(), errno);
    }
}
