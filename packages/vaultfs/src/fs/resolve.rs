use vaultfs_primitives::{Access, FsPath};

use crate::error::FsError;
use crate::fs::LocalFolderFs;
use crate::manifest::LocalManifest;

pub type HopCollector<'a> = &'a mut dyn FnMut(&Access, &LocalManifest);

impl LocalFolderFs {
    /// Resolves a path to its access and manifest. The optional collector
    /// sees every hop of the walk, root and destination included.
    pub(crate) async fn retrieve_entry(
        &self,
        path: &FsPath,
        mut collector: Option<HopCollector<'_>>,
    ) -> Result<(Access, LocalManifest), FsError> {
        let mut current_access = self.cache.root_access().clone();
        let mut current_manifest = self.get_manifest(&current_access).await?;

        if let Some(collector) = collector.as_deref_mut() {
            collector(&current_access, &current_manifest);
        }

        let Some((destination, hops)) = path.parts().split_last() else {
            return Ok((current_access, current_manifest));
        };

        let mut walked = FsPath::root();

        for hop in hops {
            walked = walked.join(hop.clone());

            current_access = current_manifest
                .children()
                .and_then(|children| children.get(hop))
                .cloned()
                .ok_or_else(|| FsError::NotFound(walked.clone()))?;
            current_manifest = self.get_manifest(&current_access).await?;

            if !current_manifest.is_folderish() {
                return Err(FsError::NotADirectory(walked.clone()));
            }

            if let Some(collector) = collector.as_deref_mut() {
                collector(&current_access, &current_manifest);
            }
        }

        walked = walked.join(destination.clone());

        current_access = current_manifest
            .children()
            .and_then(|children| children.get(destination))
            .cloned()
            .ok_or_else(|| FsError::NotFound(walked))?;
        current_manifest = self.get_manifest(&current_access).await?;

        if let Some(collector) = collector.as_deref_mut() {
            collector(&current_access, &current_manifest);
        }

        Ok((current_access, current_manifest))
    }

    pub async fn get_entry(&self, path: &FsPath) -> Result<(Access, LocalManifest), FsError> {
        self.retrieve_entry(path, None).await
    }

    pub async fn get_entry_collecting(
        &self,
        path: &FsPath,
        collector: HopCollector<'_>,
    ) -> Result<(Access, LocalManifest), FsError> {
        self.retrieve_entry(path, Some(collector)).await
    }

    pub async fn get_access(&self, path: &FsPath) -> Result<Access, FsError> {
        let (access, _) = self.retrieve_entry(path, None).await?;

        Ok(access)
    }

    /// Like [`LocalFolderFs::get_entry`], but reports the accesses missing
    /// from the local store as a single bulk error so the sync engine can
    /// prefetch them in one go.
    pub async fn get_entry_multi(&self, path: &FsPath) -> Result<(Access, LocalManifest), FsError> {
        match self.retrieve_entry(path, None).await {
            Err(FsError::LocalMiss(access)) => Err(FsError::MultiLocalMiss(vec![access])),
            other => other,
        }
    }
}
