use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::{StoreError, validate_name};

/// Storage for finalized artifacts.
///
/// An artifact only becomes visible through an atomic rename from a
/// uuid-named `.part` temp file, so readers never observe a partially
/// written artifact.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Creates a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn artifact_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    /// Opens a writer for a new artifact.
    ///
    /// Bytes go to a temp file until [`ArtifactWriter::commit`] renames it
    /// into place. Dropping the writer without committing removes the
    /// temp file.
    pub async fn create(&self, name: &str) -> Result<ArtifactWriter, StoreError> {
        let final_path = self.artifact_path(name)?;
        if let Some(parent) = final_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = self
            .root
            .join(format!(".{}.part", uuid::Uuid::new_v4()));
        let file = File::create(&tmp_path).await?;

        Ok(ArtifactWriter {
            file,
            tmp_path,
            final_path,
            done: false,
        })
    }

    /// Returns `true` if a committed artifact exists under `name`.
    pub async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        let path = self.artifact_path(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    /// Opens a committed artifact for reading, returning its size.
    pub async fn open(&self, name: &str) -> Result<(File, u64), StoreError> {
        let path = self.artifact_path(name)?;
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.into()));
            }
            Err(e) => return Err(e.into()),
        };
        let size = file.metadata().await?.len();
        Ok((file, size))
    }

    /// Returns the size of a committed artifact.
    pub async fn size(&self, name: &str) -> Result<u64, StoreError> {
        let path = self.artifact_path(name)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(name.into())),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-flight artifact write. Invisible to readers until committed.
#[derive(Debug)]
pub struct ArtifactWriter {
    file: File,
    tmp_path: PathBuf,
    final_path: PathBuf,
    done: bool,
}

impl ArtifactWriter {
    /// Appends bytes to the artifact being built.
    pub async fn append(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        self.file.write_all(bytes).await?;
        Ok(())
    }

    /// Flushes to disk and atomically publishes the artifact.
    pub async fn commit(mut self) -> Result<(), StoreError> {
        self.file.sync_all().await?;
        tokio::fs::rename(&self.tmp_path, &self.final_path).await?;
        self.done = true;
        Ok(())
    }

    /// Discards the partial artifact.
    pub async fn abort(mut self) {
        self.done = true;
        let _ = tokio::fs::remove_file(&self.tmp_path).await;
    }
}

impl Drop for ArtifactWriter {
    fn drop(&mut self) {
        if !self.done {
            let _ = std::fs::remove_file(&self.tmp_path);
        }
    }
}
