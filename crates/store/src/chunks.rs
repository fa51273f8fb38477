use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{StoreError, validate_name};

const MANIFEST_FILE: &str = "manifest.json";
const CHUNK_PREFIX: &str = "chunk_";

/// Per-upload metadata recorded alongside the chunks.
///
/// The declared chunk count is written on first arrival and every later
/// chunk must declare the same value, so a client cannot change its
/// chunking plan mid-upload.
#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    total_chunks: u32,
}

/// Scratch storage for in-progress uploads.
///
/// Layout: `<root>/<upload name>/chunk_<index>` plus a `manifest.json`
/// holding the declared chunk count.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    root: PathBuf,
}

impl ChunkStore {
    /// Creates a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn upload_dir(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    /// Persists one chunk, replacing any prior bytes at the same index.
    ///
    /// The first chunk of an upload records `total_chunks`; later chunks
    /// must declare the same count or the call fails with
    /// [`StoreError::InconsistentTotalChunks`].
    pub async fn put_chunk(
        &self,
        name: &str,
        index: u32,
        total_chunks: u32,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        if total_chunks == 0 || index >= total_chunks {
            return Err(StoreError::IndexOutOfRange {
                index,
                total: total_chunks,
            });
        }

        let dir = self.upload_dir(name)?;
        tokio::fs::create_dir_all(&dir).await?;

        let manifest_path = dir.join(MANIFEST_FILE);
        match tokio::fs::read(&manifest_path).await {
            Ok(raw) => {
                let manifest: Manifest = serde_json::from_slice(&raw)?;
                if manifest.total_chunks != total_chunks {
                    return Err(StoreError::InconsistentTotalChunks {
                        recorded: manifest.total_chunks,
                        declared: total_chunks,
                    });
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let manifest = Manifest { total_chunks };
                tokio::fs::write(&manifest_path, serde_json::to_vec(&manifest)?).await?;
            }
            Err(e) => return Err(e.into()),
        }

        tokio::fs::write(dir.join(format!("{CHUNK_PREFIX}{index}")), bytes).await?;
        Ok(())
    }

    /// Returns the chunk indices currently stored for `name`.
    ///
    /// An unknown or already-reclaimed upload yields an empty set.
    pub async fn list_received(&self, name: &str) -> Result<BTreeSet<u32>, StoreError> {
        let dir = self.upload_dir(name)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };

        let mut received = BTreeSet::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(rest) = file_name.strip_prefix(CHUNK_PREFIX) {
                if let Ok(index) = rest.parse::<u32>() {
                    received.insert(index);
                }
            }
        }
        Ok(received)
    }

    /// Returns the declared chunk count, or `None` before the first chunk.
    pub async fn total_chunks(&self, name: &str) -> Result<Option<u32>, StoreError> {
        let manifest_path = self.upload_dir(name)?.join(MANIFEST_FILE);
        match tokio::fs::read(&manifest_path).await {
            Ok(raw) => {
                let manifest: Manifest = serde_json::from_slice(&raw)?;
                Ok(Some(manifest.total_chunks))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Reads the bytes stored for one chunk.
    pub async fn read_chunk(&self, name: &str, index: u32) -> Result<Vec<u8>, StoreError> {
        let path = self.upload_dir(name)?.join(format!("{CHUNK_PREFIX}{index}"));
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::ChunkMissing {
                name: name.into(),
                index,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes all chunk storage for `name`. Idempotent.
    pub async fn reclaim(&self, name: &str) -> Result<(), StoreError> {
        let dir = self.upload_dir(name)?;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
