use filepile_store::{ArtifactStore, ChunkStore, StoreError};

use crate::{AssemblyError, LockMap};

/// Result of accepting one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Chunk stored; the upload is still missing pieces.
    Stored { received: u32, total: u32 },
    /// The upload is complete and its artifact is committed.
    Completed,
}

/// Accepts chunks and reassembles completed uploads.
///
/// Chunk writes for different indices proceed in parallel; only the
/// completeness check and the assembly itself hold the upload's lock.
pub struct Assembler {
    chunks: ChunkStore,
    artifacts: ArtifactStore,
    locks: LockMap,
}

impl Assembler {
    pub fn new(chunks: ChunkStore, artifacts: ArtifactStore) -> Self {
        Self {
            chunks,
            artifacts,
            locks: LockMap::new(),
        }
    }

    /// Stores one chunk and, if it was the last missing piece,
    /// assembles the artifact and reclaims the scratch space.
    pub async fn accept_chunk(
        &self,
        name: &str,
        index: u32,
        total: u32,
        bytes: &[u8],
    ) -> Result<ChunkOutcome, AssemblyError> {
        self.chunks.put_chunk(name, index, total, bytes).await?;

        let lock = self.locks.get(name);
        let _guard = lock.lock().await;

        let received = self.chunks.list_received(name).await?;
        if (received.len() as u32) < total {
            // An empty scratch dir right after our own put means a
            // concurrent arrival won the race, assembled (with our chunk
            // included), and reclaimed. Short-circuit on its artifact.
            if received.is_empty() && self.artifacts.exists(name).await? {
                return Ok(ChunkOutcome::Completed);
            }
            return Ok(ChunkOutcome::Stored {
                received: received.len() as u32,
                total,
            });
        }

        self.assemble(name, total).await?;
        Ok(ChunkOutcome::Completed)
    }

    /// Concatenates chunks `0..total` in index order into a committed
    /// artifact, then reclaims the scratch space.
    ///
    /// Must be called with the upload's lock held. On any failure the
    /// partial artifact is discarded and the chunks stay on disk so the
    /// next chunk arrival (or resend) can retry.
    async fn assemble(&self, name: &str, total: u32) -> Result<(), AssemblyError> {
        let mut writer = self.artifacts.create(name).await?;

        for index in 0..total {
            let bytes = match self.chunks.read_chunk(name, index).await {
                Ok(bytes) => bytes,
                Err(StoreError::ChunkMissing { .. }) => {
                    writer.abort().await;
                    return Err(AssemblyError::Incomplete {
                        name: name.into(),
                        index,
                    });
                }
                Err(e) => {
                    writer.abort().await;
                    return Err(e.into());
                }
            };
            if let Err(e) = writer.append(&bytes).await {
                writer.abort().await;
                return Err(e.into());
            }
        }

        // The artifact must be durable before the chunks go away.
        writer.commit().await?;
        self.chunks.reclaim(name).await?;
        self.locks.remove(name);

        tracing::info!(name, total, "upload assembled");
        Ok(())
    }
}
