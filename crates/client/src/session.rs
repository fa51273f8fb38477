use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::{ChunkReader, ClientError, ProgressStore};

/// A boxed future returned by [`ChunkTransport::send_chunk`].
pub type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ClientError>> + Send + 'a>>;

/// Delivers one chunk to the server and waits for its acknowledgment.
///
/// Implementors wrap whatever carries the bytes: HTTP multipart in the
/// real client, an in-memory fake in tests. Returning `Ok` means the
/// server durably accepted the chunk.
pub trait ChunkTransport: Send + Sync {
    fn send_chunk(&self, chunk: &OutboundChunk) -> SendFuture<'_>;
}

/// One chunk as handed to the transport.
#[derive(Debug, Clone)]
pub struct OutboundChunk {
    pub file_name: String,
    pub index: u32,
    pub total_chunks: u32,
    pub bytes: Vec<u8>,
}

/// Upload session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Uploading,
    Completed,
}

/// Client-side upload session for one file, resumable across restarts.
///
/// Progress (the next unsent chunk index) lives in a [`ProgressStore`]
/// keyed by the upload name; a new session over the same store picks up
/// exactly where the previous run was acknowledged.
pub struct UploadSession<'a> {
    path: PathBuf,
    file_name: String,
    chunk_size: usize,
    progress: &'a dyn ProgressStore,
    transport: &'a dyn ChunkTransport,
    state: SessionState,
}

impl<'a> UploadSession<'a> {
    pub fn new(
        path: impl Into<PathBuf>,
        file_name: impl Into<String>,
        chunk_size: usize,
        progress: &'a dyn ProgressStore,
        transport: &'a dyn ChunkTransport,
    ) -> Self {
        Self {
            path: path.into(),
            file_name: file_name.into(),
            chunk_size,
            progress,
            transport,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs the upload to completion, resuming from persisted progress.
    ///
    /// On any send failure the session halts in `Uploading` with the
    /// persisted progress unchanged; calling `run` again resends only
    /// chunks the server never acknowledged. Retry policy belongs to
    /// the caller.
    pub async fn run(&mut self) -> Result<(), ClientError> {
        let mut reader = ChunkReader::open(&self.path, self.chunk_size).await?;
        let total = reader.total_chunks();

        let resume_from = self.progress.get(&self.file_name)?.unwrap_or(0);
        if resume_from > 0 {
            reader.seek_to_chunk(resume_from).await?;
            tracing::debug!(
                file = %self.file_name,
                chunk = resume_from,
                total,
                "resuming upload"
            );
        }

        self.state = SessionState::Uploading;

        while let Some((index, bytes)) = reader.next_chunk().await? {
            let chunk = OutboundChunk {
                file_name: self.file_name.clone(),
                index,
                total_chunks: total,
                bytes,
            };
            self.transport.send_chunk(&chunk).await?;
            // Persist only after the ack, so a crash resends rather
            // than skips.
            self.progress.set(&self.file_name, index + 1)?;
        }

        self.progress.clear(&self.file_name)?;
        self.state = SessionState::Completed;
        tracing::info!(file = %self.file_name, total, "upload completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemProgressStore;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records sent chunk indices; optionally fails at a given index.
    struct FakeTransport {
        sent: Mutex<Vec<u32>>,
        fail_at: Mutex<Option<u32>>,
    }

    impl FakeTransport {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_at: Mutex::new(None),
            }
        }

        fn failing_at(index: u32) -> Self {
            let transport = Self::new();
            *transport.fail_at.lock().unwrap() = Some(index);
            transport
        }

        fn sent(&self) -> Vec<u32> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl ChunkTransport for FakeTransport {
        fn send_chunk(&self, chunk: &OutboundChunk) -> SendFuture<'_> {
            let index = chunk.index;
            Box::pin(async move {
                if *self.fail_at.lock().unwrap() == Some(index) {
                    return Err(ClientError::Transport(format!(
                        "connection dropped at chunk {index}"
                    )));
                }
                self.sent.lock().unwrap().push(index);
                Ok(())
            })
        }
    }

    async fn five_chunk_file(dir: &TempDir) -> PathBuf {
        // 9 bytes with chunk_size 2 -> chunks [01][23][45][67][8].
        let path = dir.path().join("data.bin");
        tokio::fs::write(&path, b"012345678").await.unwrap();
        path
    }

    #[tokio::test]
    async fn fresh_session_sends_everything_and_completes() {
        let dir = TempDir::new().unwrap();
        let path = five_chunk_file(&dir).await;
        let progress = MemProgressStore::new();
        let transport = FakeTransport::new();

        let mut session = UploadSession::new(&path, "data.bin", 2, &progress, &transport);
        assert_eq!(session.state(), SessionState::Idle);

        session.run().await.unwrap();
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(transport.sent(), vec![0, 1, 2, 3, 4]);
        // Progress is cleared once the last chunk is acknowledged.
        assert_eq!(progress.get("data.bin").unwrap(), None);
    }

    #[tokio::test]
    async fn resumed_session_sends_only_missing_chunks() {
        let dir = TempDir::new().unwrap();
        let path = five_chunk_file(&dir).await;
        let progress = MemProgressStore::new();
        progress.set("data.bin", 3).unwrap();
        let transport = FakeTransport::new();

        let mut session = UploadSession::new(&path, "data.bin", 2, &progress, &transport);
        session.run().await.unwrap();

        assert_eq!(transport.sent(), vec![3, 4]);
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(progress.get("data.bin").unwrap(), None);
    }

    #[tokio::test]
    async fn failure_halts_with_progress_intact() {
        let dir = TempDir::new().unwrap();
        let path = five_chunk_file(&dir).await;
        let progress = MemProgressStore::new();
        let transport = FakeTransport::failing_at(2);

        let mut session = UploadSession::new(&path, "data.bin", 2, &progress, &transport);
        let err = session.run().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));

        // Chunks 0 and 1 were acknowledged; 2 was not.
        assert_eq!(session.state(), SessionState::Uploading);
        assert_eq!(transport.sent(), vec![0, 1]);
        assert_eq!(progress.get("data.bin").unwrap(), Some(2));
    }

    #[tokio::test]
    async fn rerun_after_failure_picks_up_where_left_off() {
        let dir = TempDir::new().unwrap();
        let path = five_chunk_file(&dir).await;
        let progress = MemProgressStore::new();
        let transport = FakeTransport::failing_at(2);

        let mut session = UploadSession::new(&path, "data.bin", 2, &progress, &transport);
        session.run().await.unwrap_err();

        *transport.fail_at.lock().unwrap() = None;
        session.run().await.unwrap();

        assert_eq!(transport.sent(), vec![0, 1, 2, 3, 4]);
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[tokio::test]
    async fn empty_file_uploads_one_chunk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.bin");
        tokio::fs::write(&path, b"").await.unwrap();
        let progress = MemProgressStore::new();
        let transport = FakeTransport::new();

        let mut session = UploadSession::new(&path, "empty.bin", 2, &progress, &transport);
        session.run().await.unwrap();
        assert_eq!(transport.sent(), vec![0]);
    }
}
