use std::io::SeekFrom;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::{ClientError, DEFAULT_CHUNK_SIZE};

/// Reads a file as fixed-size indexed chunks.
///
/// Chunk boundaries are a pure function of the chunk size, so a resumed
/// session can seek straight to any chunk index.
pub struct ChunkReader {
    file: File,
    chunk_size: usize,
    next_index: u32,
    total_chunks: u32,
    file_size: u64,
}

impl ChunkReader {
    /// Opens `path` for chunked reading.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] (1 MiB) is used.
    pub async fn open(path: &Path, chunk_size: usize) -> Result<Self, ClientError> {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        let file = File::open(path).await?;
        let file_size = file.metadata().await?.len();
        // An empty file still counts as one (empty) chunk so the upload
        // exists server-side.
        let total_chunks = file_size.div_ceil(chunk_size as u64).max(1) as u32;

        Ok(Self {
            file,
            chunk_size,
            next_index: 0,
            total_chunks,
            file_size,
        })
    }

    /// Total number of chunks in the file.
    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }

    /// Total file size in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Index of the next chunk [`next_chunk`](Self::next_chunk) will return.
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Positions the reader at the given chunk (for resume).
    pub async fn seek_to_chunk(&mut self, index: u32) -> Result<(), ClientError> {
        let offset = (index as u64 * self.chunk_size as u64).min(self.file_size);
        self.file.seek(SeekFrom::Start(offset)).await?;
        self.next_index = index;
        Ok(())
    }

    /// Reads the next chunk. Returns `None` once every chunk is read.
    pub async fn next_chunk(&mut self) -> Result<Option<(u32, Vec<u8>)>, ClientError> {
        if self.next_index >= self.total_chunks {
            return Ok(None);
        }

        let offset = self.next_index as u64 * self.chunk_size as u64;
        let remaining = self.file_size.saturating_sub(offset);
        let read_size = remaining.min(self.chunk_size as u64) as usize;

        let mut buf = vec![0u8; read_size];
        self.file.read_exact(&mut buf).await?;

        let index = self.next_index;
        self.next_index += 1;
        Ok(Some((index, buf)))
    }
}
