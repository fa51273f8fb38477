//! Client-side resumable chunked upload.
//!
//! Splits a file into fixed-size indexed chunks, sends them through a
//! pluggable transport, and persists the next unsent index after every
//! acknowledgment so an interrupted upload resumes where it stopped
//! instead of resending acknowledged chunks.

mod progress;
mod reader;
mod session;

pub use progress::{JsonProgressStore, MemProgressStore, ProgressStore};
pub use reader::ChunkReader;
pub use session::{ChunkTransport, OutboundChunk, SendFuture, SessionState, UploadSession};

/// Default chunk size: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Errors produced by the client crate.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("chunk {index} rejected by server: {reason}")]
    ChunkRejected { index: u32, reason: String },

    #[error("transport error: {0}")]
    Transport(String),
}
