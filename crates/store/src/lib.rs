//! Filesystem storage for in-progress uploads and finalized artifacts.
//!
//! Two areas live under the server's data directory: a scratch area
//! holding one numbered chunk file per received chunk of each upload,
//! and an artifacts area holding the reassembled files. Both are keyed
//! by the client-supplied upload name, which is validated against path
//! traversal before it ever touches the filesystem.

mod artifacts;
mod chunks;
mod validation;

pub use artifacts::{ArtifactStore, ArtifactWriter};
pub use chunks::ChunkStore;
pub use validation::validate_name;

/// Errors produced by the store crate.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid upload name: {0}")]
    InvalidName(String),

    #[error("total chunk count changed mid-upload: recorded {recorded}, declared {declared}")]
    InconsistentTotalChunks { recorded: u32, declared: u32 },

    #[error("chunk index {index} out of range for {total} chunks")]
    IndexOutOfRange { index: u32, total: u32 },

    #[error("chunk {index} missing for upload {name}")]
    ChunkMissing { name: String, index: u32 },

    #[error("artifact not found: {0}")]
    NotFound(String),
}
