//! Upload completeness tracking and exactly-once chunk reassembly.
//!
//! Chunks arrive in any order over the network; the [`Assembler`] decides
//! when an upload is complete and concatenates its chunks in strict index
//! order into one committed artifact, then reclaims the scratch space.
//! The completeness-check-then-assemble transition is serialized per
//! upload name so concurrent final chunks cannot assemble twice.

mod assembler;
mod locks;

pub use assembler::{Assembler, ChunkOutcome};
pub use locks::LockMap;

use filepile_store::StoreError;

/// Errors produced by the assembly crate.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("assembly of {name} incomplete: chunk {index} unavailable")]
    Incomplete { name: String, index: u32 },
}
