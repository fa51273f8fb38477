//! Byte-range resolution and streaming for committed artifacts.
//!
//! Implements HTTP range semantics over the artifact store: an optional
//! `bytes=start-end` request is parsed, validated against the artifact
//! size, and answered with response metadata plus a lazy byte stream
//! bounded to exactly the resolved range.

mod parse;
mod serve;

pub use parse::{RangeSpec, ResolvedRange, parse_range};
pub use serve::{ByteStream, RangeBody, RangeServer};

/// Errors produced by the range crate.
#[derive(Debug, thiserror::Error)]
pub enum RangeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed range header: {0}")]
    Malformed(String),

    #[error("range not satisfiable for size {size}")]
    Unsatisfiable { size: u64 },

    #[error("artifact not found: {0}")]
    NotFound(String),
}
