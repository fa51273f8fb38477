//! HTTP shell over the chunk-assembly and range-serving cores.
//!
//! One chunk per `POST /upload` call (multipart `fileName`,
//! `chunkNumber`, `totalChunks`, `chunk`); `GET /download?fileName=`
//! honors an optional `Range: bytes=start-end` header with
//! 200/206/404/416 semantics.

mod config;
mod error;
mod handlers;
mod server;

pub use config::Config;
pub use error::ApiError;
pub use handlers::{AppState, router};
pub use server::Server;

/// Errors produced by the server shell.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
