use std::io::SeekFrom;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tokio_util::io::ReaderStream;

use filepile_store::{ArtifactStore, StoreError};

use crate::{RangeError, parse_range};

/// A lazy, forward-only stream of byte blocks covering exactly the
/// resolved range. Dropping it releases the underlying file handle;
/// a mid-stream I/O failure surfaces as an `Err` item.
pub type ByteStream = ReaderStream<Take<File>>;

/// How the response body relates to the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBody {
    /// The complete resource.
    Full { size: u64 },
    /// An inclusive slice of the resource.
    Partial { start: u64, end: u64, size: u64 },
}

impl RangeBody {
    /// Number of bytes the body will carry.
    pub fn content_length(&self) -> u64 {
        match *self {
            RangeBody::Full { size } => size,
            RangeBody::Partial { start, end, .. } => end - start + 1,
        }
    }

    /// `Content-Range` header value; `None` for a full response.
    pub fn content_range(&self) -> Option<String> {
        match *self {
            RangeBody::Full { .. } => None,
            RangeBody::Partial { start, end, size } => {
                Some(format!("bytes {start}-{end}/{size}"))
            }
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, RangeBody::Partial { .. })
    }
}

/// Serves byte ranges of committed artifacts.
///
/// Artifacts are immutable once committed, so reads take no locks.
#[derive(Debug, Clone)]
pub struct RangeServer {
    artifacts: ArtifactStore,
}

impl RangeServer {
    pub fn new(artifacts: ArtifactStore) -> Self {
        Self { artifacts }
    }

    /// Resolves an optional raw `Range` header against the artifact and
    /// returns response metadata plus the bounded byte stream.
    pub async fn serve(
        &self,
        name: &str,
        range_header: Option<&str>,
    ) -> Result<(RangeBody, ByteStream), RangeError> {
        let (mut file, size) = self.artifacts.open(name).await.map_err(map_store)?;

        match range_header {
            None => {
                let stream = ReaderStream::new(file.take(size));
                Ok((RangeBody::Full { size }, stream))
            }
            Some(header) => {
                let resolved = parse_range(header)?.resolve(size)?;
                file.seek(SeekFrom::Start(resolved.start)).await?;
                let stream = ReaderStream::new(file.take(resolved.len()));
                Ok((
                    RangeBody::Partial {
                        start: resolved.start,
                        end: resolved.end,
                        size,
                    },
                    stream,
                ))
            }
        }
    }
}

fn map_store(err: StoreError) -> RangeError {
    match err {
        StoreError::NotFound(name) => RangeError::NotFound(name),
        StoreError::Io(e) => RangeError::Io(e),
        StoreError::InvalidName(name) => RangeError::Malformed(format!("invalid name: {name}")),
        other => RangeError::Io(std::io::Error::other(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use tempfile::TempDir;

    async fn seed(dir: &TempDir, name: &str, bytes: &[u8]) -> RangeServer {
        let artifacts = ArtifactStore::new(dir.path().join("artifacts"));
        let mut writer = artifacts.create(name).await.unwrap();
        writer.append(bytes).await.unwrap();
        writer.commit().await.unwrap();
        RangeServer::new(artifacts)
    }

    async fn collect(mut stream: ByteStream) -> Vec<u8> {
        let mut bytes = Vec::new();
        while let Some(block) = stream.next().await {
            bytes.extend_from_slice(&block.unwrap());
        }
        bytes
    }

    #[tokio::test]
    async fn no_range_serves_complete_resource() {
        let dir = TempDir::new().unwrap();
        let server = seed(&dir, "ten.bin", b"0123456789").await;

        let (body, stream) = server.serve("ten.bin", None).await.unwrap();
        assert_eq!(body, RangeBody::Full { size: 10 });
        assert!(!body.is_partial());
        assert_eq!(body.content_length(), 10);
        assert_eq!(body.content_range(), None);
        assert_eq!(collect(stream).await, b"0123456789");
    }

    #[tokio::test]
    async fn first_byte_range() {
        let dir = TempDir::new().unwrap();
        let server = seed(&dir, "ten.bin", b"0123456789").await;

        let (body, stream) = server.serve("ten.bin", Some("bytes=0-0")).await.unwrap();
        assert!(body.is_partial());
        assert_eq!(body.content_length(), 1);
        assert_eq!(body.content_range().as_deref(), Some("bytes 0-0/10"));
        assert_eq!(collect(stream).await, b"0");
    }

    #[tokio::test]
    async fn interior_range() {
        let dir = TempDir::new().unwrap();
        let server = seed(&dir, "ten.bin", b"0123456789").await;

        let (body, stream) = server.serve("ten.bin", Some("bytes=2-5")).await.unwrap();
        assert_eq!(
            body,
            RangeBody::Partial {
                start: 2,
                end: 5,
                size: 10
            }
        );
        assert_eq!(collect(stream).await, b"2345");
    }

    #[tokio::test]
    async fn open_ended_range_runs_to_eof() {
        let dir = TempDir::new().unwrap();
        let server = seed(&dir, "ten.bin", b"0123456789").await;

        let (body, stream) = server.serve("ten.bin", Some("bytes=5-")).await.unwrap();
        assert_eq!(body.content_range().as_deref(), Some("bytes 5-9/10"));
        assert_eq!(collect(stream).await, b"56789");
    }

    #[tokio::test]
    async fn end_clamped_to_size() {
        let dir = TempDir::new().unwrap();
        let server = seed(&dir, "ten.bin", b"0123456789").await;

        let (body, stream) = server.serve("ten.bin", Some("bytes=8-999")).await.unwrap();
        assert_eq!(body.content_range().as_deref(), Some("bytes 8-9/10"));
        assert_eq!(collect(stream).await, b"89");
    }

    #[tokio::test]
    async fn start_past_size_unsatisfiable() {
        let dir = TempDir::new().unwrap();
        let server = seed(&dir, "ten.bin", b"0123456789").await;

        let err = server
            .serve("ten.bin", Some("bytes=100-200"))
            .await
            .unwrap_err();
        assert!(matches!(err, RangeError::Unsatisfiable { size: 10 }));
    }

    #[tokio::test]
    async fn unknown_artifact_not_found() {
        let dir = TempDir::new().unwrap();
        let server = seed(&dir, "ten.bin", b"0123456789").await;

        let err = server.serve("missing.bin", None).await.unwrap_err();
        assert!(matches!(err, RangeError::NotFound(_)));
    }

    #[tokio::test]
    async fn malformed_header_rejected() {
        let dir = TempDir::new().unwrap();
        let server = seed(&dir, "ten.bin", b"0123456789").await;

        let err = server
            .serve("ten.bin", Some("octets=0-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RangeError::Malformed(_)));
    }

    #[tokio::test]
    async fn dropping_stream_midway_is_clean() {
        let dir = TempDir::new().unwrap();
        let server = seed(&dir, "big.bin", &vec![7u8; 256 * 1024]).await;

        let (_, mut stream) = server.serve("big.bin", None).await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert!(!first.is_empty());
        // Caller walks away; the file handle goes with the stream.
        drop(stream);

        // The artifact is still fully readable afterwards.
        let (body, stream) = server.serve("big.bin", None).await.unwrap();
        assert_eq!(body.content_length(), 256 * 1024);
        assert_eq!(collect(stream).await.len(), 256 * 1024);
    }
}
