use std::path::Path;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};

use filepile_assembly::{Assembler, ChunkOutcome};
use filepile_range::{RangeBody, RangeError, RangeServer};
use filepile_store::{ArtifactStore, ChunkStore};

use crate::ApiError;

/// Upload requests carry one chunk plus small metadata fields.
const MAX_CHUNK_BODY: usize = 8 * 1024 * 1024;

/// Shared handler state: the assembly core and the range-serving core
/// over one data directory.
#[derive(Clone)]
pub struct AppState {
    pub assembler: Arc<Assembler>,
    pub ranges: RangeServer,
}

impl AppState {
    pub fn new(data_dir: &Path) -> Self {
        let artifacts = ArtifactStore::new(data_dir.join("artifacts"));
        let chunks = ChunkStore::new(data_dir.join("scratch"));
        Self {
            assembler: Arc::new(Assembler::new(chunks, artifacts.clone())),
            ranges: RangeServer::new(artifacts),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/upload", post(upload_chunk))
        .route("/download", get(download))
        .layer(DefaultBodyLimit::max(MAX_CHUNK_BODY))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    received: u32,
    total: u32,
    complete: bool,
}

async fn upload_chunk(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file_name = None;
    let mut chunk_number = None;
    let mut total_chunks = None;
    let mut bytes = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart request: {e}")))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "fileName" => file_name = Some(read_text(&name, field).await?),
            "chunkNumber" => chunk_number = Some(parse_u32(&name, field).await?),
            "totalChunks" => total_chunks = Some(parse_u32(&name, field).await?),
            "chunk" => {
                bytes = Some(field.bytes().await.map_err(|e| {
                    ApiError::bad_request(format!("unreadable chunk field: {e}"))
                })?);
            }
            _ => {}
        }
    }

    let file_name = file_name.ok_or_else(|| ApiError::missing_field("fileName"))?;
    let index = chunk_number.ok_or_else(|| ApiError::missing_field("chunkNumber"))?;
    let total = total_chunks.ok_or_else(|| ApiError::missing_field("totalChunks"))?;
    let bytes = bytes.ok_or_else(|| ApiError::missing_field("chunk"))?;

    tracing::debug!(file = %file_name, index, total, len = bytes.len(), "chunk received");

    let outcome = state
        .assembler
        .accept_chunk(&file_name, index, total, &bytes)
        .await?;

    let response = match outcome {
        ChunkOutcome::Stored { received, total } => UploadResponse {
            received,
            total,
            complete: false,
        },
        ChunkOutcome::Completed => UploadResponse {
            received: total,
            total,
            complete: true,
        },
    };
    Ok(Json(response))
}

async fn read_text(
    name: &str,
    field: axum::extract::multipart::Field<'_>,
) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("unreadable field {name}: {e}")))
}

async fn parse_u32(
    name: &str,
    field: axum::extract::multipart::Field<'_>,
) -> Result<u32, ApiError> {
    let raw = read_text(name, field).await?;
    raw.trim().parse().map_err(|_| {
        ApiError::bad_request(format!(
            "field {name} must be a non-negative integer, got {raw:?}"
        ))
    })
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    #[serde(rename = "fileName")]
    file_name: String,
}

async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let range = match headers.get(header::RANGE) {
        None => None,
        Some(value) => Some(value.to_str().map_err(|_| {
            ApiError::bad_request("Range header is not valid ASCII")
        })?),
    };

    let (body, stream) = match state.ranges.serve(&query.file_name, range).await {
        Ok(ok) => ok,
        Err(RangeError::Unsatisfiable { size }) => {
            return Ok((
                StatusCode::RANGE_NOT_SATISFIABLE,
                [(header::CONTENT_RANGE, format!("bytes */{size}"))],
                "requested range not satisfiable",
            )
                .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let stream_body = Body::from_stream(stream);
    let response = match body {
        RangeBody::Full { size } => (
            StatusCode::OK,
            [
                (
                    header::CONTENT_TYPE,
                    "application/octet-stream".to_string(),
                ),
                (header::CONTENT_LENGTH, size.to_string()),
                (header::ACCEPT_RANGES, "bytes".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", query.file_name),
                ),
            ],
            stream_body,
        )
            .into_response(),
        RangeBody::Partial { start, end, size } => (
            StatusCode::PARTIAL_CONTENT,
            [
                (
                    header::CONTENT_TYPE,
                    "application/octet-stream".to_string(),
                ),
                (header::CONTENT_LENGTH, (end - start + 1).to_string()),
                (header::ACCEPT_RANGES, "bytes".to_string()),
                (header::CONTENT_RANGE, format!("bytes {start}-{end}/{size}")),
            ],
            stream_body,
        )
            .into_response(),
    };
    Ok(response)
}
