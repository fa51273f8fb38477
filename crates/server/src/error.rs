use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use filepile_assembly::AssemblyError;
use filepile_range::RangeError;
use filepile_store::StoreError;

/// An error surfaced to HTTP callers with a distinguishable status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::bad_request(format!("missing required field: {field}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, "{}", self.message);
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::InvalidName(_) | StoreError::IndexOutOfRange { .. } => {
                StatusCode::BAD_REQUEST
            }
            StoreError::InconsistentTotalChunks { .. } => StatusCode::CONFLICT,
            StoreError::NotFound(_) | StoreError::ChunkMissing { .. } => StatusCode::NOT_FOUND,
            StoreError::Io(_) | StoreError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<AssemblyError> for ApiError {
    fn from(err: AssemblyError) -> Self {
        match err {
            AssemblyError::Store(e) => e.into(),
            // Chunks stay on disk for a retry; the caller just sees a
            // server-side failure for this request.
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    }
}

impl From<RangeError> for ApiError {
    fn from(err: RangeError) -> Self {
        let status = match &err {
            RangeError::Malformed(_) => StatusCode::BAD_REQUEST,
            RangeError::Unsatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            RangeError::NotFound(_) => StatusCode::NOT_FOUND,
            RangeError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_distinct_statuses() {
        let err: ApiError = StoreError::InvalidName("..".into()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: ApiError = StoreError::InconsistentTotalChunks {
            recorded: 3,
            declared: 4,
        }
        .into();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err: ApiError = StoreError::NotFound("x".into()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn range_errors_map_to_http_statuses() {
        let err: ApiError = RangeError::Unsatisfiable { size: 10 }.into();
        assert_eq!(err.status, StatusCode::RANGE_NOT_SATISFIABLE);

        let err: ApiError = RangeError::Malformed("bits=0-1".into()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn assembly_incomplete_is_internal() {
        let err: ApiError = AssemblyError::Incomplete {
            name: "f".into(),
            index: 2,
        }
        .into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
