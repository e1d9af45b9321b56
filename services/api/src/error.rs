//! services/api/src/error.rs
//!
//! Defines the startup error type for the API service and the mapping of
//! domain errors onto HTTP responses.

use crate::config::ConfigError;
use attendance_core::error::CoreError;
use axum::{http::StatusCode, Json};
use serde::Serialize;
use tracing::{error, warn};
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure while applying database migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

//=========================================================================================
// Handler Rejections
//=========================================================================================

/// The JSON body of every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

pub type Rejection = (StatusCode, Json<ErrorBody>);

pub fn rejection(status: StatusCode, message: impl Into<String>) -> Rejection {
    (
        status,
        Json(ErrorBody {
            success: false,
            error: message.into(),
        }),
    )
}

fn status_for(err: &CoreError, not_found: StatusCode) -> StatusCode {
    match err {
        CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        e if e.is_not_found() => not_found,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn reject_with(err: CoreError, not_found: StatusCode) -> Rejection {
    let status = status_for(&err, not_found);
    if status.is_server_error() {
        error!("Request failed: {:?}", err);
    } else {
        warn!("Request rejected: {}", err);
    }
    rejection(status, err.to_string())
}

/// For lookups: a missing record is a 404.
pub fn reject(err: CoreError) -> Rejection {
    reject_with(err, StatusCode::NOT_FOUND)
}

/// For writes: a missing referenced record is a bad request.
pub fn reject_write(err: CoreError) -> Rejection {
    reject_with(err, StatusCode::BAD_REQUEST)
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendance_core::ports::PortError;
    use chrono::NaiveDate;

    #[test]
    fn domain_errors_map_to_client_or_server_statuses() {
        let missing = || CoreError::ClassNotFound("CS101".to_string());
        assert_eq!(reject(missing()).0, StatusCode::NOT_FOUND);
        assert_eq!(reject_write(missing()).0, StatusCode::BAD_REQUEST);

        let marked = CoreError::AlreadyMarked {
            class_id: "CS101".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            hour: "1".to_string(),
        };
        assert_eq!(reject(marked).0, StatusCode::BAD_REQUEST);

        let storage = CoreError::Storage(PortError::Unexpected("connection reset".to_string()));
        let (status, Json(body)) = reject(storage);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.error.contains("connection reset"));
        assert!(!body.success);
    }
}
