//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps lifecycle, validation and storage errors to HTTP status codes and
//! a JSON body with error code, message and optional details. Internal
//! error messages are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use nir_core::{NirError, ValidationError};
use nir_state::BedError;
use nir_store::{ServiceError, StoreError};

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "CONFLICT").
    pub code: String,
    pub message: String,
    /// Extra context for some client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Unknown bed, sector or reference record (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Invalid transition, record in use, or a concurrent write (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The caller acted on a stale bed version (409).
    #[error("conflict: {message}")]
    StaleVersion {
        message: String,
        expected: u64,
        found: u64,
    },

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Conflict(_) | Self::StaleVersion { .. } => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::StaleVersion {
                expected, found, ..
            } => Some(serde_json::json!({
                "expected_version": expected,
                "current_version": found,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Identifier parse failures in the path are client errors.
impl From<NirError> for AppError {
    fn from(err: NirError) -> Self {
        match err {
            NirError::Validation(v) => v.into(),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl From<BedError> for AppError {
    fn from(err: BedError) -> Self {
        match &err {
            BedError::BedNotFound(_) | BedError::SectorNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            BedError::Validation(_) | BedError::SameBed(_) => Self::Validation(err.to_string()),
            BedError::VersionConflict {
                expected, found, ..
            } => Self::StaleVersion {
                message: err.to_string(),
                expected: *expected,
                found: *found,
            },
            BedError::InvalidTransition { .. }
            | BedError::BedInUse { .. }
            | BedError::DuplicateNumber { .. }
            | BedError::SectorInUse(_) => Self::Conflict(err.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => Self::Conflict(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Bed(e) => e.into(),
            ServiceError::Validation(e) => e.into(),
            ServiceError::NotFound { .. } => Self::NotFound(err.to_string()),
            ServiceError::Duplicate { .. } => Self::Conflict(err.to_string()),
            ServiceError::Store(e) => e.into(),
        }
    }
}
