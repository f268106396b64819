//! HTTP mapping of the error taxonomy.
//!
//! Requires the `http` feature. Every error answers with a `{code, message}`
//! JSON body so handlers can return `Result<_, RepositoryError>` directly.
//!
//! | Error | Status |
//! |---|---|
//! | [`ApiError`] | its own `status_code` |
//! | [`AppError`], [`DocumentNotFound`] | 422 |
//! | payload encoding failure | 400 `application/validations-fail` |
//! | [`StoreError`] | 400 with [`StoreError::error_info`] |
//! | anything else | 500 `application/internal-error` |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::{ApiError, AppError, DocumentNotFound, RepositoryError};
use crate::store::StoreError;

pub const VALIDATION_FAILED_CODE: &str = "application/validations-fail";
pub const VALIDATION_FAILED_MESSAGE: &str = "Validation fails.";
pub const INTERNAL_ERROR_CODE: &str = "application/internal-error";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error.";

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(json!({ "code": code, "message": message }))).into_response()
}

fn internal_error() -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        INTERNAL_ERROR_CODE,
        INTERNAL_ERROR_MESSAGE,
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error_response(StatusCode::UNPROCESSABLE_ENTITY, &self.code, &self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST);
        error_response(status, &self.error.code, &self.error.message)
    }
}

impl IntoResponse for DocumentNotFound {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let info = self.error_info();
        error_response(StatusCode::BAD_REQUEST, &info.code, &info.message)
    }
}

impl IntoResponse for RepositoryError {
    fn into_response(self) -> Response {
        match self {
            RepositoryError::NotFound(err) => err.into_response(),
            RepositoryError::Store(err) => err.into_response(),
            RepositoryError::Encode(err) => {
                tracing::debug!(error = %err, "rejecting payload");
                error_response(
                    StatusCode::BAD_REQUEST,
                    VALIDATION_FAILED_CODE,
                    VALIDATION_FAILED_MESSAGE,
                )
            }
            err @ RepositoryError::Decode { .. } => {
                tracing::error!(error = %err, "unhandled repository error");
                internal_error()
            }
        }
    }
}
