use crate::domain::error::{AccountError, GuardError};
use crate::transport::http::types::{ApiResponse, DataEnvelope};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }),
    )
        .into_response()
}

pub fn bad_request(message: String) -> Response {
    error_response(StatusCode::BAD_REQUEST, message)
}

/// Wraps `data` in a successful `DataEnvelope`.
pub fn success<T: Serialize>(status: StatusCode, data: &T) -> Response {
    (
        status,
        Json(DataEnvelope {
            success: true,
            data,
        }),
    )
        .into_response()
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = match &self {
            AccountError::NotFound => StatusCode::NOT_FOUND,
            AccountError::DuplicateEmail => StatusCode::CONFLICT,
            AccountError::PasswordUnchanged | AccountError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            AccountError::InternalInconsistency(_)
            | AccountError::Storage(_)
            | AccountError::Credential(_)
            | AccountError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self, "account operation failed");
            return error_response(status, "Internal server error");
        }
        error_response(status, self.to_string())
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        match self {
            GuardError::Storage(e) => {
                error!(error = %e, "guard could not reach storage");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            rejection => {
                warn!(reason = %rejection, "request rejected by access guard");
                error_response(StatusCode::UNAUTHORIZED, rejection.to_string())
            }
        }
    }
}
