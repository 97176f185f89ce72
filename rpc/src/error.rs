//! RPC error type and its HTTP mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use custos_governance::{ErrorClass, GovernanceError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error("missing or malformed bearer token")]
    MissingToken,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Governance(e) => {
                let status = match e.class() {
                    ErrorClass::Auth => StatusCode::UNAUTHORIZED,
                    ErrorClass::Authorization => StatusCode::FORBIDDEN,
                    ErrorClass::State if matches!(e, GovernanceError::NotFound { .. }) => {
                        StatusCode::NOT_FOUND
                    }
                    ErrorClass::State => StatusCode::CONFLICT,
                    ErrorClass::Validation => StatusCode::BAD_REQUEST,
                    ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.code())
            }
            Self::MissingToken => (StatusCode::UNAUTHORIZED, "SESSION_INVALID"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
            Self::Server(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }
}

impl From<JsonRejection> for RpcError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Storage and internal failures stay in the operator log.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "an internal error occurred".to_string()
        } else {
            tracing::debug!(error = %self, code, "request rejected");
            self.to_string()
        };

        let body = ErrorBody {
            error: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
