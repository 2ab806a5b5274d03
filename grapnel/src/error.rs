//! Mapping of core errors onto the HTTP error envelope.
//!
//! Every failing request answers `{"error": "<message>"}`: 400 for envelope validation
//! failures, 404 where a missing service or method is distinguishable, 500 for
//! everything that went wrong past validation. Messages are the human-readable ones the
//! core errors already carry; no stack traces cross this boundary.
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use grapnel_core::connect::ConnectError;
use grapnel_core::invoke::InvokeError;
use grapnel_core::schema::SchemaError;
use serde::Serialize;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(status = %self.status, error = %self.message, "request failed");
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<ConnectError> for ApiError {
    fn from(err: ConnectError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<SchemaError> for ApiError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::ServiceNotFound { .. } | SchemaError::MethodNotFound { .. } => {
                Self::not_found(err.to_string())
            }
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<InvokeError> for ApiError {
    fn from(err: InvokeError) -> Self {
        match err {
            InvokeError::InvalidMethod(_) => Self::bad_request(err.to_string()),
            InvokeError::Schema(inner) => inner.into(),
            other => Self::internal(other.to_string()),
        }
    }
}
