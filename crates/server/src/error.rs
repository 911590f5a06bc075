//! Error responses.
//!
//! Every failure leaves the API as `{"kind": ..., "message": ...}` with a
//! status chosen by the error kind.

use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docqa_core::AppError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

/// An error on its way to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                kind: kind.into(),
                message: message.into(),
            },
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_input", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// HTTP status for an application error.
pub fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::InvalidInput(_) | AppError::Extraction(_) => StatusCode::BAD_REQUEST,
        AppError::Authentication { .. } => StatusCode::UNAUTHORIZED,
        AppError::DimensionMismatch { .. } => StatusCode::CONFLICT,
        AppError::RateLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
        AppError::Generation(_) | AppError::Embedding(_) => StatusCode::BAD_GATEWAY,
        AppError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self::new(status_for(&error), error.kind(), error.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), "invalid_input", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), "invalid_input", rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::new(rejection.status(), "invalid_input", rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        Self::new(error.status(), "invalid_input", error.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(kind = %self.body.kind, status = %self.status, "{}", self.body.message);
        } else {
            tracing::warn!(kind = %self.body.kind, status = %self.status, "{}", self.body.message);
        }
        (self.status, Json(self.body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
