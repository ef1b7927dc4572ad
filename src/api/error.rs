//! API error type and its HTTP mapping.
//!
//! Every error body has the shape `{"detail": "<message>"}`.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;
use crate::task::TaskError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Task {0} not found")]
    NotFound(i64),

    #[error("{0}")]
    Validation(String),

    #[error("Internal server error")]
    Internal(#[from] StoreError),

    #[error("Simulated server error")]
    Injected,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) | Self::Injected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(e: TaskError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::Validation(e.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        Self::Validation(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(e) = &self {
            tracing::error!("Store operation failed: {}", e);
        }
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// A `{"detail": message}` body for non-error responses.
pub fn detail(message: &str) -> Json<serde_json::Value> {
    Json(json!({ "detail": message }))
}
