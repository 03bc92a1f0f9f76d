//! API error types with IntoResponse
//!
//! Callers only ever see two kinds of failure: the referenced user does not
//! exist (404), or the operation failed (500 with a generic message). The
//! detail behind a failure is logged, never returned.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::DbError;

/// The operation a failure belongs to, which picks the generic message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::List => "Failed to fetch users",
            Self::Create => "Failed to create user",
            Self::Update => "Failed to update user",
            Self::Delete => "Failed to delete user",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Anything else: bad input, storage, aborted transaction (500, logged)
    OperationFailed { operation: Operation, detail: String },
}

impl ApiError {
    pub fn failed(operation: Operation, detail: impl fmt::Display) -> Self {
        Self::OperationFailed {
            operation,
            detail: detail.to_string(),
        }
    }

    /// Map a storage error, keeping not-found distinct.
    pub fn from_db(operation: Operation, err: DbError) -> Self {
        match err {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            other => Self::failed(operation, other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound { resource, id } => {
                tracing::debug!(resource, id = %id, "Not found");
                (StatusCode::NOT_FOUND, format!("{resource} not found"))
            }
            Self::OperationFailed { operation, detail } => {
                // Log the actual error, return generic message
                tracing::error!(%operation, error = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    operation.failure_message().to_owned(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
