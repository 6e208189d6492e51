//! Error responses for the HTTP gateway.
//!
//! Every failure is rendered as an [`ErrorBody`]: `NotFound` as 404, anything else as 500.

use crate::model::OrderId;
use crate::order_actor::OrderError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    Duplicate,
    Internal,
}

/// Tagged error payload: `{kind, entityId, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub entity_id: Option<String>,
    pub message: String,
}

/// An error on its way to becoming an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    /// Maps an order failure for `id`: `NotFound` is 404, anything else 500.
    pub fn for_order(error: OrderError, id: OrderId) -> Self {
        let (status, kind) = match &error {
            OrderError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorKind::NotFound),
            OrderError::Duplicate(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Duplicate),
            OrderError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Internal),
        };
        let entity_id = error.order_id().unwrap_or(id);
        Self {
            status,
            body: ErrorBody {
                kind,
                entity_id: Some(entity_id.to_string()),
                message: error.to_string(),
            },
        }
    }

    /// A path segment that is not an order id.
    pub fn invalid_id(raw: &str, cause: &uuid::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody {
                kind: ErrorKind::Internal,
                entity_id: Some(raw.to_string()),
                message: format!("Invalid order id: {cause}"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = %self.status, kind = ?self.body.kind, message = %self.body.message, "Request failed");
        }
        (self.status, Json(self.body)).into_response()
    }
}
