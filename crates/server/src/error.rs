//! Unified error handling for the HTTP surface.
//!
//! Every failure is rendered as `{"error": "<message>"}` with a status code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::WorkflowError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// A workflow operation failed.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unknown verb/action combination.
    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl AppError {
    /// Status code the error is rendered with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Workflow(err) => match err {
                WorkflowError::Validation(_) => StatusCode::BAD_REQUEST,
                WorkflowError::RateUnavailable { .. }
                | WorkflowError::QuoteRejected { .. }
                | WorkflowError::AlreadyLabeled => StatusCode::UNPROCESSABLE_ENTITY,
                WorkflowError::NotFound => StatusCode::NOT_FOUND,
                WorkflowError::LabelInProgress => StatusCode::CONFLICT,
                WorkflowError::LabelRejected { .. }
                | WorkflowError::Provider(_)
                | WorkflowError::Notification(_)
                | WorkflowError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Message returned to the client.
    fn public_message(&self) -> String {
        // Don't expose provider or database details to clients
        match self {
            Self::Workflow(WorkflowError::Provider(_)) => "Rate provider error".to_string(),
            Self::Workflow(WorkflowError::Notification(_)) => {
                "Notification delivery failed".to_string()
            }
            Self::Workflow(WorkflowError::Store(_)) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Shipment request error"
            );
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
