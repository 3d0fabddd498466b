//! Shipment command handlers.
//!
//! `POST /api/shipment` dispatches on the `action` query parameter. Bodies are
//! read as raw bytes and decoded per action so that malformed JSON answers
//! 400 with the same error shape as every other failure.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use shipdesk_core::ShipmentId;
use tracing::instrument;

use crate::error::AppError;
use crate::models::ShipmentRecord;
use crate::services::CreateShipmentRequest;
use crate::state::AppState;

/// Query string of `POST /api/shipment`.
#[derive(Debug, Default, Deserialize)]
pub struct CommandQuery {
    pub action: Option<String>,
}

/// Body of `POST /api/shipment?action=label`.
#[derive(Debug, Deserialize)]
pub struct LabelRequest {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateShipmentResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub rate_object_id: String,
    pub id: ShipmentId,
}

#[derive(Debug, Serialize)]
pub struct LabelResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Dispatch a shipment command.
///
/// # Errors
///
/// Returns 405 for a missing or unknown action, 400 for a malformed body,
/// and the workflow's error otherwise.
#[instrument(skip(state, body))]
pub async fn command(
    State(state): State<AppState>,
    Query(query): Query<CommandQuery>,
    body: Bytes,
) -> Result<Response, AppError> {
    match query.action.as_deref() {
        Some("create") => create(&state, &body).await.map(IntoResponse::into_response),
        Some("label") => label(&state, &body).await.map(IntoResponse::into_response),
        _ => Err(AppError::MethodNotAllowed),
    }
}

async fn create(state: &AppState, body: &[u8]) -> Result<Json<CreateShipmentResponse>, AppError> {
    let request: CreateShipmentRequest = parse_body(body)?;
    let created = state.workflow().create(request).await?;

    Ok(Json(CreateShipmentResponse {
        status: "success",
        message: "Shipment created successfully",
        rate_object_id: created.rate_object_id,
        id: created.id,
    }))
}

async fn label(state: &AppState, body: &[u8]) -> Result<Json<LabelResponse>, AppError> {
    let request: LabelRequest = parse_body(body)?;
    let id = request
        .id
        .ok_or_else(|| AppError::BadRequest("id is required".to_string()))?;
    state.workflow().generate_label(&id).await?;

    Ok(Json(LabelResponse {
        status: "success",
        message: "Label generated successfully",
    }))
}

/// List all shipments, newest first.
///
/// # Errors
///
/// Returns error if the store cannot be read.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ShipmentRecord>>, AppError> {
    Ok(Json(state.workflow().list().await?))
}

/// Fallback for unsupported methods on `/api/shipment`.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid payload: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body_rejects_malformed_json() {
        let result: Result<LabelRequest, _> = parse_body(b"{not json");
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_parse_body_allows_missing_fields() {
        let request: CreateShipmentRequest = parse_body(b"{}").unwrap();
        assert!(request.address_from.is_none());
        assert!(request.email.is_none());

        let request: LabelRequest = parse_body(br#"{"id": "abc"}"#).unwrap();
        assert_eq!(request.id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_create_response_shape() {
        let id = ShipmentId::generate();
        let value = serde_json::to_value(CreateShipmentResponse {
            status: "success",
            message: "Shipment created successfully",
            rate_object_id: "rate_1".to_string(),
            id,
        })
        .unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["rate_object_id"], "rate_1");
        assert_eq!(value["id"], id.to_string());
    }
}
