//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (shipment store reachable)
//!
//! # Shipments
//! POST /api/shipment?action=create  - Quote and store a shipment
//! POST /api/shipment?action=label   - Purchase the label for a stored shipment
//! GET  /api/shipment                - List shipments, newest first
//! ```
//!
//! Any other method or action on `/api/shipment` answers 405.

pub mod health;
pub mod shipments;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Build the complete router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route(
            "/api/shipment",
            get(shipments::list)
                .post(shipments::command)
                .fallback(shipments::method_not_allowed),
        )
}
