//! Shipment inspection commands.
//!
//! Records are printed to stdout as JSON in the same shape `GET
//! /api/shipment` returns; logs go to stderr.

use std::io::Write;

use shipdesk_core::{ShipmentId, ShipmentStatus};
use shipdesk_server::db::{PgShipmentStore, RepositoryError, ShipmentStore};
use thiserror::Error;

/// Errors that can occur while reading shipments.
#[derive(Debug, Error)]
pub enum ShipmentsError {
    #[error("Missing environment variable: SHIPDESK_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    #[error("Invalid shipment id: {0}")]
    InvalidId(String),

    #[error("Shipment not found: {0}")]
    NotFound(ShipmentId),

    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn store() -> Result<PgShipmentStore, ShipmentsError> {
    let database_url = super::database_url().ok_or(ShipmentsError::MissingDatabaseUrl)?;
    Ok(PgShipmentStore::new(database_url))
}

/// Print shipments, newest first, one JSON document per line.
///
/// # Errors
///
/// Returns error if the store cannot be read or stdout is closed.
pub async fn list(limit: Option<usize>) -> Result<(), ShipmentsError> {
    let records = store()?.list_all().await?;
    let shown = limit.unwrap_or(records.len());
    let labeled = records
        .iter()
        .filter(|record| record.status() == ShipmentStatus::Labeled)
        .count();
    tracing::info!(
        total = records.len(),
        labeled,
        shown = shown.min(records.len()),
        "Listing shipments"
    );

    let mut out = std::io::stdout().lock();
    for record in records.iter().take(shown) {
        writeln!(out, "{}", serde_json::to_string(record)?)?;
    }
    Ok(())
}

/// Print one shipment as pretty JSON.
///
/// # Errors
///
/// Returns error if the id is malformed, unknown, or the store cannot be read.
pub async fn show(id: &str) -> Result<(), ShipmentsError> {
    let id: ShipmentId = id
        .parse()
        .map_err(|_| ShipmentsError::InvalidId(id.to_owned()))?;
    let record = store()?
        .find_by_id(id)
        .await?
        .ok_or(ShipmentsError::NotFound(id))?;
    tracing::info!(shipment_id = %id, status = %record.status(), "Shipment");

    writeln!(
        std::io::stdout().lock(),
        "{}",
        serde_json::to_string_pretty(&record)?
    )?;
    Ok(())
}
