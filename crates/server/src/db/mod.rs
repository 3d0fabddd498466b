//! Shipment store.
//!
//! # Database
//!
//! ## Tables
//!
//! - `shipments` - One JSONB document per shipment, keyed by a
//!   store-assigned UUID, with `created_at`/`updated_at` columns
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p shipdesk-cli -- migrate
//! ```
//!
//! # Implementations
//!
//! - [`PgShipmentStore`] - `PostgreSQL`, connecting lazily on first use
//! - [`InMemoryShipmentStore`] - process-local map, for tests and local runs

pub mod memory;
pub mod shipments;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use shipdesk_core::{ShipmentId, ShipmentStatus};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::models::{NewShipment, ShipmentPatch, ShipmentRecord};

pub use memory::InMemoryShipmentStore;
pub use shipments::PgShipmentStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A document could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Requested record was not found.
    #[error("not found")]
    NotFound,

    /// A conditional update found the record in another state.
    #[error("shipment is not {expected}")]
    StatusConflict { expected: ShipmentStatus },
}

/// Persistence for shipment records (a single collection).
///
/// There are no transactions spanning the store and the remote providers:
/// callers must expect records whose later workflow steps never happened.
#[async_trait]
pub trait ShipmentStore: Send + Sync {
    /// Append a record and return the id the store assigned to it.
    async fn insert(&self, shipment: NewShipment) -> Result<ShipmentId, RepositoryError>;

    /// Fetch one record.
    async fn find_by_id(&self, id: ShipmentId) -> Result<Option<ShipmentRecord>, RepositoryError>;

    /// Overwrite the patch's top-level document keys and set `updated_at`.
    ///
    /// Returns [`RepositoryError::NotFound`] if no record has this id.
    async fn update_fields(
        &self,
        id: ShipmentId,
        patch: ShipmentPatch,
    ) -> Result<(), RepositoryError>;

    /// Like [`update_fields`](Self::update_fields), but only while the
    /// record's `status` is `expected`. The check and the write are atomic.
    ///
    /// Returns [`RepositoryError::StatusConflict`] if the record is in
    /// another state and [`RepositoryError::NotFound`] if it doesn't exist.
    async fn update_fields_if(
        &self,
        id: ShipmentId,
        expected: ShipmentStatus,
        patch: ShipmentPatch,
    ) -> Result<(), RepositoryError>;

    /// All records, most recently created first.
    async fn list_all(&self) -> Result<Vec<ShipmentRecord>, RepositoryError>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
