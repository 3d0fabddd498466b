//! `PostgreSQL` shipment store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use shipdesk_core::{ShipmentId, ShipmentStatus};
use sqlx::PgPool;
use sqlx::types::Json;
use tokio::sync::OnceCell;
use tracing::instrument;

use super::{RepositoryError, ShipmentStore, create_pool};
use crate::models::{NewShipment, ShipmentDocument, ShipmentPatch, ShipmentRecord};

#[derive(sqlx::FromRow)]
struct ShipmentRow {
    id: ShipmentId,
    document: Json<ShipmentDocument>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ShipmentRow> for ShipmentRecord {
    fn from(row: ShipmentRow) -> Self {
        Self {
            id: row.id,
            document: row.document.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Shipment store backed by the `shipments` table.
///
/// The connection pool is established by the first operation that needs it
/// and shared by every later one; concurrent first callers wait on the same
/// initialization.
pub struct PgShipmentStore {
    database_url: SecretString,
    pool: OnceCell<PgPool>,
}

impl PgShipmentStore {
    /// Create a store that connects on first use.
    #[must_use]
    pub fn new(database_url: SecretString) -> Self {
        Self {
            database_url,
            pool: OnceCell::new(),
        }
    }

    /// Create a store over an existing pool.
    #[must_use]
    pub fn with_pool(pool: PgPool) -> Self {
        Self {
            database_url: SecretString::from(String::new()),
            pool: OnceCell::new_with(Some(pool)),
        }
    }

    /// Whether the pool has been established yet.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.pool.initialized()
    }

    /// The shared pool, connecting if this is the first use.
    ///
    /// # Errors
    ///
    /// Returns error if the connection cannot be established. A failed
    /// attempt is not cached; the next call tries again.
    pub async fn pool(&self) -> Result<&PgPool, RepositoryError> {
        let pool = self
            .pool
            .get_or_try_init(|| async {
                tracing::info!("Connecting to shipment database");
                create_pool(&self.database_url).await
            })
            .await?;
        Ok(pool)
    }
}

#[async_trait]
impl ShipmentStore for PgShipmentStore {
    #[instrument(skip(self, shipment))]
    async fn insert(&self, shipment: NewShipment) -> Result<ShipmentId, RepositoryError> {
        let id = sqlx::query_scalar::<_, ShipmentId>(
            r"
            INSERT INTO shipments (document, created_at, updated_at)
            VALUES ($1, $2, $2)
            RETURNING id
            ",
        )
        .bind(Json(&shipment.document))
        .bind(shipment.created_at)
        .fetch_one(self.pool().await?)
        .await?;

        Ok(id)
    }

    #[instrument(skip(self), fields(shipment_id = %id))]
    async fn find_by_id(&self, id: ShipmentId) -> Result<Option<ShipmentRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, ShipmentRow>(
            r"
            SELECT id, document, created_at, updated_at
            FROM shipments
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool().await?)
        .await?;

        Ok(row.map(ShipmentRecord::from))
    }

    #[instrument(skip(self, patch), fields(shipment_id = %id, fields = patch.fields.len()))]
    async fn update_fields(
        &self,
        id: ShipmentId,
        patch: ShipmentPatch,
    ) -> Result<(), RepositoryError> {
        // jsonb `||` replaces top-level keys and keeps the rest
        let result = sqlx::query(
            r"
            UPDATE shipments
            SET document = document || $2, updated_at = $3
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(Json(&patch.fields))
        .bind(patch.updated_at)
        .execute(self.pool().await?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, patch), fields(shipment_id = %id, expected = %expected))]
    async fn update_fields_if(
        &self,
        id: ShipmentId,
        expected: ShipmentStatus,
        patch: ShipmentPatch,
    ) -> Result<(), RepositoryError> {
        let pool = self.pool().await?;
        let result = sqlx::query(
            r"
            UPDATE shipments
            SET document = document || $2, updated_at = $3
            WHERE id = $1 AND document->>'status' = $4
            ",
        )
        .bind(id)
        .bind(Json(&patch.fields))
        .bind(patch.updated_at)
        .bind(expected.as_str())
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM shipments WHERE id = $1)")
                .bind(id)
                .fetch_one(pool)
                .await?;

        if exists {
            Err(RepositoryError::StatusConflict { expected })
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<ShipmentRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShipmentRow>(
            r"
            SELECT id, document, created_at, updated_at
            FROM shipments
            ORDER BY created_at DESC
            ",
        )
        .fetch_all(self.pool().await?)
        .await?;

        Ok(rows.into_iter().map(ShipmentRecord::from).collect())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(self.pool().await?).await?;
        Ok(())
    }
}
