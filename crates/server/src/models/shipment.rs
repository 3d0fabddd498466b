//! Persisted shipment records.
//!
//! A record is stored as a JSON document (snake_case keys, the provider's
//! wire casing) plus the store-owned envelope: id and timestamps.
//!
//! The selected rate is stored under `rates`/`rates_object_id`, with its
//! owner, shipment, amounts and carrier account copied to the top level.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shipdesk_core::{Address, ObjectRef, Parcel, ShipmentId, ShipmentStatus};

use crate::shippo::{Rate, Transaction, TransactionRequest};

/// Echo of the inputs the shipment was quoted with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRequestEcho {
    pub address_from: ObjectRef<Address>,
    pub address_to: Address,
    pub parcels: Vec<ObjectRef<Parcel>>,
}

/// The stored document of one shipment.
///
/// Label fields are `None` until the label has been purchased.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentDocument {
    pub request: ShipmentRequestEcho,

    /// Provider shipment id.
    pub object_id: Option<String>,
    pub object_owner: Option<String>,

    pub address_from: Option<Address>,
    /// Notification recipient.
    pub email: String,

    pub parcels: Option<Value>,
    pub shipment_date: Option<String>,
    pub address_return: Option<Address>,

    /// The quote the shipment is booked on.
    #[serde(rename = "rates")]
    pub selected_rate: Rate,
    /// Id of `selected_rate`; the label is bought for this rate.
    #[serde(rename = "rates_object_id")]
    pub rate_object_id: Option<String>,
    pub rates_object_owner: Option<String>,
    pub shipment: Option<String>,
    pub amount: Option<Decimal>,
    pub amount_local: Option<Decimal>,
    pub carrier_account: Option<String>,

    /// Purchased rate id (the selected one until a label exists).
    pub rate: Option<String>,
    pub parcel: Option<Value>,

    pub label_response: Option<Transaction>,
    pub label_url: Option<String>,
    pub transactions_request: Option<TransactionRequest>,
    pub tracking_number: Option<String>,
    pub tracking_url_provider: Option<String>,

    pub item_details: Option<Value>,
    pub item_image: Option<String>,

    pub status: ShipmentStatus,
}

/// A stored shipment: store-assigned id and timestamps around the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub id: ShipmentId,
    #[serde(flatten)]
    pub document: ShipmentDocument,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShipmentRecord {
    #[must_use]
    pub const fn status(&self) -> ShipmentStatus {
        self.document.status
    }
}

/// A document about to be inserted.
#[derive(Debug, Clone)]
pub struct NewShipment {
    pub document: ShipmentDocument,
    pub created_at: DateTime<Utc>,
}

/// Fields written by label purchase.
#[derive(Debug, Clone, Serialize)]
pub struct LabelFields {
    pub label_response: Transaction,
    pub label_url: Option<String>,
    pub transactions_request: TransactionRequest,
    pub rate: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url_provider: Option<String>,
    pub parcel: Option<Value>,
    pub status: ShipmentStatus,
}

/// A partial update: top-level document keys to overwrite, plus the new
/// `updated_at`.
#[derive(Debug, Clone)]
pub struct ShipmentPatch {
    pub fields: Map<String, Value>,
    pub updated_at: DateTime<Utc>,
}

impl ShipmentPatch {
    /// Build a patch from any struct that serializes to a JSON object.
    ///
    /// # Errors
    ///
    /// Returns error if `fields` does not serialize to a JSON object.
    pub fn from_fields<T: Serialize>(
        fields: &T,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(fields)? {
            Value::Object(fields) => Ok(Self { fields, updated_at }),
            other => Err(serde::ser::Error::custom(format!(
                "patch must be a JSON object, got {other}"
            ))),
        }
    }

    /// A patch that only moves the record to `status`.
    #[must_use]
    pub fn status(status: ShipmentStatus, updated_at: DateTime<Utc>) -> Self {
        let mut fields = Map::new();
        fields.insert("status".to_owned(), Value::from(status.as_str()));
        Self { fields, updated_at }
    }
}
