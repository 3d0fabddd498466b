//! Shippo API types.
//!
//! Only the fields the workflow reads are modelled; everything else the
//! provider returns is kept in `extra` so stored copies stay complete.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shipdesk_core::{Address, ObjectRef, Parcel};

/// Object status reported on shipments and transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectStatus {
    Success,
    Queued,
    Waiting,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ObjectStatus {
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for ObjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "SUCCESS",
            Self::Queued => "QUEUED",
            Self::Waiting => "WAITING",
            Self::Error => "ERROR",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Informational or error message attached to a provider object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMessage {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Body of `POST /shipments/`.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentRequest {
    pub address_from: ObjectRef<Address>,
    pub address_to: Address,
    pub parcels: Vec<ObjectRef<Parcel>>,
    /// Always `false`: rates are returned in the response.
    #[serde(rename = "async")]
    pub is_async: bool,
}

/// A created shipment with its rate quotes.
#[derive(Debug, Clone, Deserialize)]
pub struct Shipment {
    #[serde(default)]
    pub status: ObjectStatus,
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub object_owner: Option<String>,
    #[serde(default)]
    pub address_from: Option<Address>,
    #[serde(default)]
    pub address_to: Option<Address>,
    #[serde(default)]
    pub address_return: Option<Address>,
    #[serde(default)]
    pub parcels: Option<Value>,
    #[serde(default)]
    pub shipment_date: Option<String>,
    #[serde(default)]
    pub rates: Vec<Rate>,
    #[serde(default)]
    pub messages: Vec<ProviderMessage>,
}

/// Service level of a rate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceLevel {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub extended_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A priced shipping option for a shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub object_id: String,
    #[serde(default)]
    pub object_owner: Option<String>,
    /// Id of the shipment the rate was quoted for.
    #[serde(default)]
    pub shipment: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub amount_local: Option<Decimal>,
    #[serde(default)]
    pub currency_local: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub carrier_account: Option<String>,
    #[serde(default)]
    pub servicelevel: ServiceLevel,
    #[serde(default)]
    pub parcel: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Rate {
    /// The rate's `servicelevel.extended_token`, if present.
    #[must_use]
    pub fn extended_token(&self) -> Option<&str> {
        self.servicelevel.extended_token.as_deref()
    }
}

/// Body of `POST /transactions/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub rate: String,
    pub label_file_type: String,
    /// Always `false`: the label is returned in the response.
    #[serde(rename = "async")]
    pub is_async: bool,
}

/// A label purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub status: ObjectStatus,
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub label_url: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_url_provider: Option<String>,
    /// Id of the purchased rate.
    #[serde(default)]
    pub rate: Option<String>,
    #[serde(default)]
    pub parcel: Option<Value>,
    #[serde(default)]
    pub messages: Vec<ProviderMessage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_status_is_not_success() {
        let shipment: Shipment =
            serde_json::from_value(json!({"status": "PARTIAL", "rates": []})).unwrap();
        assert_eq!(shipment.status, ObjectStatus::Unknown);
        assert!(!shipment.status.is_success());
    }

    #[test]
    fn test_missing_status_defaults_to_unknown() {
        let tx: Transaction = serde_json::from_value(json!({"label_url": "x"})).unwrap();
        assert_eq!(tx.status, ObjectStatus::Unknown);
    }

    #[test]
    fn test_rate_parses_string_amounts() {
        let rate: Rate = serde_json::from_value(json!({
            "object_id": "rate_1",
            "amount": "7.45",
            "currency": "USD",
            "servicelevel": {"name": "Ground Advantage", "token": "usps_ground_advantage",
                             "extended_token": "usps_ground_advantage"},
            "estimated_days": 3
        }))
        .unwrap();
        assert_eq!(rate.amount, Some(Decimal::new(745, 2)));
        assert_eq!(rate.extended_token(), Some("usps_ground_advantage"));
        assert_eq!(rate.extra.get("estimated_days"), Some(&json!(3)));
    }

    #[test]
    fn test_requests_serialize_async_flag() {
        let body = serde_json::to_value(TransactionRequest {
            rate: "rate_1".to_owned(),
            label_file_type: "PDF_4x6".to_owned(),
            is_async: false,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"rate": "rate_1", "label_file_type": "PDF_4x6", "async": false})
        );
    }
}
