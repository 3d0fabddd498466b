//! Postal addresses and parcels as exchanged with the carrier-rate provider.
//!
//! Both types keep any fields they don't model in `extra`, so that a value
//! received from a client or the provider is echoed back unchanged when it is
//! persisted or forwarded. Either may also be given as the id of an object
//! the provider already holds; see [`ObjectRef`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A postal address (sender, recipient, or return address).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Contact email. Kept as a raw string: providers echo `""` for unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Provider-specific fields (`object_id`, `is_residential`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Address {
    /// Name to greet in notifications; empty when unknown.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().map_or("", str::trim)
    }

    /// Contact email if one is set and non-blank.
    #[must_use]
    pub fn contact_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

/// A parcel dimension or weight.
///
/// The provider accepts numbers and returns decimal strings (`"5.0000"`);
/// whichever form was received is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measure {
    Number(serde_json::Number),
    Text(String),
}

/// A physical parcel to quote and ship.
///
/// Dimensions may be left out when a carrier `template` such as
/// `USPS_FlatRateEnvelope` fixes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Measure>,
    /// `in`, `cm`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_unit: Option<String>,
    /// Carrier parcel template token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    pub weight: Measure,
    /// `lb`, `oz`, `kg`, ...
    pub mass_unit: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A provider object given either inline or by its `object_id`.
///
/// Serializes as whichever form was received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectRef<T> {
    Id(String),
    Inline(T),
}

impl<T> ObjectRef<T> {
    /// The inline object, if this is not an id reference.
    #[must_use]
    pub const fn inline(&self) -> Option<&T> {
        match self {
            Self::Id(_) => None,
            Self::Inline(value) => Some(value),
        }
    }
}

impl<T> From<T> for ObjectRef<T> {
    fn from(value: T) -> Self {
        Self::Inline(value)
    }
}
