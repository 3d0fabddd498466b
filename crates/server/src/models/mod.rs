//! Domain models for the shipment store.

pub mod shipment;

#[cfg(test)]
pub(crate) use shipment::fixtures;
pub use shipment::{
    LabelFields, NewShipment, ShipmentDocument, ShipmentPatch, ShipmentRecord,
    ShipmentRequestEcho,
};
