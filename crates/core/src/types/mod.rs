//! Core types for shipdesk.
//!
//! This module provides type-safe wrappers for the shipment domain.

pub mod address;
pub mod email;
pub mod id;
pub mod service_level;
pub mod status;

pub use address::{Address, Measure, ObjectRef, Parcel};
pub use email::{Email, EmailError};
pub use id::*;
pub use service_level::ServiceLevelToken;
pub use status::ShipmentStatus;
