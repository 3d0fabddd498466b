//! shipdesk core - shared shipment domain types.
//!
//! This crate provides the types used by every shipdesk component:
//! - `server` - Shipment request handler (quote, label, notify)
//! - `cli` - Command-line tools for migrations and inspection
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. The carrier-rate provider's wire shapes live with the
//! client in the server crate; only the values the workflow reasons about
//! are modelled here.
//!
//! # Modules
//!
//! - [`types`] - Shipment ids, email addresses, postal addresses, parcels,
//!   service levels and the shipment lifecycle

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
