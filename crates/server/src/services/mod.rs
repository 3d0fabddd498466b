//! Business logic services.
//!
//! # Services
//!
//! - `brevo` - Brevo transactional email client
//! - `email` - Notification email templates
//! - `workflow` - Quote, persist, label and notify coordinator

pub mod brevo;
pub mod email;
pub mod workflow;

pub use brevo::{BrevoClient, NotificationError, Notifier};
pub use workflow::{
    CreateShipmentRequest, CreatedShipment, ShipmentWorkflow, WorkflowError, WorkflowSettings,
};
