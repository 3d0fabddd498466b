//! Shipment workflow coordinator.
//!
//! Drives one shipment through quote, persistence, label purchase and the two
//! customer notifications:
//!
//! 1. `create` - validate, quote against the fixed destination, keep the rate
//!    matching the required service level, insert the record, send
//!    "request received"
//! 2. `generate_label` - claim the record (`quoted` to `label_pending`), buy a
//!    label for the stored rate, write the label fields and `labeled`, send
//!    "label ready". A failed purchase hands the record back to `quoted`.
//! 3. `list` - every record, newest first
//!
//! Steps run strictly in order and nothing is retried or rolled back. An error
//! returned after the insert or the label update means the record already
//! reflects the completed steps.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use shipdesk_core::{
    Address, Email, ObjectRef, Parcel, ServiceLevelToken, ShipmentId, ShipmentStatus,
};
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::brevo::{NotificationError, Notifier};
use super::email;
use crate::config::DEFAULT_SENDER_NAME;
use crate::db::{RepositoryError, ShipmentStore};
use crate::models::{
    LabelFields, NewShipment, ShipmentDocument, ShipmentPatch, ShipmentRecord,
    ShipmentRequestEcho,
};
use crate::shippo::{
    ObjectStatus, RateProvider, ShipmentRequest, ShippoError, Transaction, TransactionRequest,
};

pub const DESTINATION_NAME: &str = "Mr. Goods";
pub const DESTINATION_STREET: &str = "965 Mission St";
pub const DESTINATION_CITY: &str = "San Francisco";
pub const DESTINATION_STATE: &str = "CA";
pub const DESTINATION_ZIP: &str = "94105";
pub const DESTINATION_COUNTRY: &str = "US";
pub const DESTINATION_EMAIL: &str = "admin@company.com";

/// Label format requested from the provider.
pub const DEFAULT_LABEL_FILE_TYPE: &str = "PDF_4x6";

/// The address every shipment is sent to.
#[must_use]
pub fn default_destination() -> Address {
    Address {
        name: Some(DESTINATION_NAME.to_owned()),
        street1: Some(DESTINATION_STREET.to_owned()),
        city: Some(DESTINATION_CITY.to_owned()),
        state: Some(DESTINATION_STATE.to_owned()),
        zip: Some(DESTINATION_ZIP.to_owned()),
        country: Some(DESTINATION_COUNTRY.to_owned()),
        email: Some(DESTINATION_EMAIL.to_owned()),
        ..Address::default()
    }
}

/// Fixed inputs of the workflow.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Destination of every quoted shipment.
    pub destination: Address,
    /// The only service level a shipment may be booked on.
    pub service_level: ServiceLevelToken,
    pub label_file_type: String,
    /// Sign-off used in notification emails.
    pub signature: String,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            service_level: ServiceLevelToken::default(),
            label_file_type: DEFAULT_LABEL_FILE_TYPE.to_owned(),
            signature: DEFAULT_SENDER_NAME.to_owned(),
        }
    }
}

/// Errors returned by workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Required input missing or malformed.
    #[error("Invalid payload: {0}")]
    Validation(String),

    /// The quote had no rate at the required service level.
    #[error("{} rate not available for this shipment", .service_level.display_name())]
    RateUnavailable { service_level: ServiceLevelToken },

    /// The provider answered the quote with a non-success status.
    #[error("Shipment creation failed")]
    QuoteRejected { status: ObjectStatus },

    /// The provider answered the label purchase with a non-success status.
    #[error("Label generation failed")]
    LabelRejected { status: ObjectStatus },

    /// A label was already purchased for this record.
    #[error("Label already generated for this shipment")]
    AlreadyLabeled,

    /// Another label purchase for this record has not finished.
    #[error("Label generation already in progress for this shipment")]
    LabelInProgress,

    /// Unknown record, or a record without a rate to purchase.
    #[error("Shipment or rate_id not found")]
    NotFound,

    /// Transport or API failure talking to the rate provider.
    #[error("Rate provider error: {0}")]
    Provider(#[from] ShippoError),

    /// Notification could not be rendered or delivered.
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),
}

/// Input of the create operation.
///
/// Fields are optional so that missing ones surface as
/// [`WorkflowError::Validation`] rather than as a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateShipmentRequest {
    #[serde(default)]
    pub address_from: Option<ObjectRef<Address>>,
    #[serde(default)]
    pub parcels: Option<Vec<ObjectRef<Parcel>>>,
    #[serde(default)]
    pub item_details: Option<Value>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Result of a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedShipment {
    pub id: ShipmentId,
    pub rate_object_id: String,
}

/// Coordinates the rate provider, the shipment store and the notifier.
#[derive(Clone)]
pub struct ShipmentWorkflow {
    store: Arc<dyn ShipmentStore>,
    rates: Arc<dyn RateProvider>,
    notifier: Arc<dyn Notifier>,
    settings: WorkflowSettings,
}

impl ShipmentWorkflow {
    #[must_use]
    pub fn new(
        store: Arc<dyn ShipmentStore>,
        rates: Arc<dyn RateProvider>,
        notifier: Arc<dyn Notifier>,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            store,
            rates,
            notifier,
            settings,
        }
    }

    #[must_use]
    pub fn store(&self) -> &dyn ShipmentStore {
        self.store.as_ref()
    }

    #[must_use]
    pub const fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Quote a shipment, persist it and confirm receipt to the customer.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::Validation`] before any remote call
    /// - [`WorkflowError::QuoteRejected`] / [`WorkflowError::RateUnavailable`]
    ///   with nothing persisted
    /// - [`WorkflowError::Notification`] after the record was inserted
    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        request: CreateShipmentRequest,
    ) -> Result<CreatedShipment, WorkflowError> {
        let (address_from, parcels, contact) =
            validate(request.address_from, request.parcels, request.email)?;

        let quote = self
            .rates
            .quote_shipment(&ShipmentRequest {
                address_from: address_from.clone(),
                address_to: self.settings.destination.clone(),
                parcels: parcels.clone(),
                is_async: false,
            })
            .await?;

        if !quote.status.is_success() {
            warn!(status = %quote.status, messages = ?quote.messages, "Quote not successful");
            return Err(WorkflowError::QuoteRejected {
                status: quote.status,
            });
        }

        let Some(selected_rate) = quote
            .rates
            .iter()
            .find(|rate| self.settings.service_level.matches(rate.extended_token()))
            .cloned()
        else {
            info!(
                rates = quote.rates.len(),
                service_level = %self.settings.service_level,
                "No rate at the required service level"
            );
            return Err(WorkflowError::RateUnavailable {
                service_level: self.settings.service_level.clone(),
            });
        };

        let rate_object_id = selected_rate.object_id.clone();
        let greeting = address_from
            .inline()
            .or(quote.address_from.as_ref())
            .map(Address::display_name)
            .unwrap_or_default()
            .to_owned();
        let recipient = quote
            .address_from
            .as_ref()
            .and_then(Address::contact_email)
            .map_or_else(|| contact.as_str().to_owned(), str::to_owned);

        let document = ShipmentDocument {
            request: ShipmentRequestEcho {
                address_from,
                address_to: self.settings.destination.clone(),
                parcels,
            },
            object_id: quote.object_id,
            object_owner: quote.object_owner,
            address_from: quote.address_from,
            email: recipient,
            parcels: quote.parcels,
            shipment_date: quote.shipment_date,
            address_return: quote.address_return,
            rate_object_id: Some(rate_object_id.clone()),
            rates_object_owner: selected_rate.object_owner.clone(),
            shipment: selected_rate.shipment.clone(),
            amount: selected_rate.amount,
            amount_local: selected_rate.amount_local,
            carrier_account: selected_rate.carrier_account.clone(),
            rate: Some(rate_object_id.clone()),
            parcel: selected_rate.parcel.clone(),
            selected_rate,
            label_response: None,
            label_url: None,
            transactions_request: None,
            tracking_number: None,
            tracking_url_provider: None,
            item_details: request.item_details,
            item_image: None,
            status: ShipmentStatus::Quoted,
        };

        let id = self
            .store
            .insert(NewShipment {
                document,
                created_at: Utc::now(),
            })
            .await?;
        info!(shipment_id = %id, rate_id = %rate_object_id, "Shipment stored");

        let message = email::shipment_received(&greeting, &self.settings.signature)
            .map_err(NotificationError::from)?;
        self.notifier
            .send(contact.as_str(), message.subject, &message.html)
            .await?;

        Ok(CreatedShipment { id, rate_object_id })
    }

    /// Purchase the label for a stored shipment and send it to the customer.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::NotFound`] for an unknown id or a record without a
    ///   rate id, before any remote call
    /// - [`WorkflowError::AlreadyLabeled`] if a label was already bought
    /// - [`WorkflowError::LabelInProgress`] if another purchase holds the
    ///   record
    /// - [`WorkflowError::LabelRejected`] if the purchase did not succeed; the
    ///   record is back in `quoted`
    /// - [`WorkflowError::Notification`] after the record was updated
    #[instrument(skip(self))]
    pub async fn generate_label(&self, id: &str) -> Result<(), WorkflowError> {
        let id: ShipmentId = id.parse().map_err(|_| WorkflowError::NotFound)?;
        let record = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(WorkflowError::NotFound)?;

        let Some(rate_id) = record.document.rate_object_id.clone() else {
            return Err(WorkflowError::NotFound);
        };
        match record.status() {
            status if status.can_transition_to(ShipmentStatus::LabelPending) => {}
            ShipmentStatus::Labeled => return Err(WorkflowError::AlreadyLabeled),
            _ => return Err(WorkflowError::LabelInProgress),
        }

        self.store
            .update_fields_if(
                id,
                record.status(),
                ShipmentPatch::status(ShipmentStatus::LabelPending, Utc::now()),
            )
            .await
            .map_err(|err| match err {
                RepositoryError::StatusConflict { .. } => WorkflowError::LabelInProgress,
                other => WorkflowError::Store(other),
            })?;

        let transactions_request = TransactionRequest {
            rate: rate_id.clone(),
            label_file_type: self.settings.label_file_type.clone(),
            is_async: false,
        };
        let transaction = match self.purchase(id, &transactions_request).await {
            Ok(transaction) => transaction,
            Err(err) => {
                self.release(id).await;
                return Err(err);
            }
        };

        let fields = LabelFields {
            label_url: transaction.label_url.clone(),
            transactions_request,
            rate: transaction.rate.clone().or(Some(rate_id)),
            tracking_number: transaction.tracking_number.clone(),
            tracking_url_provider: transaction.tracking_url_provider.clone(),
            parcel: transaction.parcel.clone(),
            label_response: transaction,
            status: ShipmentStatus::Labeled,
        };
        let patch =
            ShipmentPatch::from_fields(&fields, Utc::now()).map_err(RepositoryError::from)?;
        self.store
            .update_fields_if(id, ShipmentStatus::LabelPending, patch)
            .await?;
        info!(shipment_id = %id, tracking_number = ?fields.tracking_number, "Label stored");

        let name = record
            .document
            .address_from
            .as_ref()
            .map_or("", Address::display_name);
        let message = email::label_ready(
            name,
            fields.label_url.as_deref().unwrap_or_default(),
            fields.tracking_url_provider.as_deref(),
            &self.settings.signature,
        )
        .map_err(NotificationError::from)?;
        self.notifier
            .send(&record.document.email, message.subject, &message.html)
            .await?;

        Ok(())
    }

    /// All records, most recently created first.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ShipmentRecord>, WorkflowError> {
        Ok(self.store.list_all().await?)
    }

    async fn purchase(
        &self,
        id: ShipmentId,
        request: &TransactionRequest,
    ) -> Result<Transaction, WorkflowError> {
        let transaction = self.rates.purchase_label(request).await?;
        if !transaction.status.is_success() {
            warn!(
                shipment_id = %id,
                status = %transaction.status,
                messages = ?transaction.messages,
                "Label purchase not successful"
            );
            return Err(WorkflowError::LabelRejected {
                status: transaction.status,
            });
        }
        Ok(transaction)
    }

    /// Hand a claimed record back to `quoted` so the label can be retried.
    async fn release(&self, id: ShipmentId) {
        let patch = ShipmentPatch::status(ShipmentStatus::Quoted, Utc::now());
        if let Err(err) = self
            .store
            .update_fields_if(id, ShipmentStatus::LabelPending, patch)
            .await
        {
            warn!(shipment_id = %id, error = %err, "Failed to release label claim");
        }
    }
}

type ValidRequest = (ObjectRef<Address>, Vec<ObjectRef<Parcel>>, Email);

fn validate(
    address_from: Option<ObjectRef<Address>>,
    parcels: Option<Vec<ObjectRef<Parcel>>>,
    email: Option<String>,
) -> Result<ValidRequest, WorkflowError> {
    let address_from =
        address_from.ok_or_else(|| WorkflowError::Validation("address_from is required".into()))?;
    let parcels = parcels
        .filter(|parcels| !parcels.is_empty())
        .ok_or_else(|| WorkflowError::Validation("parcels are required".into()))?;
    let email = email
        .ok_or_else(|| WorkflowError::Validation("email is required".into()))
        .and_then(|email| {
            Email::parse(&email).map_err(|e| WorkflowError::Validation(format!("email: {e}")))
        })?;
    Ok((address_from, parcels, email))
}
