//! Notification email content.
//!
//! Askama HTML templates for the two customer notifications. Delivery is
//! handled by a [`Notifier`](super::Notifier).

use askama::Template;

/// HTML template for "request received".
#[derive(Template)]
#[template(path = "email/shipment_received.html")]
struct ShipmentReceivedHtml<'a> {
    name: &'a str,
    signature: &'a str,
}

/// HTML template for "label ready".
#[derive(Template)]
#[template(path = "email/label_ready.html")]
struct LabelReadyHtml<'a> {
    name: &'a str,
    label_url: &'a str,
    tracking_url: Option<&'a str>,
    signature: &'a str,
}

/// A rendered email, ready to hand to a notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: &'static str,
    pub html: String,
}

pub const SHIPMENT_RECEIVED_SUBJECT: &str = "Shipment Request Received";
pub const LABEL_READY_SUBJECT: &str = "Label Generated Successfully";

/// Render the confirmation sent after a shipment is quoted and stored.
///
/// # Errors
///
/// Returns error if the template fails to render.
pub fn shipment_received(name: &str, signature: &str) -> Result<RenderedEmail, askama::Error> {
    let html = ShipmentReceivedHtml { name, signature }.render()?;
    Ok(RenderedEmail {
        subject: SHIPMENT_RECEIVED_SUBJECT,
        html,
    })
}

/// Render the email carrying the label and tracking links.
///
/// # Errors
///
/// Returns error if the template fails to render.
pub fn label_ready(
    name: &str,
    label_url: &str,
    tracking_url: Option<&str>,
    signature: &str,
) -> Result<RenderedEmail, askama::Error> {
    let html = LabelReadyHtml {
        name,
        label_url,
        tracking_url,
        signature,
    }
    .render()?;
    Ok(RenderedEmail {
        subject: LABEL_READY_SUBJECT,
        html,
    })
}
