//! Brevo transactional email client.
//!
//! - Endpoint: `POST {BREVO_BASE_URL}/smtp/email`
//! - Authentication: `api-key` header
//!
//! One sender identity (from configuration), one recipient per message.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::config::BrevoConfig;

/// Errors that can occur when sending a notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider rejected the message.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Client could not be configured.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Sends transactional HTML email to a single recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        to_email: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), NotificationError>;
}

#[derive(Debug, Serialize)]
struct Contact<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailRequest<'a> {
    sender: Contact<'a>,
    to: [Contact<'a>; 1],
    subject: &'a str,
    html_content: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailResponse {
    #[serde(default)]
    message_id: Option<String>,
}

/// Brevo API client.
#[derive(Clone)]
pub struct BrevoClient {
    inner: Arc<BrevoClientInner>,
}

struct BrevoClientInner {
    client: reqwest::Client,
    endpoint: String,
    sender_email: String,
    sender_name: String,
}

impl BrevoClient {
    /// Create a new Brevo client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &BrevoConfig) -> Result<Self, NotificationError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "api-key",
            HeaderValue::from_str(config.api_key.expose_secret())
                .map_err(|e| NotificationError::Config(format!("Invalid API key format: {e}")))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(BrevoClientInner {
                client,
                endpoint: format!("{}/smtp/email", config.base_url.trim_end_matches('/')),
                sender_email: config.sender_email.to_string(),
                sender_name: config.sender_name.clone(),
            }),
        })
    }

    /// Display name notifications are sent under.
    #[must_use]
    pub fn sender_name(&self) -> &str {
        &self.inner.sender_name
    }
}

#[async_trait]
impl Notifier for BrevoClient {
    #[instrument(skip(self, html_body), fields(to = %to_email, subject = %subject))]
    async fn send(
        &self,
        to_email: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), NotificationError> {
        let body = SendEmailRequest {
            sender: Contact {
                email: &self.inner.sender_email,
                name: Some(&self.inner.sender_name),
            },
            to: [Contact {
                email: to_email,
                name: None,
            }],
            subject,
            html_content: html_body,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(status = status.as_u16(), %message, "Brevo rejected email");
            return Err(NotificationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        // The body only carries the message id; a missing or odd body is not a failure.
        let message_id = response
            .json::<SendEmailResponse>()
            .await
            .ok()
            .and_then(|r| r.message_id);
        tracing::info!(message_id = ?message_id, "Email sent successfully");
        Ok(())
    }
}

impl std::fmt::Debug for BrevoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrevoClient")
            .field("endpoint", &self.inner.endpoint)
            .field("sender_email", &self.inner.sender_email)
            .finish_non_exhaustive()
    }
}
