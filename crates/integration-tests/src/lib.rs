//! Integration test support for Shipdesk.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shipdesk-integration-tests
//!
//! # Include the PostgreSQL store tests
//! SHIPDESK_TEST_DATABASE_URL=postgres://localhost/shipdesk_test \
//!     cargo test -p shipdesk-integration-tests -- --include-ignored
//! ```
//!
//! The rate and email providers are replaced by small axum servers bound to
//! an ephemeral local port. The real `ShippoClient` and `BrevoClient` talk to
//! them, so every test exercises the full HTTP path in both directions.

#![allow(clippy::missing_panics_doc)]

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
    routing::{MethodRouter, post},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use shipdesk_core::Email;
use shipdesk_server::config::{BrevoConfig, ShippoConfig};
use shipdesk_server::db::InMemoryShipmentStore;
use shipdesk_server::services::{BrevoClient, ShipmentWorkflow, WorkflowSettings};
use shipdesk_server::shippo::ShippoClient;
use shipdesk_server::state::AppState;
use tower::ServiceExt;

pub const SHIPPO_TOKEN: &str = "ShippoToken shippo_test_6f3a9c1e";
pub const BREVO_API_KEY: &str = "xkeysib-test-4b7d2e9a";
pub const SENDER_EMAIL: &str = "care@mrgoods.com";

/// One request received by a stub provider.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub headers: HeaderMap,
    pub body: Value,
}

/// A stub provider server and everything it has received.
#[derive(Debug, Clone)]
pub struct StubProvider {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubProvider {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("stub lock poisoned").clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }
}

#[derive(Clone)]
struct StubState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    status: StatusCode,
    response: Value,
}

async fn record(
    State(stub): State<StubState>,
    request_headers: HeaderMap,
    uri: axum::http::Uri,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    stub.requests
        .lock()
        .expect("stub lock poisoned")
        .push(RecordedRequest {
            path: uri.path().to_owned(),
            headers: request_headers,
            body,
        });
    (stub.status, Json(stub.response))
}

fn recording(
    requests: &Arc<Mutex<Vec<RecordedRequest>>>,
    status: StatusCode,
    response: Value,
) -> MethodRouter {
    post(record).with_state(StubState {
        requests: Arc::clone(requests),
        status,
        response,
    })
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub server");
    let addr = listener.local_addr().expect("Failed to read stub address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Stub server error");
    });
    format!("http://{addr}")
}

/// Stub Shippo API answering `shipments/` with `quote` and `transactions/`
/// with `transaction`.
pub async fn shippo_stub(quote: Value, transaction: Value) -> StubProvider {
    shippo_stub_with_status(StatusCode::OK, quote, transaction).await
}

pub async fn shippo_stub_with_status(
    status: StatusCode,
    quote: Value,
    transaction: Value,
) -> StubProvider {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new()
        .route("/shipments/", recording(&requests, status, quote))
        .route("/transactions/", recording(&requests, status, transaction));
    StubProvider {
        base_url: spawn(router).await,
        requests,
    }
}

/// Stub Brevo API answering `POST /smtp/email` with `status`.
pub async fn brevo_stub(status: StatusCode) -> StubProvider {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let response = if status.is_success() {
        json!({"messageId": "<202610161200.12345@smtp-relay.mailin.fr>"})
    } else {
        json!({"code": "unauthorized", "message": "Key not found"})
    };
    let router = Router::new().route("/smtp/email", recording(&requests, status, response));
    StubProvider {
        base_url: spawn(router).await,
        requests,
    }
}

pub fn shippo_config(base_url: &str) -> ShippoConfig {
    ShippoConfig {
        base_url: format!("{base_url}/"),
        token: SecretString::from(SHIPPO_TOKEN),
    }
}

pub fn brevo_config(base_url: &str) -> BrevoConfig {
    BrevoConfig {
        base_url: base_url.to_owned(),
        api_key: SecretString::from(BREVO_API_KEY),
        sender_email: Email::parse(SENDER_EMAIL).expect("valid sender"),
        sender_name: "Mr. Goods".to_owned(),
    }
}

/// The server wired to stub providers and an in-memory store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryShipmentStore>,
    pub shippo: StubProvider,
    pub brevo: StubProvider,
}

impl TestApp {
    pub async fn new(quote: Value, transaction: Value) -> Self {
        Self::with_email_status(quote, transaction, StatusCode::CREATED).await
    }

    pub async fn with_email_status(
        quote: Value,
        transaction: Value,
        email_status: StatusCode,
    ) -> Self {
        let shippo = shippo_stub(quote, transaction).await;
        let brevo = brevo_stub(email_status).await;
        let store = Arc::new(InMemoryShipmentStore::new());

        let workflow = ShipmentWorkflow::new(
            store.clone(),
            Arc::new(ShippoClient::new(&shippo_config(&shippo.base_url)).expect("shippo client")),
            Arc::new(BrevoClient::new(&brevo_config(&brevo.base_url)).expect("brevo client")),
            WorkflowSettings::default(),
        );

        Self {
            router: shipdesk_server::app(AppState::new(workflow)),
            store,
            shippo,
            brevo,
        }
    }

    /// Send one request through the router and decode the JSON answer.
    ///
    /// Non-JSON bodies come back as a JSON string; empty bodies as `null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(body.to_owned())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("valid request"))
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(&body.to_string())).await
    }
}

// ============================================================================
// Provider payloads
// ============================================================================

pub fn rate(object_id: &str, extended_token: &str) -> Value {
    json!({
        "object_id": object_id,
        "object_owner": "ops@mrgoods.com",
        "shipment": "shp_7d1f",
        "amount": "7.45",
        "currency": "USD",
        "amount_local": "7.45",
        "currency_local": "USD",
        "provider": "USPS",
        "carrier_account": "ca_usps_1",
        "servicelevel": {
            "name": "Ground Advantage",
            "token": extended_token,
            "extended_token": extended_token
        },
        "parcel": "prc_51c2",
        "estimated_days": 3
    })
}

/// A successful quote carrying `rates`.
pub fn quote(rates: Vec<Value>) -> Value {
    json!({
        "status": "SUCCESS",
        "object_id": "shp_7d1f",
        "object_owner": "ops@mrgoods.com",
        "address_from": {
            "object_id": "adr_1",
            "name": "Ada Lovelace",
            "street1": "1 Congress Ave",
            "city": "Austin",
            "state": "TX",
            "zip": "78701",
            "country": "US",
            "email": ""
        },
        "address_return": {"name": "Ada Lovelace"},
        "parcels": [{"object_id": "prc_51c2", "length": "10.0000"}],
        "shipment_date": "2026-10-16T15:00:00Z",
        "rates": rates,
        "messages": []
    })
}

/// A successful quote with a ground-advantage rate `rate_1`.
pub fn ground_quote() -> Value {
    quote(vec![
        rate("rate_0", "ups_ground"),
        rate("rate_1", "usps_ground_advantage"),
    ])
}

/// A successful label purchase.
pub fn label_transaction() -> Value {
    json!({
        "status": "SUCCESS",
        "object_id": "txn_9a",
        "label_url": "https://x/label.pdf",
        "tracking_number": "T1",
        "tracking_url_provider": "https://tools.usps.com/go/TrackConfirmAction?tLabels=T1",
        "rate": "rate_1",
        "parcel": "prc_51c2",
        "messages": []
    })
}

/// A valid create command body.
pub fn create_body() -> Value {
    json!({
        "address_from": {
            "name": "Ada Lovelace",
            "street1": "1 Congress Ave",
            "city": "Austin",
            "state": "TX",
            "zip": "78701",
            "country": "US"
        },
        "parcels": [{
            "length": 10, "width": 8, "height": 4, "distance_unit": "in",
            "weight": 2, "mass_unit": "lb"
        }],
        "item_details": {"sku": "MUG-1", "quantity": 2},
        "email": "a@b.com"
    })
}
