//! Integration tests for the Shippo and Brevo clients against stub servers.

use axum::http::StatusCode;
use serde_json::json;
use shipdesk_core::{Address, ObjectRef};
use shipdesk_integration_tests::{
    BREVO_API_KEY, SENDER_EMAIL, SHIPPO_TOKEN, brevo_config, brevo_stub, ground_quote,
    label_transaction, shippo_config, shippo_stub, shippo_stub_with_status,
};
use shipdesk_server::services::{BrevoClient, NotificationError, Notifier};
use shipdesk_server::shippo::{
    ObjectStatus, RateProvider, ShipmentRequest, ShippoClient, ShippoError, TransactionRequest,
};

fn shipment_request() -> ShipmentRequest {
    ShipmentRequest {
        address_from: Address {
            name: Some("Ada Lovelace".to_owned()),
            ..Address::default()
        }
        .into(),
        address_to: Address {
            name: Some("Mr. Goods".to_owned()),
            ..Address::default()
        },
        parcels: vec![
            serde_json::from_value(json!({
                "length": 10, "width": 8, "height": 4, "distance_unit": "in",
                "weight": 2, "mass_unit": "lb"
            }))
            .expect("valid parcel"),
            ObjectRef::Id("prc_1".to_owned()),
        ],
        is_async: false,
    }
}

fn transaction_request() -> TransactionRequest {
    TransactionRequest {
        rate: "rate_1".to_owned(),
        label_file_type: "PDF_4x6".to_owned(),
        is_async: false,
    }
}

// ============================================================================
// Shippo
// ============================================================================

#[tokio::test]
async fn test_shippo_quote_round_trip() {
    let stub = shippo_stub(ground_quote(), label_transaction()).await;
    let client = ShippoClient::new(&shippo_config(&stub.base_url)).expect("client");

    let shipment = client
        .quote_shipment(&shipment_request())
        .await
        .expect("quote succeeds");
    assert_eq!(shipment.status, ObjectStatus::Success);
    assert_eq!(shipment.object_id.as_deref(), Some("shp_7d1f"));
    assert_eq!(shipment.rates.len(), 2);
    assert_eq!(
        shipment.rates[1].extended_token(),
        Some("usps_ground_advantage")
    );

    let requests = stub.requests_to("/shipments/");
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0]
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok()),
        Some(SHIPPO_TOKEN)
    );
    assert_eq!(requests[0].body["async"], false);
    assert_eq!(requests[0].body["parcels"][1], "prc_1");
}

#[tokio::test]
async fn test_shippo_purchase_label() {
    let stub = shippo_stub(ground_quote(), label_transaction()).await;
    let client = ShippoClient::new(&shippo_config(&stub.base_url)).expect("client");

    let transaction = client
        .purchase_label(&transaction_request())
        .await
        .expect("purchase succeeds");
    assert!(transaction.status.is_success());
    assert_eq!(transaction.label_url.as_deref(), Some("https://x/label.pdf"));
    assert_eq!(transaction.tracking_number.as_deref(), Some("T1"));

    let requests = stub.requests_to("/transactions/");
    assert_eq!(
        requests[0].body,
        json!({"rate": "rate_1", "label_file_type": "PDF_4x6", "async": false})
    );
}

#[tokio::test]
async fn test_shippo_unauthorized() {
    let stub =
        shippo_stub_with_status(StatusCode::UNAUTHORIZED, json!({"detail": "bad token"}), json!({}))
            .await;
    let client = ShippoClient::new(&shippo_config(&stub.base_url)).expect("client");

    let result = client.quote_shipment(&shipment_request()).await;
    assert!(matches!(result, Err(ShippoError::Unauthorized)));
}

#[tokio::test]
async fn test_shippo_api_error_keeps_status() {
    let stub = shippo_stub_with_status(
        StatusCode::BAD_REQUEST,
        json!({"address_from": ["This field is required."]}),
        json!({}),
    )
    .await;
    let client = ShippoClient::new(&shippo_config(&stub.base_url)).expect("client");

    match client.quote_shipment(&shipment_request()).await {
        Err(ShippoError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert!(message.contains("This field is required."));
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_shippo_unreachable() {
    // Nothing listens on port 1
    let client = ShippoClient::new(&shippo_config("http://127.0.0.1:1")).expect("client");
    let result = client.quote_shipment(&shipment_request()).await;
    assert!(matches!(result, Err(ShippoError::Http(_))));
}

// ============================================================================
// Brevo
// ============================================================================

#[tokio::test]
async fn test_brevo_send() {
    let stub = brevo_stub(StatusCode::CREATED).await;
    let client = BrevoClient::new(&brevo_config(&stub.base_url)).expect("client");

    client
        .send("a@b.com", "Shipment Request Received", "<p>Thanks!</p>")
        .await
        .expect("send succeeds");

    let requests = stub.requests_to("/smtp/email");
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0]
            .headers
            .get("api-key")
            .and_then(|v| v.to_str().ok()),
        Some(BREVO_API_KEY)
    );
    assert_eq!(
        requests[0].body,
        json!({
            "sender": {"email": SENDER_EMAIL, "name": "Mr. Goods"},
            "to": [{"email": "a@b.com"}],
            "subject": "Shipment Request Received",
            "htmlContent": "<p>Thanks!</p>"
        })
    );
}

#[tokio::test]
async fn test_brevo_rejection() {
    let stub = brevo_stub(StatusCode::UNAUTHORIZED).await;
    let client = BrevoClient::new(&brevo_config(&stub.base_url)).expect("client");

    match client.send("a@b.com", "Subject", "<p>x</p>").await {
        Err(NotificationError::Api { status, message }) => {
            assert_eq!(status, 401);
            assert!(message.contains("Key not found"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
}
