//! Integration tests for the shipment command surface.
//!
//! The router runs in-process with an in-memory store; Shippo and Brevo are
//! stub servers on local ports.

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use shipdesk_integration_tests::{
    TestApp, create_body, ground_quote, label_transaction, quote, rate,
};
use shipdesk_core::ShipmentStatus;
use shipdesk_server::db::ShipmentStore;
use shipdesk_server::models::ShipmentPatch;

async fn create(app: &TestApp) -> Value {
    let (status, body) = app
        .post_json("/api/shipment?action=create", &create_body())
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_returns_selected_rate_and_id() {
    let app = TestApp::new(ground_quote(), label_transaction()).await;
    let body = create(&app).await;

    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Shipment created successfully");
    assert_eq!(body["rate_object_id"], "rate_1");

    let id = body["id"].as_str().expect("id is a string");
    let record = app
        .store
        .find_by_id(id.parse().expect("id is a shipment id"))
        .await
        .expect("store readable")
        .expect("record stored");
    assert_eq!(
        record.document.selected_rate.extended_token(),
        Some("usps_ground_advantage")
    );
    assert_eq!(record.status(), ShipmentStatus::Quoted);
    assert_eq!(record.document.email, "a@b.com");
    assert!(record.document.label_url.is_none());
}

#[tokio::test]
async fn test_create_quotes_fixed_destination_synchronously() {
    let app = TestApp::new(ground_quote(), label_transaction()).await;
    create(&app).await;

    let quotes = app.shippo.requests_to("/shipments/");
    assert_eq!(quotes.len(), 1);
    let sent = &quotes[0].body;
    assert_eq!(sent["async"], false);
    assert_eq!(sent["address_to"]["street1"], "965 Mission St");
    assert_eq!(sent["address_to"]["zip"], "94105");
    assert_eq!(sent["address_from"]["name"], "Ada Lovelace");
    assert_eq!(sent["parcels"][0]["mass_unit"], "lb");
}

#[tokio::test]
async fn test_create_sends_confirmation_email() {
    let app = TestApp::new(ground_quote(), label_transaction()).await;
    create(&app).await;

    let emails = app.brevo.requests();
    assert_eq!(emails.len(), 1);
    let email = &emails[0].body;
    assert_eq!(email["to"], json!([{"email": "a@b.com"}]));
    assert_eq!(email["subject"], "Shipment Request Received");
    assert!(
        email["htmlContent"]
            .as_str()
            .is_some_and(|html| html.contains("Ada Lovelace"))
    );
}

#[tokio::test]
async fn test_create_without_ground_advantage_stores_nothing() {
    let app = TestApp::new(
        quote(vec![rate("rate_0", "ups_ground"), rate("rate_2", "usps_priority")]),
        label_transaction(),
    )
    .await;

    let (status, body) = app
        .post_json("/api/shipment?action=create", &create_body())
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["error"],
        "USPS Ground Advantage rate not available for this shipment"
    );
    assert!(app.store.is_empty().await);
    assert!(app.brevo.requests().is_empty());
}

#[tokio::test]
async fn test_create_accepts_template_parcels_and_address_ids() {
    let app = TestApp::new(ground_quote(), label_transaction()).await;
    let mut body = create_body();
    body["address_from"] = json!("adr_123");
    body["parcels"] = json!([
        {"template": "USPS_FlatRateEnvelope", "weight": "1", "mass_unit": "lb"},
        "prc_1"
    ]);

    let (status, response) = app.post_json("/api/shipment?action=create", &body).await;
    assert_eq!(status, StatusCode::OK, "{response}");

    let quotes = app.shippo.requests_to("/shipments/");
    assert_eq!(quotes[0].body["address_from"], "adr_123");
    assert_eq!(quotes[0].body["parcels"], body["parcels"]);
}

#[tokio::test]
async fn test_create_with_failed_quote() {
    let mut failed = ground_quote();
    failed["status"] = json!("ERROR");
    let app = TestApp::new(failed, label_transaction()).await;

    let (status, body) = app
        .post_json("/api/shipment?action=create", &create_body())
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Shipment creation failed");
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_create_validation_makes_no_provider_call() {
    let app = TestApp::new(ground_quote(), label_transaction()).await;

    for missing in ["address_from", "parcels", "email"] {
        let mut body = create_body();
        body.as_object_mut()
            .expect("object body")
            .remove(missing);

        let (status, response) = app.post_json("/api/shipment?action=create", &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "missing {missing}");
        assert!(
            response["error"]
                .as_str()
                .is_some_and(|e| e.starts_with("Invalid payload")),
            "{response}"
        );
    }

    assert!(app.shippo.requests().is_empty());
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_create_malformed_json() {
    let app = TestApp::new(ground_quote(), label_transaction()).await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/shipment?action=create",
            Some("{\"address_from\": "),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(app.shippo.requests().is_empty());
}

#[tokio::test]
async fn test_create_email_failure_keeps_record() {
    let app = TestApp::with_email_status(
        ground_quote(),
        label_transaction(),
        StatusCode::UNAUTHORIZED,
    )
    .await;

    let (status, body) = app
        .post_json("/api/shipment?action=create", &create_body())
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Notification delivery failed");
    assert_eq!(app.store.len().await, 1);
}

// ============================================================================
// Label
// ============================================================================

#[tokio::test]
async fn test_label_scenario() {
    let app = TestApp::new(ground_quote(), label_transaction()).await;
    let created = create(&app).await;
    let id = created["id"].as_str().expect("id");

    let (status, body) = app
        .post_json("/api/shipment?action=label", &json!({ "id": id }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(
        body,
        json!({"status": "success", "message": "Label generated successfully"})
    );

    let record = app
        .store
        .find_by_id(id.parse().expect("shipment id"))
        .await
        .expect("store readable")
        .expect("record stored");
    assert_eq!(record.document.label_url.as_deref(), Some("https://x/label.pdf"));
    assert_eq!(record.document.tracking_number.as_deref(), Some("T1"));
    assert_eq!(record.status(), ShipmentStatus::Labeled);
}

#[tokio::test]
async fn test_label_purchases_stored_rate() {
    let app = TestApp::new(ground_quote(), label_transaction()).await;
    let created = create(&app).await;

    app.post_json("/api/shipment?action=label", &json!({ "id": created["id"] }))
        .await;

    let purchases = app.shippo.requests_to("/transactions/");
    assert_eq!(purchases.len(), 1);
    assert_eq!(
        purchases[0].body,
        json!({"rate": "rate_1", "label_file_type": "PDF_4x6", "async": false})
    );

    let emails = app.brevo.requests();
    assert_eq!(emails.len(), 2);
    assert_eq!(emails[1].body["subject"], "Label Generated Successfully");
    assert_eq!(emails[1].body["to"], json!([{"email": "a@b.com"}]));
}

#[tokio::test]
async fn test_label_unknown_id() {
    let app = TestApp::new(ground_quote(), label_transaction()).await;

    for id in [
        json!("8b0d5d2e-6f0c-4c89-9a43-2bd0f0b0a001"),
        json!("not-an-id"),
    ] {
        let (status, body) = app
            .post_json("/api/shipment?action=label", &json!({ "id": id }))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Shipment or rate_id not found");
    }
    assert!(app.shippo.requests().is_empty());
}

#[tokio::test]
async fn test_label_missing_id() {
    let app = TestApp::new(ground_quote(), label_transaction()).await;
    let (status, _) = app
        .post_json("/api/shipment?action=label", &json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_label_twice_is_rejected() {
    let app = TestApp::new(ground_quote(), label_transaction()).await;
    let created = create(&app).await;
    let body = json!({ "id": created["id"] });

    let (status, _) = app.post_json("/api/shipment?action=label", &body).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.post_json("/api/shipment?action=label", &body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(app.shippo.requests_to("/transactions/").len(), 1);
}

#[tokio::test]
async fn test_label_while_purchase_pending_conflicts() {
    let app = TestApp::new(ground_quote(), label_transaction()).await;
    let created = create(&app).await;
    let id = created["id"].as_str().expect("id").parse().expect("shipment id");
    app.store
        .update_fields(
            id,
            ShipmentPatch::status(ShipmentStatus::LabelPending, chrono::Utc::now()),
        )
        .await
        .expect("store writable");

    let (status, body) = app
        .post_json("/api/shipment?action=label", &json!({ "id": created["id"] }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"],
        "Label generation already in progress for this shipment"
    );
    assert!(app.shippo.requests_to("/transactions/").is_empty());
}

#[tokio::test]
async fn test_label_failed_purchase() {
    let mut failed = label_transaction();
    failed["status"] = json!("ERROR");
    let app = TestApp::new(ground_quote(), failed).await;
    let created = create(&app).await;

    let (status, body) = app
        .post_json("/api/shipment?action=label", &json!({ "id": created["id"] }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Label generation failed");
}

// ============================================================================
// List, unsupported commands, health
// ============================================================================

#[tokio::test]
async fn test_list_newest_first() {
    let app = TestApp::new(ground_quote(), label_transaction()).await;
    let first = create(&app).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = create(&app).await;

    let (status, body) = app.send(Method::GET, "/api/shipment", None).await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<&Value> = body
        .as_array()
        .expect("list is an array")
        .iter()
        .map(|record| &record["id"])
        .collect();
    assert_eq!(ids, vec![&second["id"], &first["id"]]);
    assert_eq!(body[0]["rates"]["object_id"], "rate_1");
    assert_eq!(body[0]["rates_object_id"], "rate_1");
    assert_eq!(body[0]["rates_object_owner"], "ops@mrgoods.com");
    assert_eq!(body[0]["shipment"], "shp_7d1f");
    assert_eq!(body[0]["amount"], "7.45");
    assert_eq!(body[0]["amount_local"], "7.45");
    assert_eq!(body[0]["carrier_account"], "ca_usps_1");
    assert_eq!(body[0]["status"], "quoted");
    assert!(body[0]["created_at"].is_string());
}

#[tokio::test]
async fn test_unsupported_commands() {
    let app = TestApp::new(ground_quote(), label_transaction()).await;

    let cases = [
        (Method::POST, "/api/shipment"),
        (Method::POST, "/api/shipment?action=cancel"),
        (Method::PUT, "/api/shipment?action=create"),
        (Method::DELETE, "/api/shipment"),
    ];
    for (method, uri) in cases {
        let (status, body) = app.send(method.clone(), uri, Some("{}")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
        assert_eq!(body, json!({"error": "Method not allowed"}));
    }
    assert!(app.shippo.requests().is_empty());
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new(ground_quote(), label_transaction()).await;

    let (status, body) = app.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));

    let (status, _) = app.send(Method::GET, "/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
}
