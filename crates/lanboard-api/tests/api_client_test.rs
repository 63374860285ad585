#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lanboard_api::types::{DeviceRequest, OwnerRequest};
use lanboard_api::{ApiClient, Error, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::new(&server.uri(), &TransportConfig::default()).unwrap();
    (server, client)
}

fn mac_json(id: u64, address: &str) -> serde_json::Value {
    json!({
        "id": id,
        "address": address,
        "last_ip": "10.0.0.5",
        "last_seen": "2024-06-15T10:30:00Z",
        "hostname": "nas",
        "ports": [
            { "id": 1, "port": 8080, "service": "http-alt", "state": "open" },
            { "id": 2, "port": 443, "service": "https", "state": "open" }
        ]
    })
}

// ── Devices ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 5,
            "name": "NAS",
            "category": { "id": 1, "name": "Storage" },
            "location": null,
            "owner": { "id": 3, "name": "Alice" },
            "macs": [mac_json(9, "aa:bb:cc:dd:ee:ff")],
            "primary_mac": mac_json(9, "aa:bb:cc:dd:ee:ff")
        }])))
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();
    assert_eq!(devices.len(), 1);

    let device = &devices[0];
    assert_eq!(device.id, 5);
    assert_eq!(device.owner.as_ref().unwrap().name, "Alice");
    assert!(device.location.is_none());
    let ports = device.macs[0].ports.as_ref().unwrap();
    assert_eq!(ports[0].port, 8080);
}

#[tokio::test]
async fn test_create_device_sends_request_body() {
    let (server, client) = setup().await;

    let request = DeviceRequest {
        name: Some("Printer".into()),
        model: None,
        category_id: Some(2),
        location_id: Some(4),
        owner_id: None,
        mac_ids: vec![11],
    };

    Mock::given(method("POST"))
        .and(path("/api/devices"))
        .and(body_json(json!({
            "name": "Printer",
            "model": null,
            "category_id": 2,
            "location_id": 4,
            "owner_id": null,
            "mac_ids": [11]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "name": "Printer",
            "macs": [mac_json(11, "11:22:33:44:55:66")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.create_device(&request).await.unwrap();
    assert_eq!(created.id, 12);
    assert!(created.primary_mac.is_none());
}

#[tokio::test]
async fn test_update_device_uses_id_path() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/devices/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "model": "LaserJet"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = DeviceRequest {
        name: None,
        model: Some("LaserJet".into()),
        category_id: Some(2),
        location_id: None,
        owner_id: None,
        mac_ids: vec![11],
    };
    let updated = client.update_device(12, &request).await.unwrap();
    assert_eq!(updated.model.as_deref(), Some("LaserJet"));
}

#[tokio::test]
async fn test_delete_device_accepts_empty_body() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/devices/12"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_device(12).await.unwrap();
}

// ── Owners ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_owner_returns_embedded_devices() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/owners"))
        .and(body_json(json!({ "name": "Alice", "device_ids": [5] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "name": "Alice",
            "devices": [{ "id": 5, "name": "NAS", "macs": [] }]
        })))
        .mount(&server)
        .await;

    let owner = client
        .create_owner(&OwnerRequest {
            name: "Alice".into(),
            device_ids: vec![5],
        })
        .await
        .unwrap();

    assert_eq!(owner.id, 3);
    assert_eq!(owner.devices[0].id, 5);
}

#[tokio::test]
async fn test_list_owners_without_devices_key() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/owners"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "name": "Bob" }])))
        .mount(&server)
        .await;

    let owners = client.list_owners().await.unwrap();
    assert!(owners[0].devices.is_empty());
}

// ── Lookups ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_lookups_and_macs() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "name": "Phone" }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/locations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 2, "name": "Office" }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/macs"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([mac_json(9, "aa:bb:cc:dd:ee:ff")])),
        )
        .mount(&server)
        .await;

    assert_eq!(client.list_categories().await.unwrap()[0].name, "Phone");
    assert_eq!(client.list_locations().await.unwrap()[0].name, "Office");
    assert_eq!(client.list_macs().await.unwrap()[0].hostname.as_deref(), Some("nas"));
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_detail_body_becomes_message() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/owners/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Owner not found" })))
        .mount(&server)
        .await;

    let err = client.delete_owner(99).await.unwrap_err();
    assert!(err.is_not_found());
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Owner not found");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_plain_text_error_is_kept() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client.list_devices().await.unwrap_err();
    assert!(err.is_transient());
    assert!(
        matches!(&err, Error::Api { status: 502, message } if message == "Bad Gateway"),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn test_malformed_success_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/macs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.list_macs().await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert_eq!(body, "<html>oops</html>"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_base_url_with_api_suffix() {
    let server = MockServer::start().await;
    let client =
        ApiClient::with_client(reqwest::Client::new(), &format!("{}/api", server.uri())).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/locations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.list_locations().await.unwrap().is_empty());
}
