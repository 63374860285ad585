#![allow(clippy::unwrap_used)]
// End-to-end Dashboard scenarios against a wiremock backend.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lanboard_core::{
    Command, CommandResult, ConnectionState, CoreError, Dashboard, DashboardConfig, DeviceDraft,
    EntityId, GENERIC_FAILURE_MESSAGE, OwnerDraft,
};

// ── Fixtures ────────────────────────────────────────────────────────

fn mac_json(id: u64) -> Value {
    json!({
        "id": id + 100,
        "address": format!("aa:bb:cc:dd:ee:{id:02x}"),
        "last_ip": "10.0.0.5",
        "last_seen": "2024-06-15T10:30:00Z",
        "ports": [{ "id": 1, "port": 80, "service": "http", "state": "open" }]
    })
}

fn device_json(id: u64, owner: Option<(u64, &str)>) -> Value {
    json!({
        "id": id,
        "name": format!("device-{id}"),
        "category": { "id": 1, "name": "Laptop" },
        "location": null,
        "owner": owner.map(|(id, name)| json!({ "id": id, "name": name })),
        "macs": [mac_json(id)],
        "primary_mac": mac_json(id)
    })
}

fn owner_json(id: u64, name: &str, devices: &[u64]) -> Value {
    json!({
        "id": id,
        "name": name,
        "devices": devices
            .iter()
            .map(|&d| device_json(d, Some((id, name))))
            .collect::<Vec<_>>()
    })
}

async fn mount_list(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_inventory(server: &MockServer, devices: Value, owners: Value) {
    mount_list(server, "/api/devices", devices).await;
    mount_list(server, "/api/owners", owners).await;
    mount_list(server, "/api/macs", json!([mac_json(5), mac_json(40)])).await;
    mount_list(server, "/api/categories", json!([{ "id": 1, "name": "Laptop" }])).await;
    mount_list(server, "/api/locations", json!([{ "id": 1, "name": "Office" }])).await;
}

fn config(server: &MockServer) -> DashboardConfig {
    let mut config = DashboardConfig::new(Url::parse(&server.uri()).unwrap());
    config.refresh_interval = Duration::ZERO;
    config.timeout = Duration::from_secs(5);
    config
}

async fn connected(server: &MockServer) -> Dashboard {
    let dashboard = Dashboard::new(config(server)).unwrap();
    dashboard.connect().await.unwrap();
    dashboard
}

fn owner_of(dashboard: &Dashboard, device: u64) -> Option<String> {
    dashboard
        .store()
        .device_by_id(EntityId::new(device))
        .unwrap()
        .owner
        .as_ref()
        .map(|o| o.name.clone())
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_loads_every_store() {
    let server = MockServer::start().await;
    mount_inventory(
        &server,
        json!([device_json(5, Some((3, "Alice"))), device_json(6, None)]),
        json!([owner_json(3, "Alice", &[5])]),
    )
    .await;

    let dashboard = connected(&server).await;

    assert_eq!(*dashboard.connection_state().borrow(), ConnectionState::Connected);
    assert_eq!(dashboard.devices_snapshot().len(), 2);
    assert_eq!(dashboard.macs_snapshot().len(), 2);
    assert_eq!(dashboard.categories_snapshot().len(), 1);
    assert_eq!(dashboard.locations_snapshot().len(), 1);
    assert!(dashboard.last_refresh_at().await.is_some());

    let alice = dashboard.owners_snapshot()[0].clone();
    assert_eq!(alice.devices[0].owner.as_ref().unwrap().name, "Alice");

    dashboard.disconnect().await;
    assert_eq!(*dashboard.connection_state().borrow(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_connect_fails_when_nothing_loads() {
    let server = MockServer::start().await;

    let dashboard = Dashboard::new(config(&server)).unwrap();
    let err = dashboard.connect().await.unwrap_err();

    assert!(matches!(err, CoreError::ConnectionFailed { .. }));
    assert_eq!(*dashboard.connection_state().borrow(), ConnectionState::Failed);
}

#[tokio::test]
async fn test_execute_requires_connection() {
    let server = MockServer::start().await;
    let dashboard = Dashboard::new(config(&server)).unwrap();

    let err = dashboard
        .execute(Command::DeleteDevice { id: EntityId::new(5) })
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Disconnected));
}

#[tokio::test]
async fn test_reconnect_after_disconnect() {
    let server = MockServer::start().await;
    mount_inventory(&server, json!([device_json(5, None)]), json!([])).await;
    Mock::given(method("DELETE"))
        .and(path("/api/devices/5"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = connected(&server).await;
    dashboard.disconnect().await;
    dashboard.connect().await.unwrap();
    assert_eq!(*dashboard.connection_state().borrow(), ConnectionState::Connected);

    let result = dashboard
        .execute(Command::DeleteDevice { id: EntityId::new(5) })
        .await
        .unwrap();

    assert!(matches!(result, CommandResult::Deleted(id) if id == EntityId::new(5)));
    assert!(dashboard.store().device_by_id(EntityId::new(5)).is_none());
    dashboard.disconnect().await;
}

#[tokio::test]
async fn test_oneshot_runs_closure() {
    let server = MockServer::start().await;
    mount_inventory(&server, json!([device_json(5, None)]), json!([])).await;

    let count = Dashboard::oneshot(config(&server), |d| async move {
        Ok(d.devices_snapshot().len())
    })
    .await
    .unwrap();

    assert_eq!(count, 1);
}

// ── Owner scenarios ─────────────────────────────────────────────────

#[tokio::test]
async fn test_create_owner_claims_device() {
    let server = MockServer::start().await;
    mount_inventory(&server, json!([device_json(5, None)]), json!([])).await;

    Mock::given(method("POST"))
        .and(path("/api/owners"))
        .and(body_json(json!({ "name": "Alice", "device_ids": [5] })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 3,
            "name": "Alice",
            "devices": [device_json(5, None)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = connected(&server).await;
    let result = dashboard
        .execute(Command::CreateOwner(OwnerDraft::new(
            "Alice",
            vec![EntityId::new(5)],
        )))
        .await
        .unwrap();

    let CommandResult::Owner(alice) = result else {
        panic!("expected an owner result");
    };
    assert_eq!(alice.id, EntityId::new(3));
    assert!(alice.owns(EntityId::new(5)));
    assert_eq!(owner_of(&dashboard, 5).as_deref(), Some("Alice"));

    let stored = dashboard.store().owner_by_id(EntityId::new(3)).unwrap();
    assert_eq!(stored.device_ids().collect::<Vec<_>>(), vec![EntityId::new(5)]);
}

#[tokio::test]
async fn test_delete_owner_clears_references_in_one_update() {
    let server = MockServer::start().await;
    mount_inventory(
        &server,
        json!([
            device_json(5, Some((3, "Alice"))),
            device_json(6, Some((3, "Alice")))
        ]),
        json!([owner_json(3, "Alice", &[5, 6])]),
    )
    .await;

    Mock::given(method("DELETE"))
        .and(path("/api/owners/3"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = connected(&server).await;
    let mut devices = dashboard.devices();

    let result = dashboard
        .execute(Command::DeleteOwner { id: EntityId::new(3) })
        .await
        .unwrap();

    assert_eq!(result, CommandResult::Deleted(EntityId::new(3)));
    let snapshot = devices.changed().await.unwrap();
    assert!(!devices.has_changed(), "devices should emit exactly once");
    assert!(snapshot.iter().all(|d| d.owner.is_none()));
    assert!(dashboard.store().owner_by_id(EntityId::new(3)).is_none());
}

#[tokio::test]
async fn test_invalid_owner_never_reaches_backend() {
    let server = MockServer::start().await;
    mount_inventory(&server, json!([]), json!([owner_json(1, "Bob", &[])])).await;

    Mock::given(method("POST"))
        .and(path("/api/owners"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let dashboard = connected(&server).await;
    let mut notifications = dashboard.notifications();

    let reserved = dashboard
        .execute(Command::CreateOwner(OwnerDraft::new("None", Vec::new())))
        .await
        .unwrap_err();
    assert_eq!(reserved.to_string(), "Owner name cannot be \"None\".");

    let duplicate = dashboard
        .execute(Command::CreateOwner(OwnerDraft::new("Bob", Vec::new())))
        .await
        .unwrap_err();
    assert_eq!(
        duplicate.user_message(),
        "An owner with the name \"Bob\" already exists."
    );

    let first = notifications.try_recv().unwrap();
    assert_eq!(first.message, "Owner name cannot be \"None\".");
}

// ── Device scenarios ────────────────────────────────────────────────

#[tokio::test]
async fn test_update_device_moves_it_between_owners() {
    let server = MockServer::start().await;
    mount_inventory(
        &server,
        json!([device_json(5, Some((1, "Bob")))]),
        json!([owner_json(1, "Bob", &[5]), owner_json(3, "Alice", &[])]),
    )
    .await;

    Mock::given(method("PUT"))
        .and(path("/api/devices/5"))
        .and(body_json(json!({
            "name": "device-5",
            "model": null,
            "category_id": 1,
            "location_id": null,
            "owner_id": 3,
            "mac_ids": [105]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(device_json(5, Some((3, "Alice")))),
        )
        .mount(&server)
        .await;

    let dashboard = connected(&server).await;
    let current = dashboard.store().device_by_id(EntityId::new(5)).unwrap();
    let mut draft = DeviceDraft::from_device(&current);
    draft.owner_id = Some(EntityId::new(3));

    dashboard
        .execute(Command::UpdateDevice {
            id: EntityId::new(5),
            draft,
        })
        .await
        .unwrap();

    assert_eq!(owner_of(&dashboard, 5).as_deref(), Some("Alice"));
    let store = dashboard.store();
    assert!(!store.owner_by_id(EntityId::new(1)).unwrap().owns(EntityId::new(5)));
    assert!(store.owner_by_id(EntityId::new(3)).unwrap().owns(EntityId::new(5)));
}

#[tokio::test]
async fn test_rejected_mutation_leaves_store_untouched() {
    let server = MockServer::start().await;
    mount_inventory(&server, json!([device_json(5, None)]), json!([])).await;

    Mock::given(method("DELETE"))
        .and(path("/api/devices/5"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let dashboard = connected(&server).await;
    let before = dashboard.devices_snapshot();
    let mut notifications = dashboard.notifications();

    let err = dashboard
        .execute(Command::DeleteDevice { id: EntityId::new(5) })
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert_eq!(dashboard.devices_snapshot(), before);
    assert_eq!(notifications.try_recv().unwrap().message, GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn test_claimed_mac_leaves_unknown_rows() {
    let server = MockServer::start().await;
    mount_inventory(&server, json!([device_json(5, None)]), json!([])).await;

    let dashboard = connected(&server).await;
    let now = chrono::DateTime::parse_from_rfc3339("2024-06-16T10:30:00Z")
        .unwrap()
        .to_utc();

    let unknown = dashboard.unknown_devices(now);

    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].macs[0].id, EntityId::new(140));
    assert!(!unknown[0].is_saved());
}

// ── Live mode ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_paused_dashboard_ignores_refresh_signals() {
    let server = MockServer::start().await;
    mount_list(&server, "/api/owners", json!([])).await;
    mount_list(&server, "/api/macs", json!([])).await;
    mount_list(&server, "/api/categories", json!([])).await;
    mount_list(&server, "/api/locations", json!([])).await;
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(3)
        .mount(&server)
        .await;

    let dashboard = connected(&server).await;

    dashboard.set_live_mode(false).await;
    assert!(!dashboard.signal_refresh().await);

    // Resuming refreshes once, then signals go through again.
    dashboard.set_live_mode(true).await;
    assert!(dashboard.signal_refresh().await);
}

#[tokio::test]
async fn test_resume_refreshes_without_a_timer() {
    let server = MockServer::start().await;
    mount_inventory(&server, json!([]), json!([])).await;

    let dashboard = connected(&server).await;
    server.reset().await;
    mount_inventory(&server, json!([device_json(5, None)]), json!([])).await;

    dashboard.set_live_mode(false).await;
    assert!(dashboard.devices_snapshot().is_empty());

    dashboard.set_live_mode(true).await;
    assert_eq!(dashboard.devices_snapshot().len(), 1);
    assert_eq!(dashboard.macs_snapshot().len(), 2);
}
