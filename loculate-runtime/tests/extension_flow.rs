use loculate_core::origins::OriginError;
use loculate_core::protocol::Message;
use loculate_core::state::{
    KEY_SAVED_ORIGINS, KEY_SELECTED_ORIGIN_INDEX, KEY_SELECTED_TEXT, StoreRecord,
};
use loculate_core::types::Theme;
use loculate_engine::coordinator::{CaptureEvent, Coordinator};
use loculate_engine::panel::{PanelController, PanelError, PanelStatus};
use loculate_engine::traits::StateStore;
use loculate_proxy::ProxyConfig;
use loculate_runtime::bus::{self, PanelSignals};
use loculate_runtime::menus::MemoryMenuRegistry;
use loculate_runtime::proxy_client::ProxyTravelTimeService;
use loculate_runtime::store::{JsonFileStore, MemoryStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    coordinator: Coordinator,
    panel: PanelController,
    signals: mpsc::UnboundedReceiver<Message>,
}

fn record(v: serde_json::Value) -> StoreRecord {
    v.as_object().cloned().unwrap()
}

fn harness(store: Arc<dyn StateStore>, proxy_url: &str) -> Harness {
    let (launcher, signals): (PanelSignals, _) = bus::panel_channel();
    let travel = ProxyTravelTimeService::new(proxy_url)
        .with_timeout(Duration::from_secs(5));
    let coordinator = Coordinator::new(store.clone(), Arc::new(travel), Arc::new(launcher));

    let (broker, rx) = bus::channel(8);
    tokio::spawn(bus::serve(coordinator.clone(), rx));

    let panel = PanelController::new(store, Arc::new(broker))
        .with_reply_timeout(Duration::from_secs(10));
    Harness {
        coordinator,
        panel,
        signals,
    }
}

async fn mock_route(server: &MockServer, origin: &str, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(query_param("origin", origin))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Runs the real proxy on an ephemeral port in front of a fake provider.
async fn spawn_proxy(provider: &MockServer) -> String {
    let cfg = ProxyConfig {
        api_key: Some("test-key".into()),
        distance_matrix_url: format!("{}/maps/api/distancematrix/json", provider.uri()),
        ..ProxyConfig::default()
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loculate_proxy::serve(listener, &cfg, std::future::pending())
            .await
            .unwrap();
    });
    format!("http://{addr}/")
}

async fn mock_provider(provider: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(query_param("origins", "123 Main St"))
        .and(query_param("destinations", "456 Oak Ave"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(provider)
        .await;
}

fn capture(text: &str) -> CaptureEvent {
    CaptureEvent {
        menu_item_id: "calculateTravelTime".into(),
        selection_text: Some(text.into()),
    }
}

#[tokio::test]
async fn capture_signals_open_panel_and_computes() {
    let server = MockServer::start().await;
    mock_route(
        &server,
        "123 Main St",
        200,
        json!({"duration": "12 mins", "distance": "10.0 mi"}),
    )
    .await;

    let store = Arc::new(MemoryStore::with_record(record(json!({
        "savedOrigins": ["123 Main St"],
        "selectedOriginIndex": 0,
    }))));
    let mut h = harness(store.clone(), &server.uri());

    let menus = MemoryMenuRegistry::new();
    h.coordinator.on_installed(&menus).unwrap();
    h.coordinator.on_installed(&menus).unwrap();
    assert_eq!(menus.items().len(), 1);

    h.panel.mount(false).await;
    assert_eq!(h.panel.state().status, PanelStatus::Idle);

    assert!(h.coordinator.on_capture(&capture("456 Oak Ave")).await.unwrap());
    assert_eq!(store.snapshot()[KEY_SELECTED_TEXT], "456 Oak Ave");

    let signal = h.signals.recv().await.unwrap();
    h.panel.on_message(signal).await;

    let result = h.panel.state().result().expect("success");
    assert_eq!(result.pair.origin, "123 Main St");
    assert_eq!(result.pair.destination, "456 Oak Ave");
    assert_eq!(result.data.duration, "12 mins");
    assert_eq!(result.data.distance, "10.0 mi");
}

#[tokio::test]
async fn fresh_panel_reads_captured_destination_on_mount() {
    let server = MockServer::start().await;
    mock_route(
        &server,
        "A",
        200,
        json!({"duration": "5 mins", "distance": "1.0 mi"}),
    )
    .await;

    let store = Arc::new(MemoryStore::with_record(record(json!({"origin": "A"}))));
    let mut h = harness(store.clone(), &server.uri());

    // Panel was closed when the capture happened.
    h.coordinator.on_capture(&capture("B")).await.unwrap();
    h.panel.mount(true).await;

    assert_eq!(h.panel.state().theme, Theme::Dark);
    assert_eq!(h.panel.state().origins.entries(), ["A".to_string()]);
    assert_eq!(store.snapshot()[KEY_SAVED_ORIGINS], json!(["A"]));
    assert_eq!(store.snapshot()[KEY_SELECTED_ORIGIN_INDEX], json!(0));
    assert_eq!(h.panel.state().result().unwrap().data.duration, "5 mins");
}

#[tokio::test]
async fn proxy_rejection_lands_in_error_state() {
    let server = MockServer::start().await;
    mock_route(
        &server,
        "Nowhere",
        400,
        json!({"error": "Failed to calculate route: ZERO_RESULTS"}),
    )
    .await;

    let store = Arc::new(MemoryStore::with_record(record(json!({
        "savedOrigins": ["Nowhere"],
        "selectedOriginIndex": 0,
        "selectedText": "Atlantis",
    }))));
    let mut h = harness(store, &server.uri());
    h.panel.mount(false).await;

    assert_eq!(
        h.panel.state().status,
        PanelStatus::Error("Failed to calculate route: ZERO_RESULTS".into())
    );
}

#[tokio::test]
async fn unanswered_request_reports_no_response() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::with_record(record(json!({
        "savedOrigins": ["A"],
        "selectedOriginIndex": 0,
        "selectedText": "B",
    }))));

    let (broker, mut rx) = bus::channel(1);
    tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            drop(envelope.reply);
        }
    });

    let mut panel = PanelController::new(store, Arc::new(broker));
    panel.mount(false).await;
    assert_eq!(panel.state().status, PanelStatus::Error("No response".into()));
}

#[tokio::test]
async fn third_origin_is_rejected_and_nothing_persists() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let mut h = harness(store.clone(), &server.uri());
    h.panel.mount(false).await;

    for address in ["First St", "Second St"] {
        h.panel.set_origin_input(address);
        h.panel.add_origin().await.unwrap();
    }
    let before = store.snapshot();

    h.panel.set_origin_input("Third St");
    let err = h.panel.add_origin().await.unwrap_err();
    assert!(matches!(err, PanelError::Origin(OriginError::LimitReached)));
    assert_eq!(h.panel.state().notice.as_deref(), Some("Origin limit reached"));
    assert_eq!(h.panel.state().origin_input, "Third St");
    assert_eq!(store.snapshot(), before);
    assert_eq!(before[KEY_SAVED_ORIGINS], json!(["First St", "Second St"]));
    assert_eq!(before[KEY_SELECTED_ORIGIN_INDEX], json!(1));
}

#[tokio::test]
async fn file_store_survives_panel_remount() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let server = MockServer::start().await;

    {
        let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::at_path(&path));
        let mut h = harness(store, &server.uri());
        h.panel.mount(false).await;
        h.panel.set_origin_input("Home");
        h.panel.add_origin().await.unwrap();
        h.panel.set_origin_input("Work");
        h.panel.add_origin().await.unwrap();
        h.panel.select_origin(0).await.unwrap();
        h.panel.toggle_theme().await.unwrap();
    }

    let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::at_path(&path));
    let mut h = harness(store, &server.uri());
    h.panel.mount(false).await;

    let state = h.panel.state();
    assert_eq!(state.origins.entries(), ["Home".to_string(), "Work".to_string()]);
    assert_eq!(state.origins.selected_origin(), Some("Home"));
    assert_eq!(state.theme, Theme::Dark);
    assert_eq!(state.status, PanelStatus::Idle);
}

#[tokio::test]
async fn provider_meters_reach_the_panel_as_miles() {
    let provider = MockServer::start().await;
    mock_provider(
        &provider,
        json!({
            "status": "OK",
            "rows": [{"elements": [{
                "status": "OK",
                "duration": {"text": "12 mins", "value": 720},
                "distance": {"text": "10 mi", "value": 16093}
            }]}]
        }),
    )
    .await;
    let proxy_url = spawn_proxy(&provider).await;

    let store = Arc::new(MemoryStore::with_record(record(json!({
        "savedOrigins": ["123 Main St"],
        "selectedOriginIndex": 0,
    }))));
    let mut h = harness(store, &proxy_url);
    h.panel.mount(false).await;

    h.coordinator.on_capture(&capture("456 Oak Ave")).await.unwrap();
    let signal = h.signals.recv().await.unwrap();
    h.panel.on_message(signal).await;

    let result = h.panel.state().result().expect("success");
    assert_eq!(result.data.duration, "12 mins");
    assert_eq!(result.data.distance, "10.0 mi");
}

#[tokio::test]
async fn provider_zero_results_reaches_the_panel_as_error() {
    let provider = MockServer::start().await;
    mock_provider(&provider, json!({"status": "ZERO_RESULTS", "rows": []})).await;
    let proxy_url = spawn_proxy(&provider).await;

    let store = Arc::new(MemoryStore::with_record(record(json!({
        "savedOrigins": ["123 Main St"],
        "selectedOriginIndex": 0,
        "selectedText": "456 Oak Ave",
    }))));
    let mut h = harness(store, &proxy_url);
    h.panel.mount(false).await;

    assert_eq!(
        h.panel.state().status,
        PanelStatus::Error("Distance Matrix API error: ZERO_RESULTS".into())
    );
    assert!(h.panel.state().result().is_none());
}
