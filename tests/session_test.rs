//! End-to-end tests: simulator and monitor over a real WebSocket.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use ecg_monitor::alert::{AlertFanout, AlertSink};
use ecg_monitor::client::{stream_url, ClientError, MonitorSession, SessionEnd};
use ecg_monitor::config::SimulatorConfig;
use ecg_monitor::core::{Condition, Reading};
use ecg_monitor::server::run;
use ecg_monitor::source::ReadingGenerator;
use ecg_monitor::stats::create_shared_stats;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

/// Collects every routed result in arrival order.
#[derive(Default)]
struct Collected {
    events: Mutex<Vec<Result<Condition, Reading>>>,
}

impl AlertSink for Collected {
    fn record_condition(&self, condition: &Condition) {
        self.events.lock().unwrap().push(Ok(condition.clone()));
    }

    fn record_normal(&self, reading: &Reading) {
        self.events.lock().unwrap().push(Err(reading.clone()));
    }
}

fn simulator_config(interval_ms: u64) -> SimulatorConfig {
    SimulatorConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        send_interval: Duration::from_millis(interval_ms),
        simulate_irregular: true,
    }
}

fn reading_json() -> String {
    let reading = ReadingGenerator::with_seed(11, false).next_reading();
    serde_json::to_string(&reading).unwrap()
}

/// Serve a single-route WebSocket app on an ephemeral port.
async fn serve_stream<F, Fut>(handler: F) -> SocketAddr
where
    F: FnOnce(WebSocket) -> Fut + Clone + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let app = Router::new().route(
        "/ecg",
        get(move |ws: WebSocketUpgrade| async move { ws.on_upgrade(handler).into_response() }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

#[tokio::test]
async fn test_zero_interval_is_rejected() {
    let result = run(SimulatorConfig {
        send_interval: Duration::ZERO,
        ..simulator_config(1000)
    })
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_health_endpoint() {
    let (addr, shutdown_tx) = run(simulator_config(1000))
        .await
        .expect("Failed to start simulator");

    let response = reqwest::Client::new()
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert!(body["version"].as_str().is_some());

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_monitor_session_end_to_end() {
    let (addr, shutdown_tx) = run(simulator_config(10))
        .await
        .expect("Failed to start simulator");

    let collected = Arc::new(Collected::default());
    let stats = create_shared_stats();
    let sinks = AlertFanout::new()
        .with(collected.clone())
        .with(stats.clone());
    let mut session = MonitorSession::new(Box::new(sinks), stats.clone());

    let end = session
        .run(
            &stream_url(&addr.to_string()),
            tokio::time::sleep(Duration::from_millis(400)),
        )
        .await
        .expect("Session failed");

    assert!(matches!(end, SessionEnd::Shutdown { .. }), "{end:?}");

    let snapshot = stats.snapshot();
    assert!(snapshot.messages_received >= 5, "{snapshot:?}");
    assert_eq!(snapshot.malformed_messages, 0);
    assert_eq!(
        snapshot.normal_readings + snapshot.conditions,
        snapshot.messages_received
    );

    let events = collected.events.lock().unwrap();
    assert_eq!(events.len() as u64, snapshot.messages_received);

    // The first beat is always injected irregular and has no baseline.
    if let Ok(first) = &events[0] {
        assert_ne!(first.kind, ecg_monitor::core::ConditionKind::Arrhythmia);
    }

    let last_timestamp = match events.last().unwrap() {
        Ok(condition) => condition.timestamp,
        Err(reading) => reading.timestamp,
    };
    assert_eq!(session.detector().last_timestamp(), Some(last_timestamp));

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_simulator_acknowledges_close() {
    let (addr, shutdown_tx) = run(simulator_config(50))
        .await
        .expect("Failed to start simulator");

    let mut session = MonitorSession::new(Box::new(AlertFanout::new()), create_shared_stats());
    let end = session
        .run(
            &format!("ws://{}/ecg", addr),
            tokio::time::sleep(Duration::from_millis(120)),
        )
        .await
        .expect("Session failed");

    assert_eq!(end, SessionEnd::Shutdown { acknowledged: true });

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_peer_close_ends_session() {
    let (ack_tx, ack_rx) = oneshot::channel::<bool>();
    let ack_tx = Arc::new(Mutex::new(Some(ack_tx)));

    let addr = serve_stream(move |mut socket: WebSocket| async move {
        let _ = socket.send(Message::Text(reading_json())).await;
        let _ = socket.send(Message::Close(None)).await;

        let replied = matches!(
            tokio::time::timeout(Duration::from_secs(1), socket.recv()).await,
            Ok(Some(Ok(Message::Close(_))))
        );
        if let Some(tx) = ack_tx.lock().unwrap().take() {
            let _ = tx.send(replied);
        }
    })
    .await;

    let collected = Arc::new(Collected::default());
    let stats = create_shared_stats();
    let mut session = MonitorSession::new(Box::new(collected.clone()), stats.clone());

    let end = session
        .run(&stream_url(&addr.to_string()), std::future::pending())
        .await
        .expect("Session failed");

    assert_eq!(end, SessionEnd::PeerClosed);
    assert_eq!(collected.events.lock().unwrap().len(), 1);
    assert_eq!(stats.snapshot().messages_received, 1);
    assert!(session.detector().last_timestamp().is_some());

    let replied = tokio::time::timeout(Duration::from_secs(2), ack_rx)
        .await
        .expect("handler finished")
        .expect("handler reported");
    assert!(replied, "close reply was not delivered");
}

#[tokio::test]
async fn test_dropped_connection_is_transport_error() {
    let addr = serve_stream(|mut socket: WebSocket| async move {
        let _ = socket.send(Message::Text(reading_json())).await;
        // Dropped without a close frame.
        drop(socket);
    })
    .await;

    let collected = Arc::new(Collected::default());
    let mut session = MonitorSession::new(Box::new(collected.clone()), create_shared_stats());

    let result = session
        .run(&stream_url(&addr.to_string()), std::future::pending())
        .await;

    assert!(matches!(result, Err(ClientError::Transport(_))), "{result:?}");
    assert_eq!(collected.events.lock().unwrap().len(), 1);
}
