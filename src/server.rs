//! Reading simulator server.
//!
//! Serves a WebSocket stream of synthetic readings:
//! - `GET /ecg` upgrades to a WebSocket and sends one JSON reading per tick
//! - `GET /health` reports liveness
//!
//! # Architecture
//!
//! ```text
//! ReadingGenerator ──→ interval tick ──→ JSON text frame ──→ monitor client
//!  (per connection)                                              │
//!                        close handshake ◀──── close frame ◀─────┘
//! ```

use crate::config::SimulatorConfig;
use crate::source::ReadingGenerator;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared server state
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Time between readings
    send_interval: Duration,
    /// Inject irregular beats
    simulate_irregular: bool,
}

impl ServerState {
    pub fn new(config: &SimulatorConfig) -> Self {
        Self {
            send_interval: config.send_interval,
            simulate_irregular: config.simulate_irregular,
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /ecg
async fn ecg_stream(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_readings(socket, state))
}

async fn stream_readings(mut socket: WebSocket, state: Arc<ServerState>) {
    tracing::info!("Client connected");

    let mut generator = ReadingGenerator::new(state.simulate_irregular);
    let mut ticker = tokio::time::interval(state.send_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let reading = generator.next_reading();
                let json = match serde_json::to_string(&reading) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("Error marshaling data: {}", e);
                        continue;
                    }
                };

                if let Err(e) = socket.send(Message::Text(json)).await {
                    tracing::warn!("Error sending data: {}", e);
                    break;
                }

                tracing::debug!(
                    "Sent data: Heart rate={}, RR={:.2}s",
                    reading.heart_rate,
                    reading.rr_interval
                );
            }
            msg = socket.recv() => match msg {
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!("Client requested close: {:?}", frame);
                    // Flushes the queued close reply.
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
                None | Some(Err(_)) => break,
                Some(Ok(_)) => {} // ignore client messages
            }
        }
    }

    tracing::info!(
        "Client disconnected after {} readings",
        generator.heartbeats()
    );
}

/// Build the simulator router.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(crate::client::STREAM_PATH, get(ecg_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the simulator server.
///
/// Returns the bound address and a sender that triggers graceful shutdown.
/// Fails if the send interval is zero.
pub async fn run(
    config: SimulatorConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    anyhow::ensure!(
        !config.send_interval.is_zero(),
        "send interval must be greater than zero"
    );

    let state = Arc::new(ServerState::new(&config));
    let app = router(state);

    let listener = TcpListener::bind(&config.listen_addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("ECG simulator listening on ws://{}{}", actual_addr, crate::client::STREAM_PATH);
    tracing::info!("Send interval: {:?}", config.send_interval);
    tracing::info!("Simulate irregular heartbeats: {}", config.simulate_irregular);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
