//! Monitoring client.
//!
//! Connects to the simulator's WebSocket stream, classifies every reading in
//! arrival order, and routes the result to the configured alert sinks.
//!
//! # Session lifecycle
//!
//! ```text
//! connect ──→ read frame ──→ parse ──→ Detector ──→ AlertSink
//!                 ↑                                    │
//!                 └────────────────────────────────────┘
//! shutdown ──→ close frame ──→ wait ≤ 1s for peer close
//! ```

use crate::alert::AlertSink;
use crate::core::{Condition, Detector, Reading, ReadingError};
use crate::stats::SharedSessionStats;
use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use std::time::Duration;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

/// Path of the reading stream on the simulator.
pub const STREAM_PATH: &str = "/ecg";

/// How long to wait for the peer to acknowledge our close frame.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// How a monitoring session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Local shutdown; `acknowledged` is whether the peer completed the close handshake in time.
    Shutdown { acknowledged: bool },
    /// The simulator closed the stream.
    PeerClosed,
}

/// Errors that end a monitoring session.
#[derive(Debug)]
pub enum ClientError {
    Connect(String),
    Transport(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Connect(e) => write!(f, "Connection failed: {e}"),
            ClientError::Transport(e) => write!(f, "Transport error: {e}"),
        }
    }
}

impl std::error::Error for ClientError {}

/// Build the stream URL for a `host:port` address; full `ws://`/`wss://` URLs pass through.
pub fn stream_url(addr: &str) -> String {
    if addr.starts_with("ws://") || addr.starts_with("wss://") {
        addr.to_string()
    } else {
        format!("ws://{addr}{STREAM_PATH}")
    }
}

/// One monitoring session: a detector plus the sinks its results go to.
pub struct MonitorSession {
    detector: Detector,
    sink: Box<dyn AlertSink>,
    stats: SharedSessionStats,
}

impl MonitorSession {
    /// Create a session with a fresh detector.
    ///
    /// `stats` only counts messages here; add it to `sink` as well to count results.
    pub fn new(sink: Box<dyn AlertSink>, stats: SharedSessionStats) -> Self {
        Self {
            detector: Detector::new(),
            sink,
            stats,
        }
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    pub fn stats(&self) -> &SharedSessionStats {
        &self.stats
    }

    /// Process one transport message.
    ///
    /// Malformed messages are counted and returned as errors without touching
    /// the detector.
    pub fn handle_message(&mut self, message: &str) -> Result<Option<Condition>, ReadingError> {
        self.stats.record_message();

        let reading = match Reading::parse(message) {
            Ok(reading) => reading,
            Err(e) => {
                self.stats.record_malformed();
                return Err(e);
            }
        };

        let condition = self.detector.classify(&reading);
        match &condition {
            Some(condition) => self.sink.record_condition(condition),
            None => self.sink.record_normal(&reading),
        }
        Ok(condition)
    }

    /// Stream readings from `url` until `shutdown` resolves or the stream ends.
    pub async fn run<F>(&mut self, url: &str, shutdown: F) -> Result<SessionEnd, ClientError>
    where
        F: Future<Output = ()>,
    {
        tracing::info!("Connecting to {}", url);
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ClientError::Connect(e.to_string()))?;
        tracing::info!("Connected to ECG simulator");

        let (mut write, mut read) = stream.split();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = self.handle_message(&text) {
                            tracing::warn!("Error parsing ECG data: {}", e);
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!("Simulator closed the stream: {:?}", frame);
                        // The close reply is only queued until the next flush.
                        if let Err(e) = write.flush().await {
                            tracing::debug!("Failed to flush close reply: {}", e);
                        }
                        return Ok(SessionEnd::PeerClosed);
                    }
                    None => return Ok(SessionEnd::PeerClosed),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(ClientError::Transport(e.to_string())),
                },
            }
        }

        let close = Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        }));
        if let Err(e) = write.send(close).await {
            tracing::warn!("Failed to send close frame: {}", e);
            return Ok(SessionEnd::Shutdown {
                acknowledged: false,
            });
        }

        // Readings still in flight are dropped; we only wait for the close reply.
        let acknowledged = tokio::time::timeout(CLOSE_TIMEOUT, async {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Close(_)) => return true,
                    Ok(_) => continue,
                    Err(_) => return false,
                }
            }
            true
        })
        .await
        .unwrap_or(false);

        if !acknowledged {
            tracing::warn!("Simulator did not acknowledge close within {:?}", CLOSE_TIMEOUT);
        }
        Ok(SessionEnd::Shutdown { acknowledged })
    }
}
