//! Solana `logsSubscribe` WebSocket transport
//!
//! Subscribes to all transactions mentioning the watched program and streams
//! their log notifications. One `run_session` call covers exactly one
//! connection; reconnection policy lives in the reconnector.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::stream::source::{LogRecord, LogSource, SourceEvent};

/// Configuration for the log subscription
#[derive(Debug, Clone)]
pub struct WsSourceConfig {
    /// WebSocket endpoint (wss://...)
    pub ws_url: String,
    /// Program whose logs are watched
    pub program_id: String,
    /// Commitment level for the subscription
    pub commitment: String,
    /// Ping interval in seconds
    pub ping_interval_secs: u64,
}

/// `logsSubscribe` client over tokio-tungstenite
pub struct SolanaLogSource {
    config: WsSourceConfig,
}

/// Envelope of a `logsNotification` message. Unknown fields are ignored for
/// forward compatibility.
#[derive(Debug, Deserialize)]
struct LogsNotification {
    method: String,
    params: NotificationParams,
}

#[derive(Debug, Deserialize)]
struct NotificationParams {
    result: NotificationResult,
}

#[derive(Debug, Deserialize)]
struct NotificationResult {
    context: NotificationContext,
    value: NotificationValue,
}

#[derive(Debug, Deserialize)]
struct NotificationContext {
    slot: u64,
}

#[derive(Debug, Deserialize)]
struct NotificationValue {
    signature: String,
    err: Option<serde_json::Value>,
    logs: Vec<String>,
}

/// Subscription acknowledgement (`"result": <subscription id>`)
#[derive(Debug, Deserialize)]
struct SubscribeReply {
    id: u64,
    result: u64,
}

impl SolanaLogSource {
    /// Create a new log source
    pub fn new(config: WsSourceConfig) -> Self {
        Self { config }
    }

    /// Build the logsSubscribe request
    fn subscribe_request(&self) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "logsSubscribe",
            "params": [
                { "mentions": [self.config.program_id] },
                { "commitment": self.config.commitment }
            ]
        })
        .to_string()
    }

    /// Handle one text frame, forwarding creation-relevant notifications
    async fn handle_message(text: &str, tx: &mpsc::Sender<SourceEvent>) -> Result<bool> {
        if let Ok(reply) = serde_json::from_str::<SubscribeReply>(text) {
            if reply.id == 1 {
                info!(subscription = reply.result, "Log subscription confirmed");
                tx.send(SourceEvent::Subscribed)
                    .await
                    .map_err(|e| Error::Internal(format!("Failed to send event: {}", e)))?;
                return Ok(true);
            }
        }

        if let Ok(notification) = serde_json::from_str::<LogsNotification>(text) {
            if notification.method != "logsNotification" {
                return Ok(false);
            }

            let value = notification.params.result.value;

            // Failed transactions carry no usable creation state
            if value.err.is_some() {
                debug!(signature = %value.signature, "Skipping failed transaction");
                return Ok(false);
            }

            let record = LogRecord {
                signature: value.signature,
                slot: notification.params.result.context.slot,
                logs: value.logs,
            };

            tx.send(SourceEvent::Record(record))
                .await
                .map_err(|e| Error::Internal(format!("Failed to send event: {}", e)))?;
            return Ok(true);
        }

        debug!("Unknown message: {}", &text[..text.len().min(100)]);
        Ok(false)
    }
}

#[async_trait]
impl LogSource for SolanaLogSource {
    async fn run_session(&self, tx: mpsc::Sender<SourceEvent>) -> Result<()> {
        info!("Connecting to {}", self.config.ws_url);

        // Parse URL
        let url = url::Url::parse(&self.config.ws_url)
            .map_err(|e| Error::Config(format!("Invalid WebSocket URL: {}", e)))?;

        // Connect
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| Error::WsConnection(format!("WebSocket connect failed: {}", e)))?;

        let (mut write, mut read) = ws_stream.split();

        // Subscribe to program logs
        write
            .send(Message::Text(self.subscribe_request()))
            .await
            .map_err(|e| Error::Subscription(format!("Failed to subscribe: {}", e)))?;
        info!(program = %self.config.program_id, "Sent logsSubscribe request");

        // Set up ping interval
        let ping_interval = Duration::from_secs(self.config.ping_interval_secs);
        let mut ping_timer = tokio::time::interval(ping_interval);

        // Process messages
        loop {
            tokio::select! {
                // Ping to keep connection alive
                _ = ping_timer.tick() => {
                    if let Err(e) = write.send(Message::Ping(vec![])).await {
                        error!("Failed to send ping: {}", e);
                        return Err(Error::StreamDisconnected);
                    }
                    debug!("Sent ping");
                }

                // Receive messages
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if let Err(e) = Self::handle_message(&text, &tx).await {
                                return Err(e);
                            }
                        }
                        Some(Ok(Message::Pong(_))) => {
                            debug!("Received pong");
                        }
                        Some(Ok(Message::Close(_))) => {
                            info!("WebSocket closed by server");
                            return Ok(());
                        }
                        Some(Err(e)) => {
                            error!("WebSocket error: {}", e);
                            return Err(Error::StreamDisconnected);
                        }
                        None => {
                            info!("WebSocket stream ended");
                            return Err(Error::StreamDisconnected);
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_source() -> SolanaLogSource {
        SolanaLogSource::new(WsSourceConfig {
            ws_url: "wss://api.mainnet-beta.solana.com".to_string(),
            program_id: crate::pump::program::PUMP_PROGRAM_ID_STR.to_string(),
            commitment: "confirmed".to_string(),
            ping_interval_secs: 30,
        })
    }

    #[test]
    fn test_subscribe_request_shape() {
        let request = test_source().subscribe_request();
        assert!(request.contains("logsSubscribe"));
        assert!(request.contains(crate::pump::program::PUMP_PROGRAM_ID_STR));
        assert!(request.contains("confirmed"));
    }

    #[tokio::test]
    async fn test_handle_notification() {
        let (tx, mut rx) = mpsc::channel(4);
        let text = r#"{
            "jsonrpc": "2.0",
            "method": "logsNotification",
            "params": {
                "result": {
                    "context": { "slot": 348765 },
                    "value": {
                        "signature": "sig123",
                        "err": null,
                        "logs": ["Program log: Instruction: Create"]
                    }
                },
                "subscription": 7
            }
        }"#;

        assert!(SolanaLogSource::handle_message(text, &tx).await.unwrap());

        match rx.recv().await.unwrap() {
            SourceEvent::Record(record) => {
                assert_eq!(record.signature, "sig123");
                assert_eq!(record.slot, 348765);
                assert_eq!(record.logs.len(), 1);
            }
            other => panic!("Expected record, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handle_failed_transaction_skipped() {
        let (tx, mut rx) = mpsc::channel(4);
        let text = r#"{
            "jsonrpc": "2.0",
            "method": "logsNotification",
            "params": {
                "result": {
                    "context": { "slot": 1 },
                    "value": {
                        "signature": "sig456",
                        "err": { "InstructionError": [0, "Custom"] },
                        "logs": []
                    }
                },
                "subscription": 7
            }
        }"#;

        assert!(!SolanaLogSource::handle_message(text, &tx).await.unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_handle_subscription_ack() {
        let (tx, mut rx) = mpsc::channel(4);
        let text = r#"{ "jsonrpc": "2.0", "id": 1, "result": 42 }"#;

        assert!(SolanaLogSource::handle_message(text, &tx).await.unwrap());
        assert!(matches!(rx.recv().await.unwrap(), SourceEvent::Subscribed));
    }
}
