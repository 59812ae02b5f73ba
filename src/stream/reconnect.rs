//! Subscription lifecycle state machine
//!
//! Wraps a `LogSource` with reconnect-and-resubscribe behavior so the
//! consumer sees one uninterrupted stream of records. Delays between
//! attempts grow exponentially with jitter up to a cap, and reset to the
//! minimum once a session has stayed up long enough. Records missed while
//! disconnected are not replayed; `logsSubscribe` has no cursor to resume
//! from, so the gap is only logged.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::BackoffConfig;
use crate::error::Result;
use crate::stream::source::{LogRecord, LogSource, SourceEvent};

/// Per-session buffer between the source and the reconnector
const SESSION_BUFFER: usize = 256;

/// Connection lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Subscribed,
    Degraded,
    Shutdown,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Subscribed => write!(f, "subscribed"),
            ConnectionState::Degraded => write!(f, "degraded"),
            ConnectionState::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// Observer for connection lifecycle transitions
pub trait ConnectionObserver: Send + Sync {
    fn on_transition(&self, from: ConnectionState, to: ConnectionState);
}

/// Default observer that logs transitions via tracing
pub struct TracingObserver;

impl ConnectionObserver for TracingObserver {
    fn on_transition(&self, from: ConnectionState, to: ConnectionState) {
        info!(%from, %to, "Connection state changed");
    }
}

/// Build the reconnect policy from config
pub fn make_backoff(config: &BackoffConfig) -> ExponentialBackoff {
    let min = Duration::from_millis(config.min_delay_ms);
    ExponentialBackoff {
        current_interval: min,
        initial_interval: min,
        randomization_factor: config.jitter,
        multiplier: 2.0,
        max_interval: Duration::from_millis(config.max_delay_ms),
        max_elapsed_time: None,
        ..ExponentialBackoff::default()
    }
}

/// How a subscription session ended
enum SessionEnd {
    Cancelled,
    Ended(Result<()>),
}

/// Owns the subscription loop and its connection state
pub struct Reconnector {
    source: Arc<dyn LogSource>,
    config: BackoffConfig,
    observer: Arc<dyn ConnectionObserver>,
    cancel: CancellationToken,
    state: ConnectionState,
}

impl Reconnector {
    pub fn new(
        source: Arc<dyn LogSource>,
        config: BackoffConfig,
        observer: Arc<dyn ConnectionObserver>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            config,
            observer,
            cancel,
            state: ConnectionState::Disconnected,
        }
    }

    /// Spawn the subscription loop, returning the record stream. The loop
    /// runs until the cancellation token fires, at which point the channel
    /// closes.
    pub fn spawn(self, capacity: usize) -> mpsc::Receiver<LogRecord> {
        let (tx, rx) = mpsc::channel(capacity);
        tokio::spawn(async move {
            self.run(tx).await;
        });
        rx
    }

    fn transition(&mut self, to: ConnectionState) {
        if self.state != to {
            self.observer.on_transition(self.state, to);
            self.state = to;
        }
    }

    /// Process one session event. Returns false when the downstream
    /// receiver is gone and the loop should stop.
    async fn handle_event(
        &mut self,
        event: SourceEvent,
        tx: &mpsc::Sender<LogRecord>,
        subscribed_at: &mut Option<Instant>,
        disconnected_at: &mut Option<Instant>,
    ) -> bool {
        match event {
            SourceEvent::Subscribed => {
                *subscribed_at = Some(Instant::now());
                if let Some(since) = disconnected_at.take() {
                    warn!(
                        outage_ms = since.elapsed().as_millis() as u64,
                        "Resubscribed; events during the outage were not replayed"
                    );
                }
                self.transition(ConnectionState::Subscribed);
                true
            }
            SourceEvent::Record(record) => tx.send(record).await.is_ok(),
        }
    }

    async fn run(mut self, tx: mpsc::Sender<LogRecord>) {
        let stable_uptime = Duration::from_secs(self.config.stable_reset_secs);
        let mut policy = make_backoff(&self.config);
        let mut disconnected_at: Option<Instant> = None;
        let cancel = self.cancel.clone();

        loop {
            if cancel.is_cancelled() {
                self.transition(ConnectionState::Shutdown);
                return;
            }

            self.transition(ConnectionState::Connecting);

            let (session_tx, mut session_rx) = mpsc::channel::<SourceEvent>(SESSION_BUFFER);
            let source = Arc::clone(&self.source);
            let session = async move { source.run_session(session_tx).await };
            tokio::pin!(session);

            let mut subscribed_at: Option<Instant> = None;

            let outcome = loop {
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => break SessionEnd::Cancelled,

                    Some(event) = session_rx.recv() => {
                        if !self
                            .handle_event(event, &tx, &mut subscribed_at, &mut disconnected_at)
                            .await
                        {
                            // Downstream dropped the stream
                            break SessionEnd::Cancelled;
                        }
                    }

                    result = &mut session => break SessionEnd::Ended(result),
                }
            };

            // Forward anything the session buffered before it ended
            while let Ok(event) = session_rx.try_recv() {
                if !self
                    .handle_event(event, &tx, &mut subscribed_at, &mut disconnected_at)
                    .await
                {
                    self.transition(ConnectionState::Shutdown);
                    return;
                }
            }

            match outcome {
                SessionEnd::Cancelled => {
                    self.transition(ConnectionState::Shutdown);
                    return;
                }
                SessionEnd::Ended(result) => {
                    match result {
                        Ok(()) => info!("Subscription closed by server"),
                        Err(e) => warn!("Subscription session failed: {}", e),
                    }
                    self.transition(ConnectionState::Degraded);

                    if disconnected_at.is_none() {
                        disconnected_at = Some(Instant::now());
                    }

                    // A sustained connected period earns a fresh backoff
                    if subscribed_at.is_some_and(|at| at.elapsed() >= stable_uptime) {
                        policy.reset();
                    }

                    let delay = policy
                        .next_backoff()
                        .unwrap_or(Duration::from_millis(self.config.max_delay_ms));
                    warn!("Reconnecting in {:?}...", delay);

                    tokio::select! {
                        _ = cancel.cancelled() => {
                            self.transition(ConnectionState::Shutdown);
                            return;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }

                    self.transition(ConnectionState::Disconnected);
                }
            }
        }
    }
}
