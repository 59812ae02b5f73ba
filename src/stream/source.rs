//! Log source abstraction
//!
//! A `LogSource` runs one subscription session at a time and pushes events
//! into a channel. The reconnector owns the session lifecycle; sources only
//! know how to open a single session and stream it until the transport drops.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

/// One raw log notification from the stream
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Transaction signature
    pub signature: String,
    /// Slot the transaction landed in
    pub slot: u64,
    /// Log lines emitted by the transaction, in execution order
    pub logs: Vec<String>,
}

/// Event pushed by a source during a session
#[derive(Debug, Clone)]
pub enum SourceEvent {
    /// Subscription acknowledged by the server
    Subscribed,
    /// A log notification arrived
    Record(LogRecord),
}

/// A restartable subscription transport
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Run one subscription session, pushing `SourceEvent`s into `tx` until
    /// the transport drops. `Ok(())` means the server closed the stream
    /// cleanly; `Err` means the transport failed. Either way the caller is
    /// expected to open a fresh session.
    async fn run_session(&self, tx: mpsc::Sender<SourceEvent>) -> Result<()>;
}
