//! Stream module - log ingestion from the subscription endpoint
//!
//! The WebSocket source produces raw log records, the reconnector keeps the
//! subscription alive across transport drops, and the parser turns matching
//! records into creation events.

pub mod parser;
pub mod reconnect;
pub mod source;
pub mod ws;

pub use parser::{CreationEvent, EventParser};
pub use reconnect::{ConnectionObserver, ConnectionState, Reconnector, TracingObserver};
pub use source::{LogRecord, LogSource, SourceEvent};
pub use ws::{SolanaLogSource, WsSourceConfig};
