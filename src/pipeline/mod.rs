//! Pipeline module - composition and flow control

pub mod queue;
pub mod runner;

pub use queue::EventQueue;
pub use runner::{Pipeline, PipelineMetrics};
