//! Risk module - rule-based verdicts over enriched events

pub mod engine;
pub mod signals;

pub use engine::{RiskEngine, RiskVerdict};
pub use signals::{RiskFactor, RiskLabel, Signal};
