//! Verdict sinks
//!
//! The pipeline hands every verdict to an injected sink; this module only
//! defines the seam and a console implementation. Bot notifiers or
//! dashboard feeds implement the same trait.

use async_trait::async_trait;
use tracing::info;

use crate::risk::{RiskLabel, RiskVerdict};

/// Consumer of scored verdicts
#[async_trait]
pub trait VerdictSink: Send + Sync {
    async fn emit(&self, verdict: &RiskVerdict);
}

/// Sink that logs human-readable alerts with explorer links
pub struct ConsoleSink;

#[async_trait]
impl VerdictSink for ConsoleSink {
    async fn emit(&self, verdict: &RiskVerdict) {
        info!(
            mint = %verdict.mint,
            label = %verdict.label,
            "New pump.fun launch detected"
        );
        info!("  Transaction: https://solscan.io/tx/{}", verdict.signature);
        info!("  Pump.fun:    https://pump.fun/{}", verdict.mint);
        info!("  Dexscreener: https://dexscreener.com/solana/{}", verdict.mint);

        for signal in &verdict.good_signs {
            info!("  [good] {}", signal.describe());
        }
        for signal in &verdict.red_flags {
            info!("  [flag] {}", signal.describe());
        }
        for factor in &verdict.unresolved {
            info!("  [unresolved] {} could not be checked yet", factor);
        }

        match verdict.label {
            RiskLabel::Safer => info!("  Verdict: SAFER TOKEN (always DYOR)"),
            RiskLabel::HighRisk => info!("  Verdict: HIGH RISK - POSSIBLE RUG"),
        }
    }
}
