//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub rpc: RpcConfig,
    pub stream: StreamConfig,
    pub backoff: BackoffConfig,
    pub pipeline: PipelineConfig,
    pub risk: RiskConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_ws_endpoint")]
    pub ws_endpoint: String,
    /// Commitment level for both the subscription and lookups
    #[serde(default = "default_commitment")]
    pub commitment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Program whose logs are watched for creation events
    #[serde(default = "default_program_id")]
    pub program_id: String,
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
}

/// Reconnect backoff policy for the log subscription
#[derive(Debug, Clone, Deserialize)]
pub struct BackoffConfig {
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Randomization factor applied to each delay, in [0, 1]
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    /// Uptime after which the backoff resets to the minimum
    #[serde(default = "default_stable_reset_secs")]
    pub stable_reset_secs: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
            stable_reset_secs: default_stable_reset_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Ceiling on concurrent in-flight enrichments
    #[serde(default = "default_max_concurrent_enrichments")]
    pub max_concurrent_enrichments: usize,
    /// Capacity of the pending-event queue; the oldest pending event is
    /// dropped (and counted) when a new event arrives while full
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_per_lookup_timeout_ms")]
    pub per_lookup_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_enrichments: default_max_concurrent_enrichments(),
            queue_capacity: default_queue_capacity(),
            per_lookup_timeout_ms: default_per_lookup_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// LP supply remaining outside the burn address, as a fraction of total,
    /// at or below which liquidity counts as burned. Must be in [0, 1).
    #[serde(default = "default_burn_threshold_ratio")]
    pub burn_threshold_ratio: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            burn_threshold_ratio: default_burn_threshold_ratio(),
        }
    }
}

// Default value functions
fn default_rpc_endpoint() -> String {
    std::env::var("RPC_ENDPOINT").unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".into())
}

fn default_ws_endpoint() -> String {
    std::env::var("RPC_WS_ENDPOINT").unwrap_or_else(|_| "wss://api.mainnet-beta.solana.com".into())
}

fn default_commitment() -> String {
    "confirmed".into()
}

fn default_program_id() -> String {
    crate::pump::program::PUMP_PROGRAM_ID_STR.into()
}

fn default_ping_interval_secs() -> u64 {
    30
}

fn default_min_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_jitter() -> f64 {
    0.3
}

fn default_stable_reset_secs() -> u64 {
    60
}

fn default_max_concurrent_enrichments() -> usize {
    8
}

fn default_queue_capacity() -> usize {
    256
}

fn default_per_lookup_timeout_ms() -> u64 {
    5000
}

fn default_burn_threshold_ratio() -> f64 {
    0.01
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("rpc.endpoint", default_rpc_endpoint())?
            .set_default("rpc.ws_endpoint", default_ws_endpoint())?
            .set_default("rpc.commitment", default_commitment())?
            .set_default("stream.program_id", default_program_id())?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix RUGWATCH_)
            .add_source(
                config::Environment::with_prefix("RUGWATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values. A failure here halts startup before
    /// anything subscribes.
    fn validate(&self) -> Result<()> {
        Pubkey::from_str(&self.stream.program_id)
            .with_context(|| format!("Invalid program_id: {}", self.stream.program_id))?;

        self.commitment()
            .with_context(|| format!("Invalid commitment level: {}", self.rpc.commitment))?;

        if self.backoff.min_delay_ms == 0 {
            anyhow::bail!("backoff.min_delay_ms must be positive");
        }

        if self.backoff.max_delay_ms < self.backoff.min_delay_ms {
            anyhow::bail!(
                "backoff.max_delay_ms ({}) must be >= min_delay_ms ({})",
                self.backoff.max_delay_ms,
                self.backoff.min_delay_ms
            );
        }

        if !(0.0..=1.0).contains(&self.backoff.jitter) {
            anyhow::bail!("backoff.jitter must be within [0, 1]");
        }

        if self.pipeline.max_concurrent_enrichments == 0 {
            anyhow::bail!("pipeline.max_concurrent_enrichments must be positive");
        }

        if self.pipeline.queue_capacity == 0 {
            anyhow::bail!("pipeline.queue_capacity must be positive");
        }

        if self.pipeline.per_lookup_timeout_ms == 0 {
            anyhow::bail!("pipeline.per_lookup_timeout_ms must be positive");
        }

        if !(0.0..1.0).contains(&self.risk.burn_threshold_ratio) {
            anyhow::bail!("risk.burn_threshold_ratio must be within [0, 1)");
        }

        Ok(())
    }

    /// Watched program id as a Pubkey. Validated at load time.
    pub fn program_id(&self) -> Result<Pubkey> {
        Pubkey::from_str(&self.stream.program_id)
            .with_context(|| format!("Invalid program_id: {}", self.stream.program_id))
    }

    /// Commitment level for subscription and lookups
    pub fn commitment(&self) -> Result<CommitmentConfig> {
        match self.rpc.commitment.as_str() {
            "processed" => Ok(CommitmentConfig::processed()),
            "confirmed" => Ok(CommitmentConfig::confirmed()),
            "finalized" => Ok(CommitmentConfig::finalized()),
            other => anyhow::bail!("Unknown commitment level: {}", other),
        }
    }

    /// Per-lookup enrichment deadline
    pub fn per_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.pipeline.per_lookup_timeout_ms)
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  RPC:
    endpoint: {}
    ws_endpoint: {}
    commitment: {}
  Stream:
    program_id: {}
    ping_interval: {}s
  Backoff:
    min_delay: {}ms
    max_delay: {}ms
    jitter: {}
    stable_reset: {}s
  Pipeline:
    max_concurrent_enrichments: {}
    queue_capacity: {}
    per_lookup_timeout: {}ms
  Risk:
    burn_threshold_ratio: {}
"#,
            mask_url(&self.rpc.endpoint),
            mask_url(&self.rpc.ws_endpoint),
            self.rpc.commitment,
            self.stream.program_id,
            self.stream.ping_interval_secs,
            self.backoff.min_delay_ms,
            self.backoff.max_delay_ms,
            self.backoff.jitter,
            self.backoff.stable_reset_secs,
            self.pipeline.max_concurrent_enrichments,
            self.pipeline.queue_capacity,
            self.pipeline.per_lookup_timeout_ms,
            self.risk.burn_threshold_ratio,
        )
    }
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc: RpcConfig {
                endpoint: default_rpc_endpoint(),
                ws_endpoint: default_ws_endpoint(),
                commitment: default_commitment(),
            },
            stream: StreamConfig {
                program_id: default_program_id(),
                ping_interval_secs: default_ping_interval_secs(),
            },
            backoff: BackoffConfig::default(),
            pipeline: PipelineConfig::default(),
            risk: RiskConfig::default(),
        }
    }
}
