//! CLI command implementations

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::alert::ConsoleSink;
use crate::config::Config;
use crate::enrich::{Enricher, RpcChainLookup};
use crate::pipeline::Pipeline;
use crate::stream::{Reconnector, SolanaLogSource, TracingObserver, WsSourceConfig};

/// Buffer between the reconnector and the pipeline feeder
const RECORD_CHANNEL_CAPACITY: usize = 1024;

/// Start watching for new launches
pub async fn watch(config: &Config) -> Result<()> {
    info!("Starting rugwatch...");
    info!(
        "Watching program {} at {} commitment",
        config.stream.program_id, config.rpc.commitment
    );

    let commitment = config.commitment()?;
    let cancel = CancellationToken::new();

    // Subscription side
    let source = Arc::new(SolanaLogSource::new(WsSourceConfig {
        ws_url: config.rpc.ws_endpoint.clone(),
        program_id: config.stream.program_id.clone(),
        commitment: config.rpc.commitment.clone(),
        ping_interval_secs: config.stream.ping_interval_secs,
    }));
    let reconnector = Reconnector::new(
        source,
        config.backoff.clone(),
        Arc::new(TracingObserver),
        cancel.clone(),
    );
    let records = reconnector.spawn(RECORD_CHANNEL_CAPACITY);

    // Enrichment and scoring side
    let lookup = Arc::new(RpcChainLookup::new(config.rpc.endpoint.clone(), commitment));
    let enricher = Arc::new(Enricher::new(
        lookup,
        config.per_lookup_timeout(),
        config.risk.burn_threshold_ratio,
    ));
    let pipeline = Pipeline::new(
        enricher,
        Arc::new(ConsoleSink),
        &config.pipeline,
        cancel.clone(),
    );
    let metrics = pipeline.metrics();

    // Ctrl-C starts a cooperative shutdown
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Shutdown requested; letting in-flight work finish");
                cancel.cancel();
            }
        });
    }

    pipeline.run(records).await;

    info!("Final counters: {}", metrics.summary());
    Ok(())
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}

/// Check RPC reachability before watching
pub async fn health(config: &Config) -> Result<()> {
    info!("Checking RPC endpoint {}...", config.rpc.endpoint);

    let client = solana_client::nonblocking::rpc_client::RpcClient::new_with_commitment(
        config.rpc.endpoint.clone(),
        config.commitment()?,
    );

    let probe = Duration::from_secs(10);

    match tokio::time::timeout(probe, client.get_version()).await {
        Ok(Ok(version)) => info!("RPC reachable, node version {}", version.solana_core),
        Ok(Err(e)) => {
            error!("RPC version check failed: {}", e);
            anyhow::bail!("RPC endpoint unhealthy");
        }
        Err(_) => {
            error!("RPC version check timed out after {:?}", probe);
            anyhow::bail!("RPC endpoint unreachable");
        }
    }

    match tokio::time::timeout(probe, client.get_slot()).await {
        Ok(Ok(slot)) => info!("Current slot: {}", slot),
        Ok(Err(e)) => warn!("Slot check failed: {}", e),
        Err(_) => warn!("Slot check timed out"),
    }

    info!("Health check passed");
    Ok(())
}
