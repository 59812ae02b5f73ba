//! Pipeline orchestration
//!
//! One feeder loop parses incoming records and admits events to the bounded
//! queue; one dispatcher pulls events as enrichment capacity frees up and
//! spawns an independent task per event. Events are scored out of order but
//! each event's own lookups finish (or time out) before its verdict is
//! emitted. Shutdown is cooperative: in-flight work completes, nothing is
//! aborted mid-emit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::alert::VerdictSink;
use crate::config::PipelineConfig;
use crate::enrich::Enricher;
use crate::pipeline::queue::EventQueue;
use crate::risk::RiskEngine;
use crate::stream::{CreationEvent, EventParser, LogRecord};

/// Counters for everything the pipeline drops or emits. Dropped work must
/// always be observable here; nothing is swallowed silently.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Raw records received from the stream
    pub received: AtomicU64,
    /// Records that matched the creation shape but failed to parse
    pub parse_errors: AtomicU64,
    /// Events shed because the pending queue was full
    pub overflow: AtomicU64,
    /// Verdicts emitted to the sink
    pub verdicts: AtomicU64,
}

impl PipelineMetrics {
    pub fn summary(&self) -> String {
        format!(
            "received={} parse_errors={} overflow={} verdicts={}",
            self.received.load(Ordering::Relaxed),
            self.parse_errors.load(Ordering::Relaxed),
            self.overflow.load(Ordering::Relaxed),
            self.verdicts.load(Ordering::Relaxed),
        )
    }
}

/// Composes parser, enricher, engine and sink over a record stream
pub struct Pipeline {
    enricher: Arc<Enricher>,
    sink: Arc<dyn VerdictSink>,
    queue: Arc<EventQueue<CreationEvent>>,
    semaphore: Arc<Semaphore>,
    metrics: Arc<PipelineMetrics>,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(
        enricher: Arc<Enricher>,
        sink: Arc<dyn VerdictSink>,
        config: &PipelineConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            enricher,
            sink,
            queue: Arc::new(EventQueue::new(config.queue_capacity)),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_enrichments)),
            metrics: Arc::new(PipelineMetrics::default()),
            cancel,
        }
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        self.metrics.clone()
    }

    /// Drive the pipeline until the record stream ends or cancellation
    /// fires, then let in-flight enrichments finish.
    pub async fn run(self, mut records: mpsc::Receiver<LogRecord>) {
        let dispatcher = tokio::spawn(Self::dispatch(
            self.queue.clone(),
            self.semaphore.clone(),
            self.enricher.clone(),
            self.sink.clone(),
            self.metrics.clone(),
            self.cancel.clone(),
        ));

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,

                maybe = records.recv() => match maybe {
                    Some(record) => self.ingest(record),
                    None => break,
                },
            }
        }

        // Stop admitting; the dispatcher drains its in-flight tasks
        self.cancel.cancel();
        dispatcher.await.ok();

        info!("Pipeline stopped: {}", self.metrics.summary());
    }

    /// Parse a raw record and admit the event to the queue
    fn ingest(&self, record: LogRecord) {
        self.metrics.received.fetch_add(1, Ordering::Relaxed);

        match EventParser::parse(&record) {
            Ok(None) => {}
            Ok(Some(event)) => {
                info!(
                    mint = %event.mint,
                    symbol = %event.symbol,
                    slot = event.slot,
                    "New token detected"
                );
                if let Some(shed) = self.queue.push(event) {
                    self.metrics.overflow.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        mint = %shed.mint,
                        "Pending queue full; shed oldest event before enrichment"
                    );
                }
            }
            Err(e) => {
                self.metrics.parse_errors.fetch_add(1, Ordering::Relaxed);
                warn!(signature = %record.signature, "Dropping malformed creation record: {}", e);
            }
        }
    }

    /// Pull events as capacity frees up and score each in its own task
    async fn dispatch(
        queue: Arc<EventQueue<CreationEvent>>,
        semaphore: Arc<Semaphore>,
        enricher: Arc<Enricher>,
        sink: Arc<dyn VerdictSink>,
        metrics: Arc<PipelineMetrics>,
        cancel: CancellationToken,
    ) {
        let mut tasks = JoinSet::new();

        loop {
            // Reap whatever finished since the last round
            while tasks.try_join_next().is_some() {}

            let permit = tokio::select! {
                _ = cancel.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = queue.pop() => event,
            };

            let enricher = enricher.clone();
            let sink = sink.clone();
            let metrics = metrics.clone();
            tasks.spawn(async move {
                let enriched = enricher.enrich(event).await;
                let verdict = RiskEngine.score(&enriched);
                sink.emit(&verdict).await;
                metrics.verdicts.fetch_add(1, Ordering::Relaxed);
                drop(permit);
            });
        }

        // Cooperative shutdown: in-flight enrichments run to completion (or
        // their deadlines); nothing is aborted mid-emit
        while tasks.join_next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
    use base64::Engine;
    use solana_sdk::pubkey::Pubkey;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::enrich::{ChainLookup, TransactionInfo};
    use crate::error::{Error, Result};
    use crate::pump::event::encode_create_event;
    use crate::pump::liquidity::{burn_token_account, derive_lp_mint, pack_token_account};
    use crate::pump::mint::pack_mint_account;
    use crate::pump::program::{CREATE_LOG_MARKER, INCINERATOR, PROGRAM_DATA_PREFIX};
    use crate::risk::{RiskLabel, RiskVerdict, Signal};

    struct CollectingSink {
        verdicts: Mutex<Vec<RiskVerdict>>,
    }

    #[async_trait]
    impl VerdictSink for CollectingSink {
        async fn emit(&self, verdict: &RiskVerdict) {
            self.verdicts.lock().unwrap().push(verdict.clone());
        }
    }

    /// Lookup whose transaction fetch blocks on a gate the test controls
    struct GatedLookup {
        accounts: HashMap<Pubkey, Vec<u8>>,
        gate: Arc<Semaphore>,
        started: Arc<AtomicU64>,
    }

    #[async_trait]
    impl ChainLookup for GatedLookup {
        async fn get_transaction(&self, _signature: &str) -> Result<TransactionInfo> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| Error::Internal("gate closed".to_string()))?;
            Ok(TransactionInfo {
                slot: 1,
                block_time: None,
            })
        }

        async fn get_account(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
            Ok(self.accounts.get(address).cloned())
        }
    }

    fn creation_record(signature: &str, mint: &Pubkey) -> LogRecord {
        let payload = encode_create_event(
            "Test",
            "TST",
            "https://example.com",
            mint,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
        );
        LogRecord {
            signature: signature.to_string(),
            slot: 10,
            logs: vec![
                CREATE_LOG_MARKER.to_string(),
                format!("{}{}", PROGRAM_DATA_PREFIX, BASE64_STANDARD.encode(payload)),
            ],
        }
    }

    /// Mint + pool accounts for a token with revoked authorities and a
    /// fully burned LP supply
    fn safe_token_accounts(mint: &Pubkey) -> HashMap<Pubkey, Vec<u8>> {
        let lp_mint = derive_lp_mint(mint);
        let mut accounts = HashMap::new();
        accounts.insert(*mint, pack_mint_account(None, None, 1_000_000_000));
        accounts.insert(lp_mint, pack_mint_account(None, None, 1_000_000));
        accounts.insert(
            burn_token_account(&lp_mint),
            pack_token_account(&lp_mint, &INCINERATOR, 1_000_000),
        );
        accounts
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    struct TestPipeline {
        records: mpsc::Sender<LogRecord>,
        sink: Arc<CollectingSink>,
        metrics: Arc<PipelineMetrics>,
        cancel: CancellationToken,
        handle: tokio::task::JoinHandle<()>,
    }

    fn start_pipeline(
        lookup: GatedLookup,
        config: PipelineConfig,
        timeout_ms: u64,
    ) -> TestPipeline {
        let enricher = Arc::new(Enricher::new(
            Arc::new(lookup),
            Duration::from_millis(timeout_ms),
            0.01,
        ));
        let sink = Arc::new(CollectingSink {
            verdicts: Mutex::new(vec![]),
        });
        let cancel = CancellationToken::new();
        let pipeline = Pipeline::new(enricher, sink.clone(), &config, cancel.clone());
        let metrics = pipeline.metrics();

        let (tx, rx) = mpsc::channel(64);
        let handle = tokio::spawn(pipeline.run(rx));

        TestPipeline {
            records: tx,
            sink,
            metrics,
            cancel,
            handle,
        }
    }

    #[tokio::test]
    async fn test_end_to_end_safer_verdict() {
        let mint = Pubkey::new_unique();
        let gate = Arc::new(Semaphore::new(100));
        let lookup = GatedLookup {
            accounts: safe_token_accounts(&mint),
            gate,
            started: Arc::new(AtomicU64::new(0)),
        };

        let pipeline = start_pipeline(lookup, PipelineConfig::default(), 5000);
        pipeline
            .records
            .send(creation_record("sig1", &mint))
            .await
            .unwrap();

        let metrics = pipeline.metrics.clone();
        wait_until(move || metrics.verdicts.load(Ordering::Relaxed) == 1).await;

        {
            let verdicts = pipeline.sink.verdicts.lock().unwrap();
            assert_eq!(verdicts.len(), 1);
            let verdict = &verdicts[0];
            assert_eq!(verdict.label, RiskLabel::Safer);
            assert_eq!(
                verdict.good_signs,
                vec![
                    Signal::MintAuthorityRevoked,
                    Signal::FreezeAuthorityRevoked,
                    Signal::LpBurned
                ]
            );
            assert!(verdict.red_flags.is_empty());
            assert_eq!(verdict.mint, mint);
        }

        pipeline.cancel.cancel();
        pipeline.handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_end_to_end_high_risk_verdict() {
        let mint = Pubkey::new_unique();
        let lp_mint = derive_lp_mint(&mint);

        // Mint authority retained, freeze revoked, LP minted but not burned
        let mut accounts = HashMap::new();
        accounts.insert(
            mint,
            pack_mint_account(Some(Pubkey::new_unique()), None, 1_000_000_000),
        );
        accounts.insert(lp_mint, pack_mint_account(None, None, 1_000_000));

        let lookup = GatedLookup {
            accounts,
            gate: Arc::new(Semaphore::new(100)),
            started: Arc::new(AtomicU64::new(0)),
        };

        let pipeline = start_pipeline(lookup, PipelineConfig::default(), 5000);
        pipeline
            .records
            .send(creation_record("sig2", &mint))
            .await
            .unwrap();

        let metrics = pipeline.metrics.clone();
        wait_until(move || metrics.verdicts.load(Ordering::Relaxed) == 1).await;

        {
            let verdicts = pipeline.sink.verdicts.lock().unwrap();
            let verdict = &verdicts[0];
            assert_eq!(verdict.label, RiskLabel::HighRisk);
            assert_eq!(verdict.good_signs, vec![Signal::FreezeAuthorityRevoked]);
            assert_eq!(
                verdict.red_flags,
                vec![Signal::MintAuthorityActive, Signal::LpNotBurned]
            );
        }

        pipeline.cancel.cancel();
        pipeline.handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_non_creation_and_malformed_records() {
        let lookup = GatedLookup {
            accounts: HashMap::new(),
            gate: Arc::new(Semaphore::new(100)),
            started: Arc::new(AtomicU64::new(0)),
        };
        let pipeline = start_pipeline(lookup, PipelineConfig::default(), 100);

        // Not a creation: ignored entirely
        pipeline
            .records
            .send(LogRecord {
                signature: "other".to_string(),
                slot: 1,
                logs: vec!["Program log: Instruction: Buy".to_string()],
            })
            .await
            .unwrap();

        // Creation marker with no payload: counted as a parse error
        pipeline
            .records
            .send(LogRecord {
                signature: "drifted".to_string(),
                slot: 2,
                logs: vec![CREATE_LOG_MARKER.to_string()],
            })
            .await
            .unwrap();

        let metrics = pipeline.metrics.clone();
        wait_until(move || metrics.received.load(Ordering::Relaxed) == 2).await;
        let metrics = pipeline.metrics.clone();
        wait_until(move || metrics.parse_errors.load(Ordering::Relaxed) == 1).await;

        assert_eq!(pipeline.metrics.verdicts.load(Ordering::Relaxed), 0);
        assert!(pipeline.sink.verdicts.lock().unwrap().is_empty());

        pipeline.cancel.cancel();
        pipeline.handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_overflow_sheds_oldest_and_counts() {
        let gate = Arc::new(Semaphore::new(0));
        let started = Arc::new(AtomicU64::new(0));
        let lookup = GatedLookup {
            accounts: HashMap::new(),
            gate: gate.clone(),
            started: started.clone(),
        };

        let config = PipelineConfig {
            max_concurrent_enrichments: 1,
            queue_capacity: 2,
            per_lookup_timeout_ms: 10_000,
        };
        let pipeline = start_pipeline(lookup, config, 10_000);

        // First event occupies the single enrichment slot and blocks on the gate
        let mints: Vec<Pubkey> = (0..5).map(|_| Pubkey::new_unique()).collect();
        pipeline
            .records
            .send(creation_record("e1", &mints[0]))
            .await
            .unwrap();
        let started_probe = started.clone();
        wait_until(move || started_probe.load(Ordering::SeqCst) == 1).await;

        // Four more arrivals against a capacity-2 queue: two must be shed
        for (i, mint) in mints.iter().enumerate().skip(1) {
            pipeline
                .records
                .send(creation_record(&format!("e{}", i + 1), mint))
                .await
                .unwrap();
        }
        let metrics = pipeline.metrics.clone();
        wait_until(move || metrics.overflow.load(Ordering::Relaxed) == 2).await;

        // Release the gate; the admitted events flow through
        gate.add_permits(100);
        let metrics = pipeline.metrics.clone();
        wait_until(move || metrics.verdicts.load(Ordering::Relaxed) == 3).await;

        {
            let verdicts = pipeline.sink.verdicts.lock().unwrap();
            let mut signatures: Vec<String> =
                verdicts.iter().map(|v| v.signature.clone()).collect();
            signatures.sort();
            // e2 and e3 were the oldest pending when e4 and e5 arrived
            assert_eq!(signatures, vec!["e1", "e4", "e5"]);
        }
        assert_eq!(pipeline.metrics.overflow.load(Ordering::Relaxed), 2);

        pipeline.cancel.cancel();
        pipeline.handle.await.unwrap();
    }
}
