//! Per-event enrichment
//!
//! The three lookups are independent of one another and run concurrently,
//! each under its own deadline. The event never fails as a whole: whatever
//! cannot be resolved before the deadline is recorded in `fetch_errors` and
//! left for the risk engine to treat as unresolved.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::enrich::{ChainLookup, EnrichedEvent, FetchField, TransactionInfo};
use crate::error::{Error, Result};
use crate::pump::liquidity::{burn_token_account, derive_lp_mint, parse_token_amount};
use crate::pump::mint::{parse_mint_account, parse_mint_supply};
use crate::pump::{LiquidityState, MintAuthorityState};
use crate::stream::CreationEvent;

/// Resolves on-chain state for creation events
pub struct Enricher {
    lookup: Arc<dyn ChainLookup>,
    per_lookup_timeout: Duration,
    burn_threshold_ratio: f64,
}

impl Enricher {
    pub fn new(
        lookup: Arc<dyn ChainLookup>,
        per_lookup_timeout: Duration,
        burn_threshold_ratio: f64,
    ) -> Self {
        Self {
            lookup,
            per_lookup_timeout,
            burn_threshold_ratio,
        }
    }

    /// Enrich one creation event. Infallible by design: lookup failures
    /// degrade into `fetch_errors` instead of aborting the event.
    pub async fn enrich(&self, event: CreationEvent) -> EnrichedEvent {
        let deadline = self.per_lookup_timeout;

        let (transaction, authorities, liquidity) = tokio::join!(
            timeout(deadline, self.fetch_transaction(&event.signature)),
            timeout(deadline, self.fetch_authorities(&event)),
            timeout(deadline, self.fetch_liquidity(&event)),
        );

        let mut fetch_errors = BTreeSet::new();
        let transaction = resolve(transaction, FetchField::Transaction, &mut fetch_errors);
        let authorities = resolve(authorities, FetchField::MintAccount, &mut fetch_errors);
        let liquidity = resolve(liquidity, FetchField::Liquidity, &mut fetch_errors);

        debug!(
            mint = %event.mint,
            unresolved = fetch_errors.len(),
            "Enrichment complete"
        );

        EnrichedEvent {
            event,
            transaction,
            authorities,
            liquidity,
            fetch_errors,
        }
    }

    async fn fetch_transaction(&self, signature: &str) -> Result<TransactionInfo> {
        self.lookup.get_transaction(signature).await
    }

    async fn fetch_authorities(&self, event: &CreationEvent) -> Result<MintAuthorityState> {
        let data = self
            .lookup
            .get_account(&event.mint)
            .await?
            .ok_or_else(|| Error::LookupNotFound(event.mint.to_string()))?;

        parse_mint_account(&data)
    }

    async fn fetch_liquidity(&self, event: &CreationEvent) -> Result<LiquidityState> {
        let lp_mint = derive_lp_mint(&event.mint);

        // No LP mint yet is the normal state right after creation
        let data = self
            .lookup
            .get_account(&lp_mint)
            .await?
            .ok_or_else(|| Error::LookupNotFound(lp_mint.to_string()))?;
        let lp_supply = parse_mint_supply(&data)?;

        // An absent incinerator account means nothing has been burned
        let burned_amount = match self.lookup.get_account(&burn_token_account(&lp_mint)).await? {
            Some(data) => parse_token_amount(&data)?,
            None => 0,
        };

        Ok(LiquidityState::evaluate(
            lp_mint,
            lp_supply,
            burned_amount,
            self.burn_threshold_ratio,
        ))
    }
}

/// Collapse a deadline-bounded lookup into `Option` + error bookkeeping
fn resolve<T>(
    outcome: std::result::Result<Result<T>, tokio::time::error::Elapsed>,
    field: FetchField,
    fetch_errors: &mut BTreeSet<FetchField>,
) -> Option<T> {
    match outcome {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            warn!(%field, error = %e, "Lookup failed; field left unresolved");
            fetch_errors.insert(field);
            None
        }
        Err(_) => {
            warn!(%field, "Lookup deadline exceeded; field left unresolved");
            fetch_errors.insert(field);
            None
        }
    }
}
