//! Enrichment module - per-event on-chain lookups
//!
//! Each creation event gets up to three independent lookups (transaction
//! detail, mint account, derived LP account). Lookups that fail or time out
//! degrade the event instead of failing it: the affected field lands in
//! `fetch_errors` and scoring treats it as unresolved.

pub mod enricher;
pub mod lookup;

use std::collections::BTreeSet;

use crate::pump::{LiquidityState, MintAuthorityState};
use crate::stream::CreationEvent;

pub use enricher::Enricher;
pub use lookup::{ChainLookup, RpcChainLookup};

/// Fields an enrichment lookup can fail to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FetchField {
    /// Transaction detail lookup (display context only)
    Transaction,
    /// Mint account lookup (authority state)
    MintAccount,
    /// Derived LP account lookup (burn state)
    Liquidity,
}

impl std::fmt::Display for FetchField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchField::Transaction => write!(f, "transaction"),
            FetchField::MintAccount => write!(f, "mint_account"),
            FetchField::Liquidity => write!(f, "liquidity"),
        }
    }
}

/// Confirmation detail of the creation transaction. Display context only;
/// scoring never reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInfo {
    /// Slot the transaction was confirmed in
    pub slot: u64,
    /// Block time, when the node reports one
    pub block_time: Option<i64>,
}

/// A creation event plus whatever on-chain state could be resolved for it.
///
/// A field listed in `fetch_errors` is `None` here and must be treated as
/// unresolved downstream, never as a negative signal.
#[derive(Debug, Clone)]
pub struct EnrichedEvent {
    pub event: CreationEvent,
    pub transaction: Option<TransactionInfo>,
    pub authorities: Option<MintAuthorityState>,
    pub liquidity: Option<LiquidityState>,
    pub fetch_errors: BTreeSet<FetchField>,
}
