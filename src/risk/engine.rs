//! Deterministic risk scoring
//!
//! The rule set is an ordered table rather than branching logic so new
//! checks (honeypot, blacklist) are additive rows. Rule order fixes the
//! presentation order of signals on the verdict; the label itself only
//! depends on whether any red flag fired.
//!
//! A rule whose fact could not be resolved contributes to `unresolved` and
//! nothing else. Absence of evidence is not evidence of risk: the common
//! case of a token with no liquidity pool minutes after creation must not
//! be flagged.

use serde::{Serialize, Serializer};
use solana_sdk::pubkey::Pubkey;
use std::collections::BTreeSet;

use crate::enrich::EnrichedEvent;
use crate::risk::signals::{RiskFactor, RiskLabel, Signal};

/// Scoring outcome for one creation event. Computed once, emitted
/// immediately, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct RiskVerdict {
    #[serde(serialize_with = "pubkey_as_string")]
    pub mint: Pubkey,
    pub signature: String,
    pub label: RiskLabel,
    pub good_signs: Vec<Signal>,
    pub red_flags: Vec<Signal>,
    /// Checks that could not be resolved. Carried on every verdict so
    /// consumers never mistake "no flags found" for "verified safe".
    pub unresolved: BTreeSet<RiskFactor>,
}

fn pubkey_as_string<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&key.to_string())
}

/// What a rule concluded about its fact: `None` means unresolved
type Predicate = fn(&EnrichedEvent) -> Option<bool>;

/// One row of the rule table
struct Rule {
    factor: RiskFactor,
    good: Signal,
    red_flag: Signal,
    predicate: Predicate,
}

/// Ordered rule table. Order determines signal presentation order on the
/// verdict.
const RULES: [Rule; 3] = [
    Rule {
        factor: RiskFactor::MintAuthority,
        good: Signal::MintAuthorityRevoked,
        red_flag: Signal::MintAuthorityActive,
        predicate: |event| event.authorities.map(|a| a.mint_authority_revoked),
    },
    Rule {
        factor: RiskFactor::FreezeAuthority,
        good: Signal::FreezeAuthorityRevoked,
        red_flag: Signal::FreezeAuthorityActive,
        predicate: |event| event.authorities.map(|a| a.freeze_authority_revoked),
    },
    Rule {
        factor: RiskFactor::Liquidity,
        good: Signal::LpBurned,
        red_flag: Signal::LpNotBurned,
        predicate: |event| event.liquidity.map(|l| l.lp_burned),
    },
];

/// Pure rule evaluator. No I/O, no state, safe to call from any task.
pub struct RiskEngine;

impl RiskEngine {
    /// Score an enriched event against the rule table
    pub fn score(&self, enriched: &EnrichedEvent) -> RiskVerdict {
        let mut good_signs = Vec::new();
        let mut red_flags = Vec::new();
        let mut unresolved = BTreeSet::new();

        for rule in &RULES {
            match (rule.predicate)(enriched) {
                Some(true) => good_signs.push(rule.good),
                Some(false) => red_flags.push(rule.red_flag),
                None => {
                    unresolved.insert(rule.factor);
                }
            }
        }

        let label = if red_flags.is_empty() {
            RiskLabel::Safer
        } else {
            RiskLabel::HighRisk
        };

        RiskVerdict {
            mint: enriched.event.mint,
            signature: enriched.event.signature.clone(),
            label,
            good_signs,
            red_flags,
            unresolved,
        }
    }
}
