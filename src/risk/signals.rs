//! Risk signal vocabulary
//!
//! Signal names are stable identifiers: downstream consumers (bots,
//! dashboards) match on them, so renaming one is a breaking change.

use serde::Serialize;

/// A single scored observation about a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    MintAuthorityRevoked,
    MintAuthorityActive,
    FreezeAuthorityRevoked,
    FreezeAuthorityActive,
    LpBurned,
    LpNotBurned,
}

impl Signal {
    /// Human-readable explanation for alert output
    pub fn describe(&self) -> &'static str {
        match self {
            Signal::MintAuthorityRevoked => "Mint authority revoked (cannot mint more tokens)",
            Signal::MintAuthorityActive => {
                "Mint authority active (dev can dilute supply at will)"
            }
            Signal::FreezeAuthorityRevoked => {
                "Freeze authority revoked (cannot freeze holders' tokens)"
            }
            Signal::FreezeAuthorityActive => "Freeze authority active (dev can freeze wallets)",
            Signal::LpBurned => "Liquidity pool tokens burned (liquidity cannot be rugged)",
            Signal::LpNotBurned => "LP tokens not burned (dev can pull liquidity)",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Signal::MintAuthorityRevoked => "MINT_AUTHORITY_REVOKED",
            Signal::MintAuthorityActive => "MINT_AUTHORITY_ACTIVE",
            Signal::FreezeAuthorityRevoked => "FREEZE_AUTHORITY_REVOKED",
            Signal::FreezeAuthorityActive => "FREEZE_AUTHORITY_ACTIVE",
            Signal::LpBurned => "LP_BURNED",
            Signal::LpNotBurned => "LP_NOT_BURNED",
        };
        write!(f, "{}", name)
    }
}

/// The on-chain fact a rule examines. Used to report which checks stayed
/// unresolved on a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskFactor {
    MintAuthority,
    FreezeAuthority,
    Liquidity,
}

impl std::fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RiskFactor::MintAuthority => "MINT_AUTHORITY",
            RiskFactor::FreezeAuthority => "FREEZE_AUTHORITY",
            RiskFactor::Liquidity => "LIQUIDITY",
        };
        write!(f, "{}", name)
    }
}

/// Final classification of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLabel {
    Safer,
    HighRisk,
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLabel::Safer => write!(f, "SAFER"),
            RiskLabel::HighRisk => write!(f, "HIGH_RISK"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_are_stable() {
        assert_eq!(Signal::MintAuthorityRevoked.to_string(), "MINT_AUTHORITY_REVOKED");
        assert_eq!(Signal::LpNotBurned.to_string(), "LP_NOT_BURNED");
        assert_eq!(RiskFactor::Liquidity.to_string(), "LIQUIDITY");
        assert_eq!(RiskLabel::HighRisk.to_string(), "HIGH_RISK");
    }

    #[test]
    fn test_serde_names_match_display() {
        let json = serde_json::to_string(&Signal::FreezeAuthorityActive).unwrap();
        assert_eq!(json, "\"FREEZE_AUTHORITY_ACTIVE\"");
    }
}
