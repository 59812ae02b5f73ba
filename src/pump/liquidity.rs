//! Liquidity pool derivation and burn evaluation
//!
//! Pump.fun pools live on the pump AMM program with PDA-derived addresses,
//! so the LP mint for a token can be computed without any lookup. Whether
//! the LP supply has actually been burned is decided from the supply held
//! at the incinerator's associated token account.

use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;
use spl_token::state::Account as TokenAccount;

use crate::error::{Error, Result};
use crate::pump::program::{INCINERATOR, PUMP_AMM_PROGRAM_ID, WSOL_MINT};

/// Liquidity state of a token's canonical pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityState {
    /// LP token mint of the canonical pool
    pub lp_mint: Pubkey,
    /// Total LP token supply
    pub lp_supply: u64,
    /// True when the supply outside the burn address is negligible
    pub lp_burned: bool,
}

impl LiquidityState {
    /// Evaluate burn status from the LP supply and the amount held at the
    /// incinerator. `burn_threshold_ratio` is the fraction of total supply
    /// that may remain un-burned while still counting as burned (dust from
    /// pool initialization).
    pub fn evaluate(
        lp_mint: Pubkey,
        lp_supply: u64,
        burned_amount: u64,
        burn_threshold_ratio: f64,
    ) -> Self {
        let lp_burned = if lp_supply == 0 {
            // Supply burned outright via the Burn instruction
            true
        } else {
            let remaining = lp_supply.saturating_sub(burned_amount);
            (remaining as f64 / lp_supply as f64) <= burn_threshold_ratio
        };

        Self {
            lp_mint,
            lp_supply,
            lp_burned,
        }
    }
}

/// Derive the canonical pool address for a token (base = token, quote = WSOL)
pub fn derive_pool(mint: &Pubkey) -> Pubkey {
    let (pool, _) = Pubkey::find_program_address(
        &[b"pool", mint.as_ref(), WSOL_MINT.as_ref()],
        &PUMP_AMM_PROGRAM_ID,
    );
    pool
}

/// Derive the LP token mint of a token's canonical pool
pub fn derive_lp_mint(mint: &Pubkey) -> Pubkey {
    let pool = derive_pool(mint);
    let (lp_mint, _) =
        Pubkey::find_program_address(&[b"pool_lp_mint", pool.as_ref()], &PUMP_AMM_PROGRAM_ID);
    lp_mint
}

/// The incinerator's associated token account for an LP mint
pub fn burn_token_account(lp_mint: &Pubkey) -> Pubkey {
    get_associated_token_address(&INCINERATOR, lp_mint)
}

/// Token amount held by a raw SPL token account
pub fn parse_token_amount(data: &[u8]) -> Result<u64> {
    if data.len() < TokenAccount::LEN {
        return Err(Error::Parse(format!(
            "Token account data too short: {} bytes, need {}",
            data.len(),
            TokenAccount::LEN
        )));
    }

    let account = TokenAccount::unpack(&data[..TokenAccount::LEN])
        .map_err(|e| Error::Parse(format!("Failed to unpack token account: {}", e)))?;

    Ok(account.amount)
}

#[cfg(test)]
pub(crate) fn pack_token_account(mint: &Pubkey, owner: &Pubkey, amount: u64) -> Vec<u8> {
    use solana_sdk::program_option::COption;
    use spl_token::state::AccountState;

    let account = TokenAccount {
        mint: *mint,
        owner: *owner,
        amount,
        delegate: COption::None,
        state: AccountState::Initialized,
        is_native: COption::None,
        delegated_amount: 0,
        close_authority: COption::None,
    };

    let mut data = vec![0u8; TokenAccount::LEN];
    account.pack_into_slice(&mut data);
    data
}
