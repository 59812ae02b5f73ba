//! Mint account authority state
//!
//! Reads the mint and freeze authority fields from a raw SPL mint account.
//! Authority state is read fresh for every event because a creator can
//! revoke (or keep) authorities at any point after launch.

use solana_sdk::program_pack::Pack;
use spl_token::state::Mint;

use crate::error::{Error, Result};

/// Authority state of a token mint at the time it was read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintAuthorityState {
    /// True when no authority can mint additional supply
    pub mint_authority_revoked: bool,
    /// True when no authority can freeze holder accounts
    pub freeze_authority_revoked: bool,
}

/// Parse authority state from raw mint account data.
pub fn parse_mint_account(data: &[u8]) -> Result<MintAuthorityState> {
    let mint = unpack_mint(data)?;

    Ok(MintAuthorityState {
        mint_authority_revoked: mint.mint_authority.is_none(),
        freeze_authority_revoked: mint.freeze_authority.is_none(),
    })
}

/// Total supply recorded on a mint account
pub fn parse_mint_supply(data: &[u8]) -> Result<u64> {
    Ok(unpack_mint(data)?.supply)
}

/// Unpack the base mint layout. Token-2022 mints carry extension data after
/// it, so only the leading `Mint::LEN` bytes are read.
fn unpack_mint(data: &[u8]) -> Result<Mint> {
    if data.len() < Mint::LEN {
        return Err(Error::Parse(format!(
            "Mint account data too short: {} bytes, need {}",
            data.len(),
            Mint::LEN
        )));
    }

    Mint::unpack(&data[..Mint::LEN])
        .map_err(|e| Error::Parse(format!("Failed to unpack mint account: {}", e)))
}

#[cfg(test)]
pub(crate) fn pack_mint_account(
    mint_authority: Option<solana_sdk::pubkey::Pubkey>,
    freeze_authority: Option<solana_sdk::pubkey::Pubkey>,
    supply: u64,
) -> Vec<u8> {
    use solana_sdk::program_option::COption;

    let mint = Mint {
        mint_authority: mint_authority.map_or(COption::None, COption::Some),
        supply,
        decimals: 6,
        is_initialized: true,
        freeze_authority: freeze_authority.map_or(COption::None, COption::Some),
    };

    let mut data = vec![0u8; Mint::LEN];
    mint.pack_into_slice(&mut data);
    data
}
