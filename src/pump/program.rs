//! Pump.fun program constants
//!
//! # WARNING: These constants may change without notice
//! Pump.fun has historically modified their program behavior.
//! If creation events stop being recognized, these values may
//! need to be updated.

use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Pump.fun bonding-curve program ID
/// WARNING: This may change if pump.fun deploys a new program version
pub const PUMP_PROGRAM_ID_STR: &str = "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P";

/// Pump.fun AMM program ID (post-graduation pools)
pub const PUMP_AMM_PROGRAM_ID_STR: &str = "pAMMBay6oceH9fJKBRHGP5D4bD4sWpmSwMn52FMfXEA";

/// Wrapped SOL mint, the quote side of every pump.fun pool
pub const WSOL_MINT_STR: &str = "So11111111111111111111111111111111111111112";

/// The incinerator: tokens sent here are unrecoverable
pub const INCINERATOR_STR: &str = "1nc1nerator11111111111111111111111111111111";

lazy_static::lazy_static! {
    /// Pump.fun program ID as Pubkey
    pub static ref PUMP_PROGRAM_ID: Pubkey =
        Pubkey::from_str(PUMP_PROGRAM_ID_STR).expect("Invalid pump program ID");

    /// Pump.fun AMM program ID as Pubkey
    pub static ref PUMP_AMM_PROGRAM_ID: Pubkey =
        Pubkey::from_str(PUMP_AMM_PROGRAM_ID_STR).expect("Invalid pump AMM program ID");

    /// Wrapped SOL mint as Pubkey
    pub static ref WSOL_MINT: Pubkey =
        Pubkey::from_str(WSOL_MINT_STR).expect("Invalid WSOL mint");

    /// Incinerator address as Pubkey
    pub static ref INCINERATOR: Pubkey =
        Pubkey::from_str(INCINERATOR_STR).expect("Invalid incinerator address");
}

/// Log line emitted when the create instruction executes
pub const CREATE_LOG_MARKER: &str = "Program log: Instruction: Create";

/// Prefix of log lines carrying base64-encoded Anchor event payloads
pub const PROGRAM_DATA_PREFIX: &str = "Program data: ";

/// Anchor event discriminators (first 8 bytes of the event payload)
/// Calculated as: SHA-256("event:<EventName>")[0..8]
#[allow(non_snake_case)]
pub mod EVENT_DISCRIMINATORS {
    /// CreateEvent discriminator
    /// SHA-256("event:CreateEvent")[0..8]
    pub const CREATE: [u8; 8] = [27, 114, 169, 77, 222, 235, 99, 118];
}

/// Check whether an event payload carries the CreateEvent discriminator
pub fn is_create_event(payload: &[u8]) -> bool {
    payload.len() >= 8 && payload[..8] == EVENT_DISCRIMINATORS::CREATE
}
