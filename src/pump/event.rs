//! Pump.fun CreateEvent payload decoding
//!
//! The create instruction emits an Anchor event in a `Program data:` log
//! line. The payload is borsh-encoded; newer program versions append extra
//! fields, so decoding stops after the fields we need and ignores the rest.

use solana_sdk::pubkey::Pubkey;

use crate::error::{Error, Result};
use crate::pump::program::is_create_event;

/// Decoded CreateEvent payload
#[derive(Debug, Clone)]
pub struct CreateEventPayload {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Metadata URI
    pub uri: String,
    /// Token mint address
    pub mint: Pubkey,
    /// Bonding curve address
    pub bonding_curve: Pubkey,
    /// Creator wallet
    pub creator: Pubkey,
}

impl CreateEventPayload {
    /// Decode from a full event payload (discriminator included)
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if !is_create_event(payload) {
            return Err(Error::Parse("Not a CreateEvent payload".to_string()));
        }

        let data = &payload[8..];
        let mut offset = 0;

        let name = read_string(data, &mut offset)?;
        let symbol = read_string(data, &mut offset)?;
        let uri = read_string(data, &mut offset)?;
        let mint = read_pubkey(data, &mut offset)?;
        let bonding_curve = read_pubkey(data, &mut offset)?;
        let creator = read_pubkey(data, &mut offset)?;

        // Trailing bytes belong to fields added by later program versions

        Ok(Self {
            name,
            symbol,
            uri,
            mint,
            bonding_curve,
            creator,
        })
    }
}

/// Helper function to read a borsh-encoded string
fn read_string(data: &[u8], offset: &mut usize) -> Result<String> {
    if *offset + 4 > data.len() {
        return Err(Error::Parse("String length out of bounds".to_string()));
    }

    let len = u32::from_le_bytes(
        data[*offset..*offset + 4]
            .try_into()
            .map_err(|_| Error::Parse("Invalid string length".to_string()))?,
    ) as usize;

    *offset += 4;

    if *offset + len > data.len() {
        return Err(Error::Parse("String content out of bounds".to_string()));
    }

    let s = String::from_utf8(data[*offset..*offset + len].to_vec())
        .map_err(|_| Error::Parse("Invalid UTF-8 in string".to_string()))?;

    *offset += len;

    Ok(s)
}

/// Helper function to read a 32-byte pubkey
fn read_pubkey(data: &[u8], offset: &mut usize) -> Result<Pubkey> {
    if *offset + 32 > data.len() {
        return Err(Error::Parse("Pubkey out of bounds".to_string()));
    }

    let key = Pubkey::try_from(&data[*offset..*offset + 32])
        .map_err(|_| Error::Parse("Invalid pubkey bytes".to_string()))?;

    *offset += 32;

    Ok(key)
}

#[cfg(test)]
pub(crate) fn encode_create_event(
    name: &str,
    symbol: &str,
    uri: &str,
    mint: &Pubkey,
    bonding_curve: &Pubkey,
    creator: &Pubkey,
) -> Vec<u8> {
    use crate::pump::program::EVENT_DISCRIMINATORS;

    let mut payload = Vec::new();
    payload.extend_from_slice(&EVENT_DISCRIMINATORS::CREATE);
    for s in [name, symbol, uri] {
        payload.extend_from_slice(&(s.len() as u32).to_le_bytes());
        payload.extend_from_slice(s.as_bytes());
    }
    payload.extend_from_slice(mint.as_ref());
    payload.extend_from_slice(bonding_curve.as_ref());
    payload.extend_from_slice(creator.as_ref());
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_create_event() {
        let mint = Pubkey::new_unique();
        let curve = Pubkey::new_unique();
        let creator = Pubkey::new_unique();
        let payload = encode_create_event("Test Token", "TEST", "https://example.com", &mint, &curve, &creator);

        let event = CreateEventPayload::decode(&payload).unwrap();
        assert_eq!(event.name, "Test Token");
        assert_eq!(event.symbol, "TEST");
        assert_eq!(event.mint, mint);
        assert_eq!(event.creator, creator);
    }

    #[test]
    fn test_decode_ignores_trailing_fields() {
        let mint = Pubkey::new_unique();
        let curve = Pubkey::new_unique();
        let creator = Pubkey::new_unique();
        let mut payload = encode_create_event("T", "T", "u", &mint, &curve, &creator);
        // Fields appended by a newer program version
        payload.extend_from_slice(&1234567890i64.to_le_bytes());
        payload.extend_from_slice(Pubkey::new_unique().as_ref());

        let event = CreateEventPayload::decode(&payload).unwrap();
        assert_eq!(event.mint, mint);
    }

    #[test]
    fn test_decode_truncated_payload() {
        let mint = Pubkey::new_unique();
        let curve = Pubkey::new_unique();
        let creator = Pubkey::new_unique();
        let payload = encode_create_event("Test", "T", "u", &mint, &curve, &creator);

        // Cut into the mint pubkey
        let truncated = &payload[..payload.len() - 80];
        assert!(CreateEventPayload::decode(truncated).is_err());
    }

    #[test]
    fn test_decode_wrong_discriminator() {
        let payload = vec![0u8; 64];
        assert!(CreateEventPayload::decode(&payload).is_err());
    }
}
