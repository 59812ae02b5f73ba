//! Creation event extraction from raw log records
//!
//! A record is interesting only when its logs carry the create-instruction
//! marker. Records without the marker are silently discarded; records with
//! the marker but no decodable event payload indicate upstream format drift
//! and are reported as parse errors rather than dropped quietly.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::error::{Error, Result};
use crate::pump::event::CreateEventPayload;
use crate::pump::program::{is_create_event, CREATE_LOG_MARKER, PROGRAM_DATA_PREFIX};
use crate::stream::source::LogRecord;

/// A newly observed token creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationEvent {
    /// Transaction signature (event identity)
    pub signature: String,
    /// Slot the creation landed in
    pub slot: u64,
    /// Token mint address
    pub mint: Pubkey,
    /// Creator wallet
    pub creator: Pubkey,
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// When this process first observed the creation
    pub observed_at: DateTime<Utc>,
}

/// Stateless parser for raw log records
pub struct EventParser;

impl EventParser {
    /// Extract a creation event from a raw record.
    ///
    /// Returns `Ok(None)` for records that are not creations at all, and
    /// `Err` for records that look like creations but cannot be decoded.
    pub fn parse(record: &LogRecord) -> Result<Option<CreationEvent>> {
        if !record.logs.iter().any(|log| log.contains(CREATE_LOG_MARKER)) {
            return Ok(None);
        }

        let payload = Self::find_create_payload(record)?;
        let event = CreateEventPayload::decode(&payload)?;

        debug!(
            mint = %event.mint,
            name = %event.name,
            symbol = %event.symbol,
            "Decoded creation event"
        );

        Ok(Some(CreationEvent {
            signature: record.signature.clone(),
            slot: record.slot,
            mint: event.mint,
            creator: event.creator,
            name: event.name,
            symbol: event.symbol,
            observed_at: Utc::now(),
        }))
    }

    /// Locate the CreateEvent payload among the record's program-data logs
    fn find_create_payload(record: &LogRecord) -> Result<Vec<u8>> {
        for log in &record.logs {
            let Some(encoded) = log.strip_prefix(PROGRAM_DATA_PREFIX) else {
                continue;
            };

            // Other instructions in the same transaction emit their own
            // events; only the CreateEvent payload matters here
            match BASE64_STANDARD.decode(encoded.trim()) {
                Ok(payload) if is_create_event(&payload) => return Ok(payload),
                Ok(_) => continue,
                Err(e) => {
                    debug!(signature = %record.signature, "Undecodable program data: {}", e);
                    continue;
                }
            }
        }

        Err(Error::Parse(format!(
            "Create marker present but no CreateEvent payload in {}",
            record.signature
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pump::event::encode_create_event;

    fn create_record(payload: &[u8]) -> LogRecord {
        LogRecord {
            signature: "sig1".to_string(),
            slot: 1234,
            logs: vec![
                "Program 6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P invoke [1]".to_string(),
                CREATE_LOG_MARKER.to_string(),
                format!("{}{}", PROGRAM_DATA_PREFIX, BASE64_STANDARD.encode(payload)),
                "Program 6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P success".to_string(),
            ],
        }
    }

    #[test]
    fn test_non_creation_record_yields_nothing() {
        let record = LogRecord {
            signature: "sig2".to_string(),
            slot: 1,
            logs: vec![
                "Program log: Instruction: Buy".to_string(),
                "Program log: Instruction: Sell".to_string(),
            ],
        };
        assert!(EventParser::parse(&record).unwrap().is_none());
    }

    #[test]
    fn test_creation_record_parses() {
        let mint = Pubkey::new_unique();
        let curve = Pubkey::new_unique();
        let creator = Pubkey::new_unique();
        let payload = encode_create_event("Moon", "MOON", "https://example.com", &mint, &curve, &creator);
        let record = create_record(&payload);

        let event = EventParser::parse(&record).unwrap().unwrap();
        assert_eq!(event.signature, "sig1");
        assert_eq!(event.slot, 1234);
        assert_eq!(event.mint, mint);
        assert_eq!(event.creator, creator);
        assert_eq!(event.symbol, "MOON");
    }

    #[test]
    fn test_marker_without_payload_is_parse_error() {
        let record = LogRecord {
            signature: "sig3".to_string(),
            slot: 1,
            logs: vec![CREATE_LOG_MARKER.to_string()],
        };
        assert!(matches!(
            EventParser::parse(&record),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_truncated_payload_is_parse_error() {
        let mint = Pubkey::new_unique();
        let curve = Pubkey::new_unique();
        let creator = Pubkey::new_unique();
        let payload = encode_create_event("Moon", "MOON", "u", &mint, &curve, &creator);
        // Cut into the pubkey section: mint can no longer be read
        let record = create_record(&payload[..payload.len() - 70]);

        assert!(matches!(
            EventParser::parse(&record),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_foreign_program_data_is_skipped() {
        let mint = Pubkey::new_unique();
        let curve = Pubkey::new_unique();
        let creator = Pubkey::new_unique();
        let payload = encode_create_event("Moon", "MOON", "u", &mint, &curve, &creator);

        let mut record = create_record(&payload);
        // Another program's event payload ahead of ours
        record.logs.insert(
            1,
            format!("{}{}", PROGRAM_DATA_PREFIX, BASE64_STANDARD.encode([9u8; 16])),
        );

        let event = EventParser::parse(&record).unwrap().unwrap();
        assert_eq!(event.mint, mint);
    }
}
