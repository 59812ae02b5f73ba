//! RPC lookup capability
//!
//! The pipeline only needs three primitives from the RPC endpoint, so they
//! sit behind a trait: production uses the nonblocking solana client, tests
//! substitute scripted lookups.

use async_trait::async_trait;
use solana_account_decoder::UiAccountEncoding;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcTransactionConfig};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::UiTransactionEncoding;
use std::str::FromStr;
use tracing::debug;

use crate::enrich::TransactionInfo;
use crate::error::{Error, Result};

/// On-chain lookup operations used by the enricher
#[async_trait]
pub trait ChainLookup: Send + Sync {
    /// Fetch confirmation detail for a transaction
    async fn get_transaction(&self, signature: &str) -> Result<TransactionInfo>;

    /// Fetch raw account data. `Ok(None)` means the account does not exist,
    /// which is distinct from a transport failure.
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Vec<u8>>>;
}

/// `ChainLookup` backed by the Solana JSON-RPC API
pub struct RpcChainLookup {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl RpcChainLookup {
    pub fn new(endpoint: String, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(endpoint, commitment),
            commitment,
        }
    }
}

#[async_trait]
impl ChainLookup for RpcChainLookup {
    async fn get_transaction(&self, signature: &str) -> Result<TransactionInfo> {
        let signature = Signature::from_str(signature)
            .map_err(|e| Error::Rpc(format!("Invalid signature {}: {}", signature, e)))?;

        let transaction = self
            .client
            .get_transaction_with_config(
                &signature,
                RpcTransactionConfig {
                    encoding: Some(UiTransactionEncoding::Json),
                    commitment: Some(self.commitment),
                    max_supported_transaction_version: Some(0),
                },
            )
            .await?;

        debug!(%signature, slot = transaction.slot, "Fetched transaction detail");

        Ok(TransactionInfo {
            slot: transaction.slot,
            block_time: transaction.block_time,
        })
    }

    async fn get_account(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        let response = self
            .client
            .get_account_with_config(
                address,
                RpcAccountInfoConfig {
                    encoding: Some(UiAccountEncoding::Base64),
                    commitment: Some(self.commitment),
                    data_slice: None,
                    min_context_slot: None,
                },
            )
            .await?;

        Ok(response.value.map(|account| account.data))
    }
}
