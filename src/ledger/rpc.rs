//! [`Ledger`] backed by the nonblocking Solana JSON-RPC client.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};
use solana_transaction_status::TransactionStatus;

use super::Ledger;

#[derive(Clone)]
pub struct RpcLedger {
    client: Arc<RpcClient>,
}

impl RpcLedger {
    pub fn new(endpoint: String, commitment: CommitmentConfig) -> Self {
        info!("🔌 [RPC] Connecting to {}", endpoint);
        Self {
            client: Arc::new(RpcClient::new_with_commitment(
                endpoint,
                wire_commitment(commitment),
            )),
        }
    }
}

/// Current nodes only understand processed/confirmed/finalized; map the
/// legacy levels (`singleGossip`, `max`, ...) onto those.
fn wire_commitment(commitment: CommitmentConfig) -> CommitmentConfig {
    if commitment.is_finalized() {
        CommitmentConfig::finalized()
    } else if commitment.is_confirmed() {
        CommitmentConfig::confirmed()
    } else {
        CommitmentConfig::processed()
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64> {
        self.client
            .get_balance(pubkey)
            .await
            .with_context(|| format!("fetching balance of {pubkey}"))
    }

    async fn get_account_data(&self, pubkey: &Pubkey) -> Result<Vec<u8>> {
        self.client
            .get_account_data(pubkey)
            .await
            .with_context(|| format!("fetching account {pubkey}"))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        self.client
            .get_latest_blockhash()
            .await
            .context("fetching latest blockhash")
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64> {
        self.client
            .get_minimum_balance_for_rent_exemption(data_len)
            .await
            .context("fetching rent exemption minimum")
    }

    // The ClientError is kept as the root cause so custom program codes
    // from preflight simulation can be classified upstream.
    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature> {
        let signature = self
            .client
            .send_transaction(tx)
            .await
            .context("sending mint transaction")?;
        debug!("📤 [RPC] Submitted {}", signature);
        Ok(signature)
    }

    async fn get_signature_status(&self, signature: &Signature) -> Result<Option<TransactionStatus>> {
        let response = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .with_context(|| format!("fetching status of {signature}"))?;
        Ok(response.value.into_iter().next().flatten())
    }
}
