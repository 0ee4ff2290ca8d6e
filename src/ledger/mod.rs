//! Ledger access seam: every network round-trip the mint flow makes goes
//! through [`Ledger`], so the orchestrator can run against a live RPC node
//! or an in-memory double.

pub mod rpc;

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction,
};
use solana_transaction_status::TransactionStatus;

pub use rpc::RpcLedger;

#[async_trait]
pub trait Ledger: Send + Sync + 'static {
    /// Balance in lamports.
    async fn get_balance(&self, pubkey: &Pubkey) -> anyhow::Result<u64>;

    async fn get_account_data(&self, pubkey: &Pubkey) -> anyhow::Result<Vec<u8>>;

    async fn get_latest_blockhash(&self) -> anyhow::Result<Hash>;

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize)
        -> anyhow::Result<u64>;

    /// Submit a fully signed transaction, returning its signature.
    async fn send_transaction(&self, tx: &Transaction) -> anyhow::Result<Signature>;

    /// Latest known status, `None` while the cluster hasn't seen it.
    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> anyhow::Result<Option<TransactionStatus>>;
}
