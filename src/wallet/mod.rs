//! Wallet capability seam.
//!
//! The mint flow only needs a public key and the ability to sign one or many
//! transactions; any wallet implementation offering those three capabilities
//! can drive it.

pub mod keypair;
pub mod provider;

use async_trait::async_trait;
use solana_sdk::{pubkey::Pubkey, transaction::Transaction};
use thiserror::Error;

pub use keypair::KeypairWallet;
pub use provider::WalletConnectionProvider;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet `{0}` not found")]
    UnknownWallet(String),
    #[error("wallet entry `{name}` address {address} does not match its key")]
    AddressMismatch { name: String, address: String },
    #[error("signing failed: {0}")]
    Signing(String),
}

/// The three capabilities the mint flow consumes.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// `None` while the wallet has not exposed an identity.
    fn public_key(&self) -> Option<Pubkey>;

    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError>;

    async fn sign_all_transactions(
        &self,
        txs: Vec<Transaction>,
    ) -> Result<Vec<Transaction>, WalletError>;
}

/// A selectable wallet implementation.
pub trait WalletAdapter: Wallet {
    fn name(&self) -> &str;

    fn connected(&self) -> bool;
}
