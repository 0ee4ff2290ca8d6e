//! Local keypair wallet, loaded from a JSON wallets file of base58 keys.

use std::{fs, path::Path, str::FromStr, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use serde::Deserialize;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};

use super::{Wallet, WalletAdapter, WalletError};

#[derive(Debug, Deserialize)]
pub struct WalletKeypairEntry {
    pub name: String,
    pub address: String,
    pub private_key_base58: String,
}

pub struct KeypairWallet {
    name: String,
    keypair: Arc<Keypair>,
}

impl KeypairWallet {
    pub fn new(name: impl Into<String>, keypair: Keypair) -> Self {
        Self {
            name: name.into(),
            keypair: Arc::new(keypair),
        }
    }

    pub fn from_entry(entry: &WalletKeypairEntry) -> Result<Self> {
        let private_key_bytes = bs58::decode(&entry.private_key_base58)
            .into_vec()
            .with_context(|| format!("decoding base58 key of `{}`", entry.name))?;
        let keypair = Keypair::from_bytes(&private_key_bytes)
            .map_err(|e| anyhow::anyhow!("invalid keypair for `{}`: {e}", entry.name))?;

        let declared = Pubkey::from_str(&entry.address)
            .with_context(|| format!("parsing address of `{}`", entry.name))?;
        if declared != keypair.pubkey() {
            return Err(WalletError::AddressMismatch {
                name: entry.name.clone(),
                address: entry.address.clone(),
            }
            .into());
        }

        Ok(Self::new(entry.name.clone(), keypair))
    }

    /// Read every entry of a wallets file.
    pub fn load_all<P: AsRef<Path>>(path: P) -> Result<Vec<Self>> {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading wallets file {:?}", path.as_ref()))?;
        let entries: Vec<WalletKeypairEntry> =
            serde_json::from_str(&raw).context("parsing wallets file")?;
        let wallets = entries
            .iter()
            .map(Self::from_entry)
            .collect::<Result<Vec<_>>>()?;
        info!("👛 [WALLET] Loaded {} wallet(s) from {:?}", wallets.len(), path.as_ref());
        Ok(wallets)
    }
}

#[async_trait]
impl Wallet for KeypairWallet {
    fn public_key(&self) -> Option<Pubkey> {
        Some(self.keypair.pubkey())
    }

    async fn sign_transaction(&self, mut tx: Transaction) -> Result<Transaction, WalletError> {
        let blockhash = tx.message.recent_blockhash;
        tx.try_partial_sign(&[self.keypair.as_ref()], blockhash)
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        Ok(tx)
    }

    async fn sign_all_transactions(
        &self,
        txs: Vec<Transaction>,
    ) -> Result<Vec<Transaction>, WalletError> {
        let mut signed = Vec::with_capacity(txs.len());
        for tx in txs {
            signed.push(self.sign_transaction(tx).await?);
        }
        Ok(signed)
    }
}

impl WalletAdapter for KeypairWallet {
    fn name(&self) -> &str {
        &self.name
    }

    fn connected(&self) -> bool {
        true
    }
}
