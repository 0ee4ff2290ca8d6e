//! Connection provider: the network endpoint plus the wallet adapters the
//! application offers, with one of them selected as active.

use std::sync::Arc;

use anyhow::Result;
use log::info;

use super::{KeypairWallet, WalletAdapter, WalletError};
use crate::config::settings::{Network, Settings};

pub struct WalletConnectionProvider {
    network: Network,
    endpoint: String,
    wallets: Vec<Arc<dyn WalletAdapter>>,
    active: Option<usize>,
}

impl WalletConnectionProvider {
    pub fn new(network: Network, endpoint: String, wallets: Vec<Arc<dyn WalletAdapter>>) -> Self {
        Self {
            network,
            endpoint,
            wallets,
            active: None,
        }
    }

    /// Build from settings, loading every wallet in the wallets file and
    /// selecting `active_wallet`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let wallets = KeypairWallet::load_all(&settings.wallets_file)?
            .into_iter()
            .map(|w| Arc::new(w) as Arc<dyn WalletAdapter>)
            .collect();
        let mut provider = Self::new(settings.network, settings.endpoint(), wallets);
        provider.select(&settings.active_wallet)?;
        Ok(provider)
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn wallets(&self) -> &[Arc<dyn WalletAdapter>] {
        &self.wallets
    }

    /// Make the named adapter the active one.
    pub fn select(&mut self, name: &str) -> Result<Arc<dyn WalletAdapter>, WalletError> {
        let idx = self
            .wallets
            .iter()
            .position(|w| w.name() == name)
            .ok_or_else(|| WalletError::UnknownWallet(name.to_string()))?;
        self.active = Some(idx);
        info!("👛 [WALLET] Selected `{}` on {}", name, self.network);
        Ok(Arc::clone(&self.wallets[idx]))
    }

    pub fn active(&self) -> Option<Arc<dyn WalletAdapter>> {
        self.active.map(|idx| Arc::clone(&self.wallets[idx]))
    }
}
