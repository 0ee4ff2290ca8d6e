//! Shared wallet balance cell.
//!
//! A single last-write-wins value in SOL, handed explicitly to every
//! component that reads or refreshes it. Readers can either snapshot the
//! current value or subscribe for updates.

use anyhow::Result;
use log::info;
use solana_sdk::{native_token::LAMPORTS_PER_SOL, pubkey::Pubkey};
use tokio::sync::watch;

use crate::ledger::Ledger;

#[derive(Clone, Debug)]
pub struct BalanceTracker {
    cell: std::sync::Arc<watch::Sender<f64>>,
}

impl Default for BalanceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0.0);
        Self {
            cell: std::sync::Arc::new(tx),
        }
    }

    /// Current balance in SOL.
    pub fn get(&self) -> f64 {
        *self.cell.borrow()
    }

    pub fn set(&self, sol: f64) {
        self.cell.send_replace(sol);
    }

    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.cell.subscribe()
    }

    /// Query the ledger and publish the result. Returns the new value.
    pub async fn refresh(&self, ledger: &dyn Ledger, owner: &Pubkey) -> Result<f64> {
        let sol = query_balance_sol(ledger, owner).await?;
        self.set(sol);
        Ok(sol)
    }

    /// Wallet identity changed: refresh when there is an identity to query.
    pub async fn on_wallet_changed(&self, ledger: &dyn Ledger, owner: Option<Pubkey>) -> Result<()> {
        if let Some(owner) = owner {
            let sol = self.refresh(ledger, &owner).await?;
            info!("💰 [BALANCE] {} holds {:.4} SOL", owner, sol);
        }
        Ok(())
    }
}

/// One balance query, converted from lamports to SOL.
pub async fn query_balance_sol(ledger: &dyn Ledger, owner: &Pubkey) -> Result<f64> {
    let lamports = ledger.get_balance(owner).await?;
    Ok(lamports as f64 / LAMPORTS_PER_SOL as f64)
}
