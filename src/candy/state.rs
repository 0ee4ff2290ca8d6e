//! Candy machine account decoding and availability reads.

use anyhow::{Context, Result};
use borsh::{BorshDeserialize, BorshSerialize};
use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use super::CANDY_MACHINE_DISCRIMINATOR;
use crate::{ledger::Ledger, wallet::Wallet};

#[derive(Debug, Error)]
pub enum CandyStateError {
    #[error("wallet has no public key")]
    NoWallet,
    #[error("account {0} is not a candy machine")]
    WrongDiscriminator(Pubkey),
    #[error("go-live timestamp {0} is out of range")]
    BadGoLive(i64),
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CandyMachineData {
    pub uuid: String,
    pub price: u64,
    pub items_available: u64,
    pub go_live_date: Option<i64>,
}

/// On-chain candy machine account (v1 layout, after the discriminator).
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CandyMachine {
    pub authority: Pubkey,
    pub wallet: Pubkey,
    pub token_mint: Option<Pubkey>,
    pub config: Pubkey,
    pub data: CandyMachineData,
    pub items_redeemed: u64,
    pub bump: u8,
}

impl CandyMachine {
    /// Decode raw account data. Trailing padding is ignored.
    pub fn decode(address: &Pubkey, data: &[u8]) -> Result<Self> {
        if data.len() < 8 || data[..8] != CANDY_MACHINE_DISCRIMINATOR {
            return Err(CandyStateError::WrongDiscriminator(*address).into());
        }
        let mut body = &data[8..];
        CandyMachine::deserialize(&mut body)
            .with_context(|| format!("decoding candy machine {address}"))
    }
}

/// Loaded handle plus derived availability.
#[derive(Clone, Debug)]
pub struct CandyMachineState {
    pub address: Pubkey,
    pub candy_machine: CandyMachine,
    pub items_available: u64,
    pub items_redeemed: u64,
    pub items_remaining: u64,
    /// `None` when the machine has no go-live date set.
    pub go_live_date: Option<DateTime<Utc>>,
}

impl CandyMachineState {
    pub fn is_sold_out(&self) -> bool {
        self.items_remaining == 0
    }
}

/// Fetch and decode the candy machine at `address` on behalf of `wallet`.
pub async fn fetch_candy_machine_state<W: Wallet + ?Sized>(
    ledger: &dyn Ledger,
    wallet: &W,
    address: &Pubkey,
) -> Result<CandyMachineState> {
    if wallet.public_key().is_none() {
        return Err(CandyStateError::NoWallet.into());
    }

    let data = ledger.get_account_data(address).await?;
    let candy_machine = CandyMachine::decode(address, &data)?;

    let items_available = candy_machine.data.items_available;
    let items_redeemed = candy_machine.items_redeemed;
    let items_remaining = items_available.saturating_sub(items_redeemed);
    let go_live_date = candy_machine
        .data
        .go_live_date
        .map(|ts| {
            Utc.timestamp_opt(ts, 0)
                .single()
                .ok_or(CandyStateError::BadGoLive(ts))
        })
        .transpose()?;

    debug!(
        "🍬 [CANDY] {}: {}/{} redeemed, {} remaining",
        address, items_redeemed, items_available, items_remaining
    );

    Ok(CandyMachineState {
        address: *address,
        candy_machine,
        items_available,
        items_redeemed,
        items_remaining,
        go_live_date,
    })
}
