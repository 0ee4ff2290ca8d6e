//! UI-visible mint session state.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ItemCounts {
    pub remaining: u64,
    pub redeemed: u64,
    pub available: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MintSession {
    pub is_minting: bool,
    /// Sticky once a sold-out error has been observed.
    pub is_sold_out: bool,
    pub mint_start_date: DateTime<Utc>,
    pub items: ItemCounts,
}

impl MintSession {
    pub fn new(mint_start_date: DateTime<Utc>) -> Self {
        Self {
            is_minting: false,
            is_sold_out: false,
            mint_start_date,
            items: ItemCounts::default(),
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now >= self.mint_start_date
    }
}

/// What a mint call ended with, in addition to the notifications it raised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MintReport {
    /// Preconditions unmet; nothing was submitted.
    Skipped,
    Completed { succeeded: usize, failed: usize },
    Aborted(super::errors::MintFailure),
}
