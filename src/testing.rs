//! In-memory doubles shared by the unit tests.

use std::{
    collections::{HashMap, VecDeque},
    str::FromStr,
    sync::Mutex,
};

use async_trait::async_trait;
use borsh::BorshSerialize;
use solana_sdk::{
    hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction,
    transaction::TransactionError,
};
use solana_transaction_status::{TransactionConfirmationStatus, TransactionStatus};

use crate::{
    candy::{
        state::{CandyMachine, CandyMachineData},
        CandyMachineState, CANDY_MACHINE_DISCRIMINATOR,
    },
    config::settings::CandyAccounts,
    ledger::Ledger,
    mint::errors::MintError,
    utils::notify::{Notifier, ToastOptions},
};

pub fn sample_accounts() -> CandyAccounts {
    CandyAccounts {
        treasury: Pubkey::from_str("3CvojwmDB5BgrU2uKCzyn5we4g7zuHNcWwjyawy4g549").unwrap(),
        config: Pubkey::from_str("3MKAv72pP6Y5G6BsKiuNbMHqCrRAVPK9H9NaPhNyhQZg").unwrap(),
        candy_machine: Pubkey::from_str("BeDaPLdxG2en2jy8qRF1p7Jene7PSDHZiLi61z9efukj").unwrap(),
    }
}

pub fn sample_candy_machine(available: u64, redeemed: u64, go_live: Option<i64>) -> CandyMachine {
    let accounts = sample_accounts();
    CandyMachine {
        authority: Pubkey::new_unique(),
        wallet: accounts.treasury,
        token_mint: None,
        config: accounts.config,
        data: CandyMachineData {
            uuid: "3MKAv7".to_string(),
            price: 490_000_000,
            items_available: available,
            go_live_date: go_live,
        },
        items_redeemed: redeemed,
        bump: 254,
    }
}

/// Raw account bytes: discriminator followed by the borsh body.
pub fn candy_machine_account(cm: &CandyMachine) -> Vec<u8> {
    let mut data = CANDY_MACHINE_DISCRIMINATOR.to_vec();
    cm.serialize(&mut data).unwrap();
    data
}

pub fn sample_state(accounts: &CandyAccounts, available: u64, redeemed: u64) -> CandyMachineState {
    CandyMachineState {
        address: accounts.candy_machine,
        candy_machine: sample_candy_machine(available, redeemed, None),
        items_available: available,
        items_redeemed: redeemed,
        items_remaining: available.saturating_sub(redeemed),
        go_live_date: None,
    }
}

pub fn confirmed_status(err: Option<TransactionError>) -> TransactionStatus {
    TransactionStatus {
        slot: 1,
        confirmations: None,
        status: match &err {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        },
        err,
        confirmation_status: Some(TransactionConfirmationStatus::Confirmed),
    }
}

/// What the ledger does with the next submitted transaction.
#[derive(Clone, Debug)]
pub enum SendBehavior {
    /// Accept and confirm; debits the configured mint cost from the payer.
    Confirm,
    /// Accept, then report an on-chain error.
    FailOnChain(TransactionError),
    /// Reject at submission with a candy machine program error code.
    Reject(u32),
    /// Accept and never report a status.
    Silent,
}

#[derive(Default)]
struct Inner {
    balances: HashMap<Pubkey, u64>,
    accounts: HashMap<Pubkey, Vec<u8>>,
    /// Status plus the number of polls still answered with `None`.
    statuses: HashMap<Signature, (TransactionStatus, usize)>,
    sent: Vec<Transaction>,
    send_plan: VecDeque<SendBehavior>,
    mint_cost: u64,
}

#[derive(Default)]
pub struct MockLedger {
    inner: Mutex<Inner>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, owner: Pubkey, lamports: u64) {
        self.inner.lock().unwrap().balances.insert(owner, lamports);
    }

    pub fn set_account(&self, address: Pubkey, data: Vec<u8>) {
        self.inner.lock().unwrap().accounts.insert(address, data);
    }

    pub fn set_status(&self, signature: Signature, status: TransactionStatus) {
        self.set_status_after(signature, status, 0);
    }

    pub fn set_status_after(&self, signature: Signature, status: TransactionStatus, hidden_polls: usize) {
        self.inner
            .lock()
            .unwrap()
            .statuses
            .insert(signature, (status, hidden_polls));
    }

    /// Lamports debited from the fee payer per confirmed mint.
    pub fn set_mint_cost(&self, lamports: u64) {
        self.inner.lock().unwrap().mint_cost = lamports;
    }

    pub fn push_send(&self, behavior: SendBehavior) {
        self.inner.lock().unwrap().send_plan.push_back(behavior);
    }

    pub fn sent_transactions(&self) -> Vec<Transaction> {
        self.inner.lock().unwrap().sent.clone()
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn get_balance(&self, pubkey: &Pubkey) -> anyhow::Result<u64> {
        Ok(self.inner.lock().unwrap().balances.get(pubkey).copied().unwrap_or(0))
    }

    async fn get_account_data(&self, pubkey: &Pubkey) -> anyhow::Result<Vec<u8>> {
        self.inner
            .lock()
            .unwrap()
            .accounts
            .get(pubkey)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("AccountNotFound: pubkey={pubkey}"))
    }

    async fn get_latest_blockhash(&self) -> anyhow::Result<Hash> {
        Ok(Hash::new_unique())
    }

    async fn get_minimum_balance_for_rent_exemption(&self, _data_len: usize) -> anyhow::Result<u64> {
        Ok(1_461_600)
    }

    async fn send_transaction(&self, tx: &Transaction) -> anyhow::Result<Signature> {
        let mut inner = self.inner.lock().unwrap();
        let behavior = inner.send_plan.pop_front().unwrap_or(SendBehavior::Confirm);
        if let SendBehavior::Reject(code) = behavior {
            return Err(MintError::Program { code }.into());
        }

        let signature = tx.signatures[0];
        inner.sent.push(tx.clone());
        match behavior {
            SendBehavior::Confirm => {
                let payer = tx.message.account_keys[0];
                let cost = inner.mint_cost;
                let balance = inner.balances.entry(payer).or_insert(0);
                *balance = balance.saturating_sub(cost);
                inner.statuses.insert(signature, (confirmed_status(None), 0));
            }
            SendBehavior::FailOnChain(err) => {
                inner.statuses.insert(signature, (confirmed_status(Some(err)), 0));
            }
            SendBehavior::Silent | SendBehavior::Reject(_) => {}
        }
        Ok(signature)
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> anyhow::Result<Option<TransactionStatus>> {
        let mut inner = self.inner.lock().unwrap();
        match inner.statuses.get_mut(signature) {
            Some((_, hidden)) if *hidden > 0 => {
                *hidden -= 1;
                Ok(None)
            }
            Some((status, _)) => Ok(Some(status.clone())),
            None => Ok(None),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Toast {
    Success(String, ToastOptions),
    Error(String, ToastOptions),
}

#[derive(Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.toasts()
            .into_iter()
            .filter_map(|t| match t {
                Toast::Success(msg, _) => Some(msg),
                Toast::Error(..) => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.toasts()
            .into_iter()
            .filter_map(|t| match t {
                Toast::Error(msg, _) => Some(msg),
                Toast::Success(..) => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str, options: ToastOptions) {
        self.toasts
            .lock()
            .unwrap()
            .push(Toast::Success(message.to_string(), options));
    }

    fn error(&self, message: &str, options: ToastOptions) {
        self.toasts
            .lock()
            .unwrap()
            .push(Toast::Error(message.to_string(), options));
    }
}
