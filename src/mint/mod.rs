//! Mint orchestrator: drives single and batched candy machine mints to a
//! terminal state and reports the outcome through the notifier.
//!
//! Every attempt ends the same way whatever happened: the balance is
//! refreshed, `is_minting` is cleared and the item counts are re-read.

pub mod errors;
pub mod session;

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use log::{debug, info, warn};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use tokio::sync::{Mutex, RwLock};

use crate::{
    candy::{fetch_candy_machine_state, mint_multiple_tokens, mint_one_token, CandyMachineState},
    config::settings::{CandyAccounts, MintTuning, Settings},
    ledger::Ledger,
    tx::{await_transaction_signature_confirmation, ConfirmationOutcome},
    utils::{
        balance::BalanceTracker,
        notify::{Notifier, ToastOptions, ToastPosition},
    },
    wallet::WalletAdapter,
};

use errors::MintFailure;
pub use session::{ItemCounts, MintReport, MintSession};

pub const MSG_MINT_SUCCEEDED: &str = "Congratulations! Mint succeeded! Check your wallet :)";
pub const MSG_MINT_FAILED: &str = "Mint failed! Please try again!";

pub struct MintOrchestrator {
    ledger: Arc<dyn Ledger>,
    balance: BalanceTracker,
    notifier: Arc<dyn Notifier>,
    accounts: CandyAccounts,
    tuning: MintTuning,
    wallet: RwLock<Option<Arc<dyn WalletAdapter>>>,
    candy: Mutex<Option<CandyMachineState>>,
    session: Mutex<MintSession>,
}

impl MintOrchestrator {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        balance: BalanceTracker,
        notifier: Arc<dyn Notifier>,
        accounts: CandyAccounts,
        tuning: MintTuning,
        session: MintSession,
    ) -> Self {
        Self {
            ledger,
            balance,
            notifier,
            accounts,
            tuning,
            wallet: RwLock::new(None),
            candy: Mutex::new(None),
            session: Mutex::new(session),
        }
    }

    pub fn from_settings(
        settings: &Settings,
        ledger: Arc<dyn Ledger>,
        balance: BalanceTracker,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::new(
            ledger,
            balance,
            notifier,
            settings.accounts.clone(),
            settings.tuning.clone(),
            MintSession::new(settings.default_go_live),
        )
    }

    /// Snapshot of the session state.
    pub async fn session(&self) -> MintSession {
        self.session.lock().await.clone()
    }

    pub fn balance(&self) -> &BalanceTracker {
        &self.balance
    }

    /// Wallet identity changed: refresh the balance and reload the candy
    /// machine handle, sold-out flag, start date and counts.
    pub async fn on_wallet_changed(&self, wallet: Option<Arc<dyn WalletAdapter>>) -> Result<()> {
        *self.wallet.write().await = wallet.clone();
        *self.candy.lock().await = None;

        let Some(wallet) = wallet else {
            return Ok(());
        };
        self.balance
            .on_wallet_changed(self.ledger.as_ref(), wallet.public_key())
            .await?;
        if wallet.public_key().is_none() {
            return Ok(());
        }

        let state =
            fetch_candy_machine_state(self.ledger.as_ref(), wallet.as_ref(), &self.accounts.candy_machine)
                .await?;
        {
            let mut session = self.session.lock().await;
            session.is_sold_out = state.is_sold_out();
            if let Some(go_live) = state.go_live_date {
                session.mint_start_date = go_live;
            }
            session.items = counts_of(&state);
        }
        info!(
            "🍬 [CANDY] Loaded {}: {} of {} remaining",
            state.address, state.items_remaining, state.items_available
        );
        *self.candy.lock().await = Some(state);
        Ok(())
    }

    /// Re-read remaining/redeemed/available. No-op while a mint is in flight.
    pub async fn refresh_counts(&self) -> Result<()> {
        if self.session.lock().await.is_minting {
            return Ok(());
        }
        let Some(wallet) = self.wallet.read().await.clone() else {
            return Ok(());
        };

        let state =
            fetch_candy_machine_state(self.ledger.as_ref(), wallet.as_ref(), &self.accounts.candy_machine)
                .await?;
        self.session.lock().await.items = counts_of(&state);
        if let Some(candy) = self.candy.lock().await.as_mut() {
            *candy = state;
        }
        Ok(())
    }

    /// Mint one item.
    pub async fn start_mint(&self) -> MintReport {
        self.session.lock().await.is_minting = true;
        let report = match self.mint_one().await {
            Ok(report) => report,
            Err(e) => self.report_failure(&e).await,
        };
        self.finish().await;
        report
    }

    /// Mint `quantity` items in one signing round.
    pub async fn start_mint_multiple(&self, quantity: usize) -> MintReport {
        self.session.lock().await.is_minting = true;
        let report = match self.mint_many(quantity).await {
            Ok(report) => report,
            Err(e) => self.report_failure(&e).await,
        };
        self.finish().await;
        report
    }

    /* ------------------------------------------------------------------ */
    /*  internals                                                         */
    /* ------------------------------------------------------------------ */

    /// Connected wallet with a public key plus a loaded candy machine.
    async fn ready(&self) -> Option<(Arc<dyn WalletAdapter>, Pubkey, CandyMachineState)> {
        let wallet = self.wallet.read().await.clone()?;
        if !wallet.connected() {
            return None;
        }
        let owner = wallet.public_key()?;
        let candy = self.candy.lock().await.clone()?;
        Some((wallet, owner, candy))
    }

    async fn mint_one(&self) -> Result<MintReport> {
        let Some((wallet, _owner, candy)) = self.ready().await else {
            warn!("⚠️ [MINT] Wallet or candy machine not ready, skipping");
            return Ok(MintReport::Skipped);
        };

        let signature =
            mint_one_token(self.ledger.as_ref(), wallet.as_ref(), &candy, &self.accounts).await?;
        let outcome = self.confirm(&signature).await;

        if outcome.is_success() {
            info!("✅ [MINT] {} confirmed", signature);
            self.notifier.success(MSG_MINT_SUCCEEDED, ToastOptions::default());
            Ok(MintReport::Completed {
                succeeded: 1,
                failed: 0,
            })
        } else {
            warn!("❌ [MINT] {} did not land: {:?}", signature, outcome);
            self.notifier.error(MSG_MINT_FAILED, ToastOptions::default());
            Ok(MintReport::Completed {
                succeeded: 0,
                failed: 1,
            })
        }
    }

    async fn mint_many(&self, quantity: usize) -> Result<MintReport> {
        let Some((wallet, owner, candy)) = self.ready().await else {
            warn!("⚠️ [MINT] Wallet or candy machine not ready, skipping");
            return Ok(MintReport::Skipped);
        };

        let old_lamports = self.ledger.get_balance(&owner).await?;

        let submitted = mint_multiple_tokens(
            self.ledger.as_ref(),
            wallet.as_ref(),
            &candy,
            &self.accounts,
            quantity,
        )
        .await?;

        let (sent, rejected): (Vec<_>, Vec<_>) = submitted.into_iter().partition(Result::is_ok);
        let signatures: Vec<Signature> = sent.into_iter().filter_map(Result::ok).collect();
        let mut rejected: Vec<anyhow::Error> = rejected.into_iter().filter_map(Result::err).collect();

        // Nothing reached the cluster: surface the reason itself.
        if signatures.is_empty() && !rejected.is_empty() {
            return Err(rejected.swap_remove(0));
        }
        if rejected
            .iter()
            .any(|e| MintFailure::classify(e) == MintFailure::SoldOut)
        {
            warn!("🚫 [MINT] Candy machine reported sold out mid-batch");
            self.session.lock().await.is_sold_out = true;
        }

        let outcomes = join_all(signatures.iter().map(|sig| self.confirm(sig))).await;
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = rejected.len() + (outcomes.len() - succeeded);
        info!(
            "🍬 [MINT] Batch of {}: {} succeeded, {} failed",
            quantity, succeeded, failed
        );

        if succeeded > 0 {
            let spent = Settings::sol_to_lamports(self.tuning.per_item_cost_sol) * succeeded as u64;
            self.wait_for_settlement(&owner, old_lamports.saturating_sub(spent))
                .await;
        }

        let options = ToastOptions::lasting(self.tuning.toast_duration, ToastPosition::BottomCenter);
        if succeeded > 0 {
            self.notifier.success(
                &format!(
                    "Congratulations! {succeeded} mints succeeded! Your NFT's should appear in your wallet soon :)"
                ),
                options,
            );
        }
        if failed > 0 {
            self.notifier.error(
                &format!("Some mints failed! {failed} mints failed! Check your wallet :("),
                options,
            );
        }

        Ok(MintReport::Completed { succeeded, failed })
    }

    async fn confirm(&self, signature: &Signature) -> ConfirmationOutcome {
        await_transaction_signature_confirmation(
            self.ledger.as_ref(),
            signature,
            self.tuning.tx_timeout,
            self.tuning.commitment,
            self.tuning.confirm_poll_interval,
        )
        .await
    }

    /// Fallback wait for the balance to reflect the spend, bounded by
    /// `balance_settle_timeout`.
    async fn wait_for_settlement(&self, owner: &Pubkey, expected: u64) {
        let poll = async {
            loop {
                match self.ledger.get_balance(owner).await {
                    Ok(current) if current <= expected => return current,
                    Ok(current) => debug!(
                        "⏳ [BALANCE] {} lamports, waiting for <= {}",
                        current, expected
                    ),
                    Err(e) => warn!("⚠️ [BALANCE] Query failed: {:#}", e),
                }
                tokio::time::sleep(self.tuning.balance_poll_interval).await;
            }
        };

        match tokio::time::timeout(self.tuning.balance_settle_timeout, poll).await {
            Ok(settled) => debug!("💰 [BALANCE] Settled at {} lamports", settled),
            Err(_) => warn!(
                "⏰ [BALANCE] Did not reach {} lamports within {}ms, continuing",
                expected,
                self.tuning.balance_settle_timeout.as_millis()
            ),
        }
    }

    async fn report_failure(&self, err: &anyhow::Error) -> MintReport {
        let failure = MintFailure::classify(err);
        warn!("❌ [MINT] Attempt failed: {:#}", err);
        if failure == MintFailure::SoldOut {
            self.session.lock().await.is_sold_out = true;
        }
        self.notifier.error(failure.message(), ToastOptions::default());
        MintReport::Aborted(failure)
    }

    async fn finish(&self) {
        let owner = self
            .wallet
            .read()
            .await
            .as_ref()
            .and_then(|w| w.public_key());
        if let Some(owner) = owner {
            if let Err(e) = self.balance.refresh(self.ledger.as_ref(), &owner).await {
                warn!("⚠️ [BALANCE] Refresh after mint failed: {:#}", e);
            }
        }
        self.session.lock().await.is_minting = false;
        if let Err(e) = self.refresh_counts().await {
            warn!("⚠️ [CANDY] Count refresh after mint failed: {:#}", e);
        }
    }
}

fn counts_of(state: &CandyMachineState) -> ItemCounts {
    ItemCounts {
        remaining: state.items_remaining,
        redeemed: state.items_redeemed,
        available: state.items_available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        candy_machine_account, sample_accounts, sample_candy_machine, MockLedger,
        RecordingNotifier, SendBehavior, Toast,
    };
    use crate::wallet::KeypairWallet;
    use chrono::{TimeZone, Utc};
    use solana_sdk::{
        instruction::InstructionError,
        native_token::LAMPORTS_PER_SOL,
        signature::{Keypair, Signer},
        transaction::TransactionError,
    };
    use std::time::Duration;

    const START_LAMPORTS: u64 = 5 * LAMPORTS_PER_SOL;
    const MINT_COST: u64 = 490_000_000;

    struct Harness {
        ledger: Arc<MockLedger>,
        notifier: Arc<RecordingNotifier>,
        orchestrator: Arc<MintOrchestrator>,
        owner: Pubkey,
    }

    fn fast_tuning() -> MintTuning {
        MintTuning {
            tx_timeout: Duration::from_millis(100),
            confirm_poll_interval: Duration::from_millis(5),
            balance_poll_interval: Duration::from_millis(5),
            balance_settle_timeout: Duration::from_millis(100),
            ..MintTuning::default()
        }
    }

    fn harness(available: u64, redeemed: u64) -> Harness {
        let accounts = sample_accounts();
        let ledger = Arc::new(MockLedger::new());
        ledger.set_account(
            accounts.candy_machine,
            candy_machine_account(&sample_candy_machine(available, redeemed, Some(1_640_000_000))),
        );
        ledger.set_mint_cost(MINT_COST);

        let notifier = Arc::new(RecordingNotifier::default());
        let default_go_live = Utc.timestamp_opt(1_639_325_100, 0).unwrap();
        let orchestrator = Arc::new(MintOrchestrator::new(
            ledger.clone(),
            BalanceTracker::new(),
            notifier.clone(),
            accounts,
            fast_tuning(),
            MintSession::new(default_go_live),
        ));

        Harness {
            ledger,
            notifier,
            orchestrator,
            owner: Pubkey::default(),
        }
    }

    async fn connected(available: u64, redeemed: u64) -> Harness {
        let mut h = harness(available, redeemed);
        let keypair = Keypair::new();
        h.owner = keypair.pubkey();
        h.ledger.set_balance(h.owner, START_LAMPORTS);
        let wallet: Arc<dyn WalletAdapter> = Arc::new(KeypairWallet::new("local", keypair));
        h.orchestrator.on_wallet_changed(Some(wallet)).await.unwrap();
        h
    }

    #[tokio::test]
    async fn test_wallet_change_loads_session() {
        let h = connected(100, 40).await;
        let session = h.orchestrator.session().await;
        assert!(!session.is_sold_out);
        assert_eq!(session.mint_start_date.timestamp(), 1_640_000_000);
        assert_eq!(
            session.items,
            ItemCounts {
                remaining: 60,
                redeemed: 40,
                available: 100
            }
        );
        assert_eq!(h.orchestrator.balance().get(), 5.0);
    }

    #[tokio::test]
    async fn test_wallet_change_flags_exhausted_machine() {
        let h = connected(10, 10).await;
        assert!(h.orchestrator.session().await.is_sold_out);
    }

    #[tokio::test]
    async fn test_single_mint_success() {
        let h = connected(100, 40).await;

        let report = h.orchestrator.start_mint().await;
        assert_eq!(
            report,
            MintReport::Completed {
                succeeded: 1,
                failed: 0
            }
        );
        assert_eq!(h.notifier.successes(), vec![MSG_MINT_SUCCEEDED.to_string()]);
        assert!(h.notifier.errors().is_empty());

        let session = h.orchestrator.session().await;
        assert!(!session.is_minting);
        let expected = (START_LAMPORTS - MINT_COST) as f64 / LAMPORTS_PER_SOL as f64;
        assert_eq!(h.orchestrator.balance().get(), expected);
    }

    #[tokio::test]
    async fn test_single_mint_on_chain_error() {
        let h = connected(100, 40).await;
        h.ledger.push_send(SendBehavior::FailOnChain(TransactionError::InstructionError(
            4,
            InstructionError::Custom(0x1),
        )));
        h.ledger.set_balance(h.owner, 4_200_000_000);

        let report = h.orchestrator.start_mint().await;
        assert_eq!(
            report,
            MintReport::Completed {
                succeeded: 0,
                failed: 1
            }
        );
        assert!(h.notifier.successes().is_empty());
        assert_eq!(h.notifier.errors(), vec![MSG_MINT_FAILED.to_string()]);
        assert!(!h.orchestrator.session().await.is_minting);
        assert_eq!(h.orchestrator.balance().get(), 4.2);
    }

    #[tokio::test]
    async fn test_confirmation_timeout_is_failure() {
        let h = connected(100, 40).await;
        h.ledger.push_send(SendBehavior::Silent);

        let report = h.orchestrator.start_mint().await;
        assert_eq!(
            report,
            MintReport::Completed {
                succeeded: 0,
                failed: 1
            }
        );
        assert_eq!(h.notifier.errors(), vec![MSG_MINT_FAILED.to_string()]);
    }

    #[tokio::test]
    async fn test_sold_out_code() {
        let h = connected(100, 40).await;
        h.ledger.push_send(SendBehavior::Reject(311));
        h.ledger.set_balance(h.owner, 4_200_000_000);

        let report = h.orchestrator.start_mint().await;
        assert_eq!(report, MintReport::Aborted(MintFailure::SoldOut));
        assert_eq!(h.notifier.errors(), vec!["SOLD OUT!".to_string()]);

        let session = h.orchestrator.session().await;
        assert!(session.is_sold_out);
        assert!(!session.is_minting);
        assert_eq!(h.orchestrator.balance().get(), 4.2);
    }

    #[tokio::test]
    async fn test_not_live_code() {
        let h = connected(100, 40).await;
        h.ledger.push_send(SendBehavior::Reject(312));

        let report = h.orchestrator.start_mint().await;
        assert_eq!(report, MintReport::Aborted(MintFailure::NotLive));
        assert_eq!(
            h.notifier.errors(),
            vec!["Minting period hasn't started yet.".to_string()]
        );

        let session = h.orchestrator.session().await;
        assert!(!session.is_sold_out);
        assert!(!session.is_minting);
    }

    #[tokio::test]
    async fn test_skipped_without_candy_machine() {
        let h = harness(100, 40);

        let report = h.orchestrator.start_mint().await;
        assert_eq!(report, MintReport::Skipped);
        assert!(h.notifier.toasts().is_empty());
        assert!(h.ledger.sent_transactions().is_empty());
        assert!(!h.orchestrator.session().await.is_minting);
    }

    #[tokio::test]
    async fn test_is_minting_while_in_flight() {
        let h = connected(100, 40).await;
        h.ledger.push_send(SendBehavior::Silent);

        let orchestrator = Arc::clone(&h.orchestrator);
        let handle = tokio::spawn(async move { orchestrator.start_mint().await });

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(h.orchestrator.session().await.is_minting);

        handle.await.unwrap();
        assert!(!h.orchestrator.session().await.is_minting);
    }

    #[tokio::test]
    async fn test_batch_counts_add_up() {
        let h = connected(100, 40).await;
        h.ledger.push_send(SendBehavior::Confirm);
        h.ledger.push_send(SendBehavior::FailOnChain(TransactionError::InstructionError(
            4,
            InstructionError::Custom(0x1),
        )));
        h.ledger.push_send(SendBehavior::Silent);
        h.ledger.push_send(SendBehavior::Confirm);

        let report = h.orchestrator.start_mint_multiple(4).await;
        assert_eq!(
            report,
            MintReport::Completed {
                succeeded: 2,
                failed: 2
            }
        );

        let toasts = h.notifier.toasts();
        assert_eq!(toasts.len(), 2);
        let options = ToastOptions::lasting(Duration::from_millis(6_000), ToastPosition::BottomCenter);
        assert_eq!(
            toasts[0],
            Toast::Success(
                "Congratulations! 2 mints succeeded! Your NFT's should appear in your wallet soon :)"
                    .to_string(),
                options
            )
        );
        assert_eq!(
            toasts[1],
            Toast::Error(
                "Some mints failed! 2 mints failed! Check your wallet :(".to_string(),
                options
            )
        );

        let expected = (START_LAMPORTS - 2 * MINT_COST) as f64 / LAMPORTS_PER_SOL as f64;
        assert_eq!(h.orchestrator.balance().get(), expected);
        assert!(!h.orchestrator.session().await.is_minting);
    }

    #[tokio::test]
    async fn test_batch_all_succeed_single_notification() {
        let h = connected(100, 40).await;

        let report = h.orchestrator.start_mint_multiple(3).await;
        assert_eq!(
            report,
            MintReport::Completed {
                succeeded: 3,
                failed: 0
            }
        );
        assert_eq!(h.notifier.successes().len(), 1);
        assert!(h.notifier.errors().is_empty());
        assert_eq!(h.ledger.sent_transactions().len(), 3);
    }

    #[tokio::test]
    async fn test_batch_partially_rejected_counts_rejections() {
        let h = connected(100, 40).await;
        h.ledger.push_send(SendBehavior::Confirm);
        h.ledger.push_send(SendBehavior::Reject(311));

        let report = h.orchestrator.start_mint_multiple(2).await;
        assert_eq!(
            report,
            MintReport::Completed {
                succeeded: 1,
                failed: 1
            }
        );
        assert_eq!(h.notifier.toasts().len(), 2);
        assert!(h.orchestrator.session().await.is_sold_out);
    }

    #[tokio::test]
    async fn test_batch_fully_rejected_is_classified() {
        let h = connected(100, 40).await;
        h.ledger.push_send(SendBehavior::Reject(311));
        h.ledger.push_send(SendBehavior::Reject(311));

        let report = h.orchestrator.start_mint_multiple(2).await;
        assert_eq!(report, MintReport::Aborted(MintFailure::SoldOut));
        assert_eq!(h.notifier.errors(), vec!["SOLD OUT!".to_string()]);
        assert!(h.orchestrator.session().await.is_sold_out);
    }

    #[tokio::test]
    async fn test_settlement_wait_is_bounded() {
        let h = connected(100, 40).await;
        // Confirmed on chain, but the balance never moves.
        h.ledger.set_mint_cost(0);

        let started = std::time::Instant::now();
        let report = h.orchestrator.start_mint_multiple(1).await;
        assert_eq!(
            report,
            MintReport::Completed {
                succeeded: 1,
                failed: 0
            }
        );
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(h.orchestrator.balance().get(), 5.0);
    }
}
