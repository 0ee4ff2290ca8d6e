//! Signature confirmation polling with a hard wall-clock timeout.

use std::time::{Duration, Instant};

use log::{debug, warn};
use solana_sdk::{
    commitment_config::CommitmentConfig, signature::Signature, transaction::TransactionError,
};
use solana_transaction_status::TransactionStatus;

use crate::ledger::Ledger;

/// Terminal result of waiting on one signature.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfirmationOutcome {
    Confirmed(TransactionStatus),
    Failed(TransactionError),
    TimedOut,
}

impl ConfirmationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ConfirmationOutcome::Confirmed(_))
    }
}

/// Poll `signature` every `poll_interval` until its status reaches
/// `commitment` or reports an error. Never waits past `timeout`.
pub async fn await_transaction_signature_confirmation(
    ledger: &dyn Ledger,
    signature: &Signature,
    timeout: Duration,
    commitment: CommitmentConfig,
    poll_interval: Duration,
) -> ConfirmationOutcome {
    let started = Instant::now();

    let poll = async {
        loop {
            match ledger.get_signature_status(signature).await {
                Ok(Some(status)) => {
                    if let Some(err) = status.err.clone() {
                        return ConfirmationOutcome::Failed(err);
                    }
                    if status.satisfies_commitment(commitment) {
                        return ConfirmationOutcome::Confirmed(status);
                    }
                    debug!("⏳ [CONFIRM] {} seen, below {:?}", signature, commitment.commitment);
                }
                Ok(None) => debug!("⏳ [CONFIRM] {} not seen yet", signature),
                Err(e) => warn!("⚠️ [CONFIRM] Status query for {} failed: {:#}", signature, e),
            }
            tokio::time::sleep(poll_interval).await;
        }
    };

    match tokio::time::timeout(timeout, poll).await {
        Ok(outcome) => {
            debug!(
                "✅ [CONFIRM] {} resolved in {}ms",
                signature,
                started.elapsed().as_millis()
            );
            outcome
        }
        Err(_) => {
            warn!(
                "⏰ [CONFIRM] {} not confirmed within {}ms",
                signature,
                timeout.as_millis()
            );
            ConfirmationOutcome::TimedOut
        }
    }
}
