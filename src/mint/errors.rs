//! Mint failure taxonomy and classification of raw errors into
//! user-facing messages.

use solana_client::client_error::ClientError;
use solana_sdk::{instruction::InstructionError, transaction::TransactionError};
use thiserror::Error;

/// Candy machine custom program error codes we map to dedicated messages.
pub const ERR_NOT_ENOUGH_SOL: u32 = 0x135; // 309
pub const ERR_SOLD_OUT: u32 = 0x137; // 311
pub const ERR_NOT_LIVE: u32 = 0x138; // 312

pub const MSG_SOLD_OUT: &str = "SOLD OUT!";
pub const MSG_NOT_LIVE: &str = "Minting period hasn't started yet.";
pub const MSG_INSUFFICIENT_FUNDS: &str = "Insufficient funds to mint. Please fund your wallet.";
pub const MSG_GENERIC: &str = "Minting failed! Please try again!";

/// Errors raised by the mint path itself.
#[derive(Debug, Error)]
pub enum MintError {
    /// The candy machine program rejected the instruction with a custom code.
    #[error("custom program error: {code:#x}")]
    Program { code: u32 },
    #[error("wallet rejected signing: {0}")]
    Signing(String),
    #[error("wallet returned {got} signed transactions, expected {expected}")]
    SignedCountMismatch { expected: usize, got: usize },
}

/// Classified outcome of a failed mint attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MintFailure {
    SoldOut,
    NotLive,
    InsufficientFunds,
    Other(String),
}

impl MintFailure {
    /// Message shown to the user.
    pub fn message(&self) -> &str {
        match self {
            MintFailure::SoldOut => MSG_SOLD_OUT,
            MintFailure::NotLive => MSG_NOT_LIVE,
            MintFailure::InsufficientFunds => MSG_INSUFFICIENT_FUNDS,
            MintFailure::Other(msg) if msg.is_empty() => MSG_GENERIC,
            MintFailure::Other(msg) => msg,
        }
    }

    /// Classify any error surfaced by a mint attempt: numeric code first,
    /// then well-known message fragments, then the raw message.
    pub fn classify(err: &anyhow::Error) -> Self {
        if let Some(code) = program_error_code(err) {
            if let Some(failure) = Self::from_code(code) {
                return failure;
            }
        }
        Self::from_message(&format!("{err:#}"))
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            ERR_SOLD_OUT => Some(MintFailure::SoldOut),
            ERR_NOT_LIVE => Some(MintFailure::NotLive),
            ERR_NOT_ENOUGH_SOL => Some(MintFailure::InsufficientFunds),
            _ => None,
        }
    }

    pub fn from_message(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("0x137") {
            MintFailure::SoldOut
        } else if lower.contains("0x138") {
            MintFailure::NotLive
        } else if lower.contains("0x135")
            || lower.contains("insufficient funds")
            || lower.contains("insufficient lamports")
        {
            MintFailure::InsufficientFunds
        } else {
            MintFailure::Other(message.to_string())
        }
    }
}

/// Digs a custom program error code out of the error chain, if any.
fn program_error_code(err: &anyhow::Error) -> Option<u32> {
    for cause in err.chain() {
        if let Some(MintError::Program { code }) = cause.downcast_ref::<MintError>() {
            return Some(*code);
        }
        if let Some(client_err) = cause.downcast_ref::<ClientError>() {
            if let Some(TransactionError::InstructionError(_, InstructionError::Custom(code))) =
                client_err.get_transaction_error()
            {
                return Some(code);
            }
        }
        if let Some(TransactionError::InstructionError(_, InstructionError::Custom(code))) =
            cause.downcast_ref::<TransactionError>()
        {
            return Some(*code);
        }
    }
    None
}
