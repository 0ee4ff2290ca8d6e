//! Transaction lifecycle helpers.

pub mod confirm;

pub use confirm::{await_transaction_signature_confirmation, ConfirmationOutcome};
