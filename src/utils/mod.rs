pub mod balance;
pub mod notify;
