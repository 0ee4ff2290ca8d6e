// App-specific modules
pub mod candy;
pub mod config;
pub mod ledger;
pub mod mint;
pub mod tx;
pub mod utils;
pub mod wallet;

#[cfg(test)]
mod testing;
