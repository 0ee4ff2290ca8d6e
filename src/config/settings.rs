//! Runtime configuration loader and common helpers.

use std::{fmt, fs, path::Path, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    native_token::LAMPORTS_PER_SOL,
    pubkey::Pubkey,
};

/// ------------------------------------------------------------------
/// Cluster selection
/// ------------------------------------------------------------------
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    MainnetBeta,
    Testnet,
    Devnet,
}

impl Network {
    /// Public cluster API URL for this network.
    pub fn cluster_url(&self) -> &'static str {
        match self {
            Network::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Network::Testnet => "https://api.testnet.solana.com",
            Network::Devnet => "https://api.devnet.solana.com",
        }
    }
}

impl FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mainnet-beta" | "mainnet" => Ok(Network::MainnetBeta),
            "testnet" => Ok(Network::Testnet),
            "devnet" => Ok(Network::Devnet),
            other => Err(anyhow!("unknown network `{other}`")),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::MainnetBeta => "mainnet-beta",
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
        };
        f.write_str(name)
    }
}

/// ------------------------------------------------------------------
/// Deployment-specific candy machine accounts
/// ------------------------------------------------------------------
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandyAccounts {
    /// Receives mint payments.
    pub treasury: Pubkey,
    /// Candy machine config account (holds the item lines).
    pub config: Pubkey,
    /// The candy machine account itself.
    pub candy_machine: Pubkey,
}

/// ------------------------------------------------------------------
/// Mint tuning shared with the orchestrator
/// ------------------------------------------------------------------
#[derive(Clone, Debug)]
pub struct MintTuning {
    pub tx_timeout: Duration,
    pub commitment: CommitmentConfig,
    pub confirm_poll_interval: Duration,
    /// Heuristic SOL spent per item, used to estimate the settled balance.
    pub per_item_cost_sol: f64,
    pub balance_poll_interval: Duration,
    pub balance_settle_timeout: Duration,
    pub toast_duration: Duration,
}

impl Default for MintTuning {
    fn default() -> Self {
        #[allow(deprecated)]
        let commitment = CommitmentConfig {
            commitment: CommitmentLevel::SingleGossip,
        };
        Self {
            tx_timeout: Duration::from_millis(30_000),
            commitment,
            confirm_poll_interval: Duration::from_millis(2_000),
            per_item_cost_sol: 0.49,
            balance_poll_interval: Duration::from_millis(1_000),
            balance_settle_timeout: Duration::from_millis(60_000),
            toast_duration: Duration::from_millis(6_000),
        }
    }
}

/// ------------------------------------------------------------------
/// Main Settings object
/// ------------------------------------------------------------------
#[derive(Clone)]
pub struct Settings {
    /* -------- infrastructure ------------------------ */
    pub network: Network,
    /// Explicit RPC endpoint; falls back to the cluster URL when empty.
    pub rpc_url: Option<String>,

    /* -------- wallets ------------------------------- */
    pub wallets_file: PathBuf,
    pub active_wallet: String,

    /* -------- on-chain accounts --------------------- */
    pub accounts: CandyAccounts,

    /* -------- mint tuning --------------------------- */
    pub tuning: MintTuning,
    /// Shown until the first candy machine read replaces it.
    pub default_go_live: DateTime<Utc>,
}

impl Settings {
    /// --------------------------------------------------------------
    /// Read `settings.json` from disk.
    /// --------------------------------------------------------------
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading settings file {:?}", path.as_ref()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("parsing settings file {:?}", path.as_ref()))
    }

    /// --------------------------------------------------------------
    /// Load settings from default config/settings.json file.
    /// --------------------------------------------------------------
    pub fn load() -> Result<Self> {
        Self::load_from_file("config/settings.json")
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_str(raw)?;

        /* -------- plain strings ---------------------------------- */
        let network = json["network"]
            .as_str()
            .unwrap_or("mainnet-beta")
            .parse::<Network>()?;
        let rpc_url = json["rpc_url"]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());
        let wallets_file = json["wallets_file"]
            .as_str()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./wallets.json"));
        let active_wallet = json["active_wallet"]
            .as_str()
            .unwrap_or("Default")
            .to_string();

        /* -------- program accounts (required) -------------------- */
        let accounts = CandyAccounts {
            treasury: required_pubkey(&json, "treasury")?,
            config: required_pubkey(&json, "config")?,
            candy_machine: required_pubkey(&json, "candy_machine")?,
        };

        /* -------- numeric parameters ----------------------------- */
        let defaults = MintTuning::default();
        let millis = |key: &str, fallback: Duration| {
            json[key]
                .as_u64()
                .map(Duration::from_millis)
                .unwrap_or(fallback)
        };

        let commitment = match json["commitment"].as_str() {
            Some(level) => CommitmentConfig {
                commitment: CommitmentLevel::from_str(level)
                    .map_err(|_| anyhow!("unknown commitment level `{level}`"))?,
            },
            None => defaults.commitment,
        };

        let tuning = MintTuning {
            tx_timeout: millis("tx_timeout_ms", defaults.tx_timeout),
            commitment,
            confirm_poll_interval: millis("confirm_poll_interval_ms", defaults.confirm_poll_interval),
            per_item_cost_sol: json["per_item_cost_sol"]
                .as_f64()
                .unwrap_or(defaults.per_item_cost_sol),
            balance_poll_interval: millis("balance_poll_interval_ms", defaults.balance_poll_interval),
            balance_settle_timeout: millis("balance_settle_timeout_ms", defaults.balance_settle_timeout),
            toast_duration: millis("toast_duration_ms", defaults.toast_duration),
        };

        let go_live_secs = json["default_go_live"].as_i64().unwrap_or(1_639_325_100);
        let default_go_live = Utc
            .timestamp_opt(go_live_secs, 0)
            .single()
            .ok_or_else(|| anyhow!("default_go_live {go_live_secs} is out of range"))?;

        Ok(Self {
            network,
            rpc_url,
            wallets_file,
            active_wallet,
            accounts,
            tuning,
            default_go_live,
        })
    }

    /// RPC endpoint the client should talk to.
    pub fn endpoint(&self) -> String {
        self.rpc_url
            .clone()
            .unwrap_or_else(|| self.network.cluster_url().to_string())
    }

    /// --------------------------------------------------------------
    /// Helper: convert SOL → lamports and round to nearest integer.
    /// --------------------------------------------------------------
    pub fn sol_to_lamports(sol: f64) -> u64 {
        (sol * LAMPORTS_PER_SOL as f64).round() as u64
    }
}

fn required_pubkey(json: &serde_json::Value, key: &str) -> Result<Pubkey> {
    let raw = json[key]
        .as_str()
        .ok_or_else(|| anyhow!("missing `{key}` address"))?;
    Pubkey::from_str(raw).with_context(|| format!("invalid `{key}` address {raw}"))
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("network", &self.network)
            .field("endpoint", &self.endpoint())
            .field("active_wallet", &self.active_wallet)
            .field("candy_machine", &self.accounts.candy_machine)
            .finish_non_exhaustive()
    }
}
