//! Command-line driver for the candy machine mint flow.
//!
//! Usage: cargo run --bin candy-mint -- --settings config/settings.json mint-multiple 3

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use candy_mint_client::{
    config::Settings,
    ledger::{Ledger, RpcLedger},
    mint::{MintOrchestrator, MintReport},
    utils::{balance::BalanceTracker, notify::LogNotifier},
    wallet::WalletConnectionProvider,
};
use clap::{Parser, Subcommand};
use log::info;

#[derive(Parser, Debug)]
#[command(name = "candy-mint", about = "Mint NFTs from a candy machine")]
struct Cli {
    /// Settings file
    #[arg(long, default_value = "config/settings.json")]
    settings: PathBuf,

    /// Wallet to use instead of `active_wallet`
    #[arg(long)]
    wallet: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current mint session state
    State,
    /// Print the wallet balance in SOL
    Balance,
    /// Mint a single item
    Mint,
    /// Mint several items in one signing round
    MintMultiple {
        quantity: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let settings = Settings::load_from_file(&cli.settings)?;
    info!("⚙️ Loaded {:?}", settings);

    let mut provider = WalletConnectionProvider::from_settings(&settings)?;
    if let Some(name) = &cli.wallet {
        provider.select(name)?;
    }
    let wallet = provider
        .active()
        .ok_or_else(|| anyhow!("no wallet selected"))?;

    let ledger: Arc<dyn Ledger> = Arc::new(RpcLedger::new(
        provider.endpoint().to_string(),
        settings.tuning.commitment,
    ));
    let orchestrator = MintOrchestrator::from_settings(
        &settings,
        ledger,
        BalanceTracker::new(),
        Arc::new(LogNotifier),
    );
    orchestrator.on_wallet_changed(Some(wallet)).await?;

    match cli.command {
        Command::State => {
            let session = orchestrator.session().await;
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        Command::Balance => {
            println!("{:.9} SOL", orchestrator.balance().get());
        }
        Command::Mint => report(orchestrator.start_mint().await),
        Command::MintMultiple { quantity } => {
            report(orchestrator.start_mint_multiple(quantity).await)
        }
    }

    Ok(())
}

fn report(outcome: MintReport) {
    match outcome {
        MintReport::Skipped => println!("Mint skipped: wallet or candy machine not ready"),
        MintReport::Completed { succeeded, failed } => {
            println!("Minted {succeeded}, failed {failed}")
        }
        MintReport::Aborted(failure) => println!("Mint aborted: {}", failure.message()),
    }
}
