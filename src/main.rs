//! Token Minter - command line front end
//!
//! Creates Token-2022 mints with on-chain metadata and manages the local
//! record of created tokens.
//!
//! ## Commands
//!
//! - **mint**: create a token and print the structured response
//! - **list**: stored tokens, newest first, optionally by creator
//! - **show**: one stored token
//! - **remove**: delete a stored record

// Compiler warning configuration
#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use token_minter::config::{Config, MintConfig};
use token_minter::metrics::metrics;
use token_minter::rpc_manager::SolanaRpcNetwork;
use token_minter::token_store::{SledTokenStore, TokenStore};
use token_minter::types::{FeeOption, TokenMetadata};
use token_minter::wallet::{KeypairWallet, WalletSigner};
use token_minter::MintEngine;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print Prometheus metrics before exiting
    #[arg(long, global = true)]
    print_metrics: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "MINTER_LOG_JSON")]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new token
    Mint(MintArgs),

    /// List stored tokens
    List {
        /// Only tokens created by this address
        #[arg(long)]
        creator: Option<String>,
    },

    /// Show one stored token
    Show {
        /// Mint address
        mint: String,
    },

    /// Delete a stored token record (the on-chain mint is unaffected)
    Remove {
        /// Mint address
        mint: String,
    },
}

#[derive(clap::Args, Debug)]
struct MintArgs {
    #[arg(long)]
    name: String,

    /// Ticker symbol, at most 10 characters
    #[arg(long)]
    symbol: String,

    #[arg(long)]
    description: Option<String>,

    #[arg(long, default_value_t = 9)]
    decimals: u8,

    /// Total supply in whole tokens
    #[arg(long)]
    supply: u64,

    #[arg(long)]
    image_url: Option<String>,

    /// Revoke mint authority after the initial supply is minted
    #[arg(long)]
    revoke_mint: bool,

    /// Revoke freeze authority
    #[arg(long)]
    revoke_freeze: bool,

    /// paid or donation
    #[arg(long, default_value = "paid")]
    fee: FeeOption,

    /// Sign without asking for approval
    #[arg(long)]
    yes: bool,
}

impl MintArgs {
    fn metadata(&self) -> TokenMetadata {
        TokenMetadata {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            description: self.description.clone(),
            decimals: self.decimals,
            total_supply: self.supply,
            image_url: self.image_url.clone(),
            revoke_mint: self.revoke_mint,
            revoke_freeze: self.revoke_freeze,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.json_logs)?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting token minter");

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;
    let store = Arc::new(
        SledTokenStore::open(&config.store.path)
            .with_context(|| format!("Failed to open token store at {}", config.store.path))?,
    );

    match &args.command {
        Command::Mint(mint_args) => run_mint(&config, store, mint_args).await?,
        Command::List { creator } => {
            let tokens = match creator {
                Some(creator) => store.list_tokens_by_creator(creator).await?,
                None => store.list_tokens().await?,
            };
            println!("{}", serde_json::to_string_pretty(&tokens)?);
        }
        Command::Show { mint } => match store.get_token(mint).await? {
            Some(token) => println!("{}", serde_json::to_string_pretty(&token)?),
            None => anyhow::bail!("No stored token with mint {}", mint),
        },
        Command::Remove { mint } => {
            if store.delete_token(mint).await? {
                info!(mint = %mint, "Token record removed");
            } else {
                warn!(mint = %mint, "No stored token to remove");
            }
        }
    }

    if args.print_metrics {
        print!("{}", metrics().render()?);
    }

    Ok(())
}

async fn run_mint(config: &Config, store: Arc<SledTokenStore>, args: &MintArgs) -> Result<()> {
    let mint_config: MintConfig = config.validate().context("Invalid configuration")?;

    let network = Arc::new(SolanaRpcNetwork::new(
        config.rpc.url.clone(),
        Duration::from_secs(config.rpc.timeout_secs),
        mint_config.commitment,
        Duration::from_millis(config.confirmation.poll_interval_ms),
    ));
    info!(rpc = %network.url(), network = %mint_config.network, "Using RPC endpoint");

    let wallet = match KeypairWallet::from_file(
        &config.wallet.keypair_path,
        config.wallet.require_approval && !args.yes,
    ) {
        Ok(wallet) => {
            info!(wallet = %wallet.pubkey(), "Wallet loaded");
            Some(wallet)
        }
        Err(e) => {
            warn!(error = %e, path = %config.wallet.keypair_path, "No wallet available");
            None
        }
    };

    let engine = MintEngine::new(Arc::new(mint_config), network, store);
    let response = engine
        .create_token(
            wallet.as_ref().map(|w| w as &dyn WalletSigner),
            args.metadata(),
            args.fee,
        )
        .await;

    println!("{}", serde_json::to_string_pretty(&response)?);
    if !response.success {
        anyhow::bail!(response.error.unwrap_or_else(|| "Token creation failed".to_string()));
    }
    Ok(())
}

/// Initialize logging subsystem
fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let env_filter = if verbose {
        "token_minter=debug,info"
    } else {
        "token_minter=info,warn"
    };

    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| {
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
        }))
        .init();

    Ok(())
}
