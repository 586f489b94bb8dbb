use clap::{Parser, Subcommand};
use ember_types::{NetworkRegistry, DEFAULT_NETWORK};
use ember_wallet::{FileStore, Session, SessionConfig, Store, CURRENT_NETWORK_KEY};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod commands;

/// Ember wallet command-line interface.
#[derive(Parser)]
#[command(name = "ember-wallet-cli")]
#[command(about = "Command-line wallet for Ethereum-compatible networks")]
#[command(version)]
struct Cli {
    /// Network to use (persisted as the active network).
    #[arg(long)]
    network: Option<String>,

    /// JSON-RPC endpoint (overrides the default for the active network).
    #[arg(long)]
    rpc: Option<String>,

    /// Wallet data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Blocks scanned by `sync` (defaults to 1000).
    #[arg(long)]
    window: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new wallet with a fresh 12-word seed phrase.
    Create {
        /// Replace an existing wallet.
        #[arg(long)]
        force: bool,
    },

    /// Restore a wallet from a seed phrase.
    Restore {
        /// Replace an existing wallet.
        #[arg(long)]
        force: bool,
    },

    /// Show address, network, and balance.
    Info,

    /// Show the balance on the active network.
    Balance,

    /// Send native currency.
    Send {
        /// Recipient address (0x + 40 hex).
        #[arg(long)]
        to: String,

        /// Amount in display units (e.g., "0.05").
        #[arg(long)]
        amount: String,
    },

    /// Show transaction history for the active network.
    History {
        /// Maximum number of entries to show.
        #[arg(long, default_value = "25")]
        limit: usize,

        /// Include every network.
        #[arg(long)]
        all: bool,
    },

    /// Scan recent blocks for transfers.
    Sync,

    /// List known networks.
    Networks,

    /// Change the active network.
    Switch {
        /// Network key (see `networks`).
        network: String,
    },

    /// Look up a transaction by hash.
    Check {
        hash: String,
    },
}

/// Application context shared across commands.
pub struct AppContext {
    data_dir: PathBuf,
    session: Session,
}

impl AppContext {
    async fn from_cli(cli: &Cli) -> Result<Self, Box<dyn std::error::Error>> {
        let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
        let store = Arc::new(FileStore::open(&data_dir)?);

        let mut registry = NetworkRegistry::builtin();
        if let Some(url) = &cli.rpc {
            let key = match &cli.network {
                Some(key) => key.clone(),
                None => store
                    .get(CURRENT_NETWORK_KEY)?
                    .and_then(|b| String::from_utf8(b).ok())
                    .unwrap_or_else(|| DEFAULT_NETWORK.to_string()),
            };
            registry = registry.with_endpoint(&key, url)?;
        }

        let mut config = SessionConfig::default();
        if let Some(window) = cli.window {
            config.reconcile_window = window;
        }

        let session = Session::open(store, registry, config)?;
        if let Some(key) = &cli.network {
            if session.active_network().key != *key {
                session.switch_network(key).await?;
            }
        }
        Ok(Self { data_dir, session })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ember")
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let ctx = match AppContext::from_cli(&cli).await {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Create { force } => commands::create_wallet(&ctx, force).await,
        Commands::Restore { force } => commands::restore_wallet(&ctx, force).await,
        Commands::Info => commands::wallet_info(&ctx).await,
        Commands::Balance => commands::show_balance(&ctx).await,
        Commands::Send { to, amount } => commands::send(&ctx, &to, &amount).await,
        Commands::History { limit, all } => commands::show_history(&ctx, limit, all).await,
        Commands::Sync => commands::sync_history(&ctx).await,
        Commands::Networks => commands::list_networks(&ctx),
        Commands::Switch { network } => commands::switch_network(&ctx, &network).await,
        Commands::Check { hash } => commands::check_transaction(&ctx, &hash).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
