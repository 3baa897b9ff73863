//! Command-line front end for `ember-wallet` (§6: "CLI argument parsing" is
//! out of scope for the core, but a thin binary needs to exist to drive it).

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ember_rpc::DaemonClient;

mod commands;

/// A light wallet for CryptoNote-family chains.
#[derive(Parser)]
#[command(name = "ember-wallet-cli")]
#[command(about = "Command-line light wallet")]
#[command(version)]
pub struct Cli {
    /// Wallet file path.
    #[arg(long, default_value = "wallet.db")]
    pub wallet_file: PathBuf,

    /// Remote daemon RPC URL.
    #[arg(long, default_value = "http://127.0.0.1:17767")]
    pub remote_daemon: String,

    /// Block height to begin scanning from when creating/restoring a
    /// wallet (0 scans from genesis).
    #[arg(long, default_value = "0")]
    pub scan_height: u64,

    /// Worker thread count for the sync coordinator (defaults to
    /// available parallelism).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Read the wallet password from this environment variable instead
    /// of prompting interactively.
    #[arg(long)]
    pub password_env: Option<String>,

    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a brand-new wallet file.
    Create,
    /// Open an existing wallet file.
    Open,
    /// Restore a wallet from a 25-word mnemonic seed.
    ImportSeed {
        #[arg(long)]
        seed: String,
    },
    /// Restore a wallet from explicit spend/view secret keys (hex).
    ImportKeys {
        #[arg(long)]
        spend_key: String,
        #[arg(long)]
        view_key: String,
    },
    /// Restore a view-only wallet from a view secret key and address.
    ImportView {
        #[arg(long)]
        view_key: String,
        #[arg(long)]
        address: String,
    },
}

fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&cli.log_level);
    if let Some(path) = &cli.log_file {
        if let Ok(file) = std::fs::OpenOptions::new().create(true).append(true).open(path) {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
    }
    let _ = builder.try_init();
}

fn read_password(cli: &Cli) -> std::io::Result<String> {
    if let Some(var) = &cli.password_env {
        if let Ok(value) = std::env::var(var) {
            return Ok(value);
        }
    }
    rpassword::prompt_password("wallet password: ")
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let password = match read_password(&cli) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: could not read password: {e}");
            std::process::exit(1);
        }
    };

    let daemon = DaemonClient::new(cli.remote_daemon.clone());

    let result = match &cli.command {
        Commands::Create => commands::run_create(&cli, password, daemon).await,
        Commands::Open => commands::run_open(&cli, password, daemon).await,
        Commands::ImportSeed { seed } => commands::run_import_seed(&cli, password, daemon, seed.clone()).await,
        Commands::ImportKeys { spend_key, view_key } => {
            commands::run_import_keys(&cli, password, daemon, spend_key.clone(), view_key.clone()).await
        }
        Commands::ImportView { view_key, address } => {
            commands::run_import_view(&cli, password, daemon, view_key.clone(), address.clone()).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(match e {
            ember_wallet::WalletError::InvalidAddress(_)
            | ember_wallet::WalletError::InvalidMnemonic(_)
            | ember_wallet::WalletError::InvalidPaymentId => 1,
            ember_wallet::WalletError::BadMagic
            | ember_wallet::WalletError::DecryptionFailed
            | ember_wallet::WalletError::UnsupportedVersion(_)
            | ember_wallet::WalletError::CorruptFile(_) => 2,
            ember_wallet::WalletError::Rpc(_) => 3,
            _ => 1,
        });
    }
}
