//! Subcommand bodies. Each function opens or creates a wallet, starts
//! background sync, prints a short status line, then waits for Ctrl-C
//! before saving and shutting down cleanly.

use std::path::PathBuf;
use std::sync::Arc;

use ember_rpc::DaemonClient;
use ember_wallet::{Wallet, WalletError};

use crate::Cli;

pub async fn run_create(cli: &Cli, password: String, daemon: DaemonClient) -> Result<(), WalletError> {
    let wallet = Wallet::create_new(cli.wallet_file.clone(), password, daemon)?;
    println!("created wallet: {}", wallet.primary_address());
    if let Ok(seed) = wallet.mnemonic_seed() {
        println!("seed (write this down, it will not be shown again):");
        println!("{seed}");
    }
    run_wallet(cli, wallet).await
}

pub async fn run_open(cli: &Cli, password: String, daemon: DaemonClient) -> Result<(), WalletError> {
    let wallet = Wallet::open(cli.wallet_file.clone(), password, daemon)?;
    println!("opened wallet: {}", wallet.primary_address());
    run_wallet(cli, wallet).await
}

pub async fn run_import_seed(
    cli: &Cli,
    password: String,
    daemon: DaemonClient,
    seed: String,
) -> Result<(), WalletError> {
    let wallet = Wallet::import_from_seed(cli.wallet_file.clone(), password, daemon, &seed, cli.scan_height)?;
    println!("restored wallet: {}", wallet.primary_address());
    run_wallet(cli, wallet).await
}

pub async fn run_import_keys(
    cli: &Cli,
    password: String,
    daemon: DaemonClient,
    spend_key: String,
    view_key: String,
) -> Result<(), WalletError> {
    let spend_secret = parse_key_hex(&spend_key)?;
    let view_secret = parse_key_hex(&view_key)?;
    let wallet = Wallet::import_from_keys(
        cli.wallet_file.clone(),
        password,
        daemon,
        &spend_secret,
        &view_secret,
        cli.scan_height,
    )?;
    println!("restored wallet: {}", wallet.primary_address());
    run_wallet(cli, wallet).await
}

pub async fn run_import_view(
    cli: &Cli,
    password: String,
    daemon: DaemonClient,
    view_key: String,
    address: String,
) -> Result<(), WalletError> {
    let view_secret = parse_key_hex(&view_key)?;
    let wallet = Wallet::import_view_only(
        cli.wallet_file.clone(),
        password,
        daemon,
        &view_secret,
        &address,
        cli.scan_height,
    )?;
    println!("restored view-only wallet: {}", wallet.primary_address());
    run_wallet(cli, wallet).await
}

fn parse_key_hex(s: &str) -> Result<[u8; 32], WalletError> {
    let bytes = hex::decode(s).map_err(|e| WalletError::Other(format!("invalid hex key: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| WalletError::Other("key must be 32 bytes (64 hex chars)".into()))
}

/// Start background sync, print periodic status until interrupted, then
/// shut down and persist.
async fn run_wallet(cli: &Cli, wallet: Wallet) -> Result<(), WalletError> {
    wallet.start_sync(cli.threads, false);
    let wallet = Arc::new(wallet);

    let printer = {
        let wallet = Arc::clone(&wallet);
        tokio::spawn(async move {
            loop {
                let (local, network) = wallet.sync_status();
                let (unlocked, locked) = wallet.balance(None).unwrap_or((0, 0));
                println!("height {local}/{network}  balance {unlocked} ({locked} locked)");
                tokio::time::sleep(std::time::Duration::from_secs(10)).await;
            }
        })
    };

    let _ = tokio::signal::ctrl_c().await;
    printer.abort();

    log::info!("shutting down");
    wallet.stop_sync();
    wallet.save()
}
