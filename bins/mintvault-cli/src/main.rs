//! mintvault — publish an encrypted mint-list backup from the command line.
//!
//! Reads the wallet mnemonic from a file (or stdin) so it never appears
//! in the process argument list, publishes the encrypted mint list to the
//! configured relays, and exits nonzero if no relay accepted the event.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use mintvault_core::{derive_seed, BackupKeypair};
use mintvault_relay::{BackupConfig, MintBackup};
use tracing::info;

/// Encrypted mint-list backup over Nostr relays.
#[derive(Parser)]
#[command(name = "mintvault")]
#[command(version, about = "Back up a wallet's mint list as an encrypted relay event")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish the mint list as an encrypted backup event.
    Backup(BackupArgs),
    /// Print the backup public key derived from a mnemonic.
    Pubkey(PubkeyArgs),
}

#[derive(Args)]
struct BackupArgs {
    /// File containing the BIP-39 mnemonic phrase ("-" reads stdin).
    #[arg(long)]
    mnemonic_file: PathBuf,

    /// Mint URL to include in the backup (repeatable).
    #[arg(long = "mint", required = true)]
    mints: Vec<String>,

    /// Relay endpoint to publish to (repeatable; defaults to the
    /// built-in public relay set).
    #[arg(long = "relay")]
    relays: Vec<String>,

    /// Seconds to wait for the slowest relay.
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[derive(Args)]
struct PubkeyArgs {
    /// File containing the BIP-39 mnemonic phrase ("-" reads stdin).
    #[arg(long)]
    mnemonic_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Backup(args) => backup(args).await,
        Commands::Pubkey(args) => pubkey(args),
    }
}

async fn backup(args: BackupArgs) -> Result<()> {
    let mnemonic = read_mnemonic(&args.mnemonic_file)?;

    let mut config = if args.relays.is_empty() {
        BackupConfig::default()
    } else {
        BackupConfig::with_relays(args.relays)
    };
    config.publish_timeout = Duration::from_secs(args.timeout);
    config.overall_timeout = Duration::from_secs(args.timeout);

    let engine = MintBackup::new(config);
    let report = engine
        .publish_mint_backup(&mnemonic, &args.mints)
        .await
        .context("backup aborted before publishing")?;

    println!("event id: {}", report.event_id);
    for endpoint in &report.succeeded {
        println!("  accepted  {endpoint}");
    }
    for outcome in &report.failed {
        println!(
            "  failed    {} ({})",
            outcome.endpoint,
            outcome.reason.as_deref().unwrap_or("unknown")
        );
    }

    if !report.success {
        bail!("no relay accepted the backup");
    }
    info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "backup replicated"
    );
    Ok(())
}

fn pubkey(args: PubkeyArgs) -> Result<()> {
    let mnemonic = read_mnemonic(&args.mnemonic_file)?;
    let seed = derive_seed(&mnemonic, "").context("invalid mnemonic")?;
    let keypair = BackupKeypair::derive(&seed).context("key derivation failed")?;
    println!("{}", keypair.public_key_hex());
    Ok(())
}

fn read_mnemonic(path: &Path) -> Result<String> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read mnemonic from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read mnemonic file '{}'", path.display()))?
    };
    let mnemonic = raw.trim().to_string();
    if mnemonic.is_empty() {
        bail!("mnemonic is empty");
    }
    Ok(mnemonic)
}
