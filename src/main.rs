use std::env;
use std::fs::File;
use std::io;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wallet_ledger::config::LedgerConfig;
use wallet_ledger::import_transactions;
use wallet_ledger::persistence::{FileStorage, MemoryStorage, StorageBackend};
use wallet_ledger::persistent_ledger::PersistentLedger;
use wallet_ledger::write_wallet;

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the CSV output
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    anyhow::ensure!(
        args.len() == 2 || args.len() == 3,
        "Usage: {} <input.csv> [state-dir]",
        args.first().map_or("wallet-ledger", String::as_str)
    );

    let config = LedgerConfig::load().context("Failed to load ledger configuration")?;

    let filename = &args[1];
    let input = File::open(filename)
        .with_context(|| format!("Failed to open input file '{}'", filename))?;

    match args.get(2) {
        Some(dir) => {
            let storage = FileStorage::new(dir)
                .with_context(|| format!("Failed to open state directory '{}'", dir))?;
            run(storage, &config, input)
        }
        None => run(MemoryStorage::new(), &config, input),
    }
}

fn run<S: StorageBackend>(storage: S, config: &LedgerConfig, input: File) -> Result<()> {
    let mut ledger = PersistentLedger::hydrate(storage, config.storage_key.as_str())
        .context("Failed to hydrate persisted ledger state")?;

    if !ledger.ledger().is_authenticated() {
        ledger
            .mutate(|l| {
                l.login(config.seed.user.clone(), config.seed.wallet);
                l.set_missions(config.missions.clone());
                Ok(())
            })
            .context("Failed to start seed session")?;
    }

    let summary = ledger
        .mutate(|l| import_transactions(l, input))
        .context("Failed to import transactions")?;

    info!(
        applied = summary.applied,
        rejected = summary.rejected,
        malformed = summary.malformed,
        "import finished"
    );

    write_wallet(ledger.ledger(), io::stdout()).context("Failed to write wallet output")?;

    Ok(())
}
