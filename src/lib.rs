pub mod concurrent_ledger;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod persistence;
pub mod persistent_ledger;

use std::io::{Read, Write};

use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use config::LedgerConfig;
use error::Result;
use ledger::WalletLedger;
use models::TransactionRecord;

/// Outcome of a CSV import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows settled and recorded
    pub applied: usize,
    /// Well-formed rows the ledger refused (e.g. insufficient balance)
    pub rejected: usize,
    /// Rows that could not be parsed
    pub malformed: usize,
}

/// Seed a ledger from the default config, import transactions from a CSV
/// reader, and write the resulting wallet to a CSV writer
pub fn process_transactions<R: Read, W: Write>(reader: R, writer: W) -> Result<()> {
    let mut ledger = WalletLedger::from_config(&LedgerConfig::default());
    import_transactions(&mut ledger, reader)?;
    write_wallet(&ledger, writer)?;
    Ok(())
}

/// Apply every CSV row to the ledger in file order
///
/// Malformed and rejected rows are logged and skipped; they never abort the import.
pub fn import_transactions<R: Read>(ledger: &mut WalletLedger, reader: R) -> Result<ImportSummary> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut summary = ImportSummary::default();

    for (line, result) in csv_reader.deserialize::<TransactionRecord>().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                warn!(row = line + 1, "skipping malformed transaction row: {}", err);
                summary.malformed += 1;
                continue;
            }
        };

        match ledger.apply_transaction(record.into_transaction(Utc::now())) {
            Ok(_) => summary.applied += 1,
            Err(_) => summary.rejected += 1,
        }
    }

    Ok(summary)
}

// Wallet row for CSV output, with the computed monetary total
#[derive(Serialize)]
struct WalletRow<'a> {
    user: &'a str,
    main: u64,
    market: u64,
    savings: u64,
    points: u64,
    total: u64,
}

/// Write the wallet as a single CSV row
pub fn write_wallet<W: Write>(ledger: &WalletLedger, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let wallet = ledger.wallet();
    csv_writer.serialize(WalletRow {
        user: ledger.user().map_or("", |u| u.id.as_str()),
        main: wallet.balance_main,
        market: wallet.balance_market,
        savings: wallet.balance_savings,
        points: wallet.balance_points,
        total: wallet.total_funds(),
    })?;

    csv_writer.flush()?;
    Ok(())
}

// Transaction row for statement output
#[derive(Serialize)]
struct StatementRow<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    tx_type: models::TransactionType,
    amount: i64,
    fee: u64,
    status: models::TransactionStatus,
    description: &'a str,
    created_at: String,
}

/// Write the transaction history as CSV, newest first
pub fn write_statement<W: Write>(ledger: &WalletLedger, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for tx in ledger.transactions() {
        csv_writer.serialize(StatementRow {
            id: &tx.id,
            tx_type: tx.tx_type,
            amount: tx.amount,
            fee: tx.fee,
            status: tx.status,
            description: &tx.description,
            created_at: tx.created_at.to_rfc3339(),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}
