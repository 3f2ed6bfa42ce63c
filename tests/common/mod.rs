#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use tracing_subscriber::fmt::MakeWriter;
use wallet_ledger::ledger::WalletLedger;
use wallet_ledger::models::{
    Mission, RewardType, Transaction, TransactionStatus, TransactionType, UserProfile, Wallet,
};

/// Helper to create a transaction with all fields and a fixed timestamp
pub fn make_transaction(
    id: &str,
    tx_type: TransactionType,
    amount: i64,
    fee: u64,
    status: TransactionStatus,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        user_id: "user-001".to_string(),
        tx_type,
        amount,
        fee,
        status,
        description: format!("{:?} {}", tx_type, id),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
    }
}

/// Helper to create a successful payment (debit) without fee
pub fn make_payment(id: &str, amount: u64) -> Transaction {
    make_transaction(
        id,
        TransactionType::Payment,
        -(amount as i64),
        0,
        TransactionStatus::Success,
    )
}

/// Helper to create a successful top-up (credit) without fee
pub fn make_topup(id: &str, amount: u64) -> Transaction {
    make_transaction(
        id,
        TransactionType::Topup,
        amount as i64,
        0,
        TransactionStatus::Success,
    )
}

/// Ledger signed in as `user-001` with the given main balance and nothing else
pub fn seeded_ledger(main: u64) -> WalletLedger {
    let mut ledger = WalletLedger::new();
    ledger.login(
        UserProfile::new("user-001", "Test User"),
        Wallet::new(main, 0, 0, 0),
    );
    ledger
}

/// Mission that is already completed and waiting to be claimed
pub fn completed_mission(id: &str, reward: u64, reward_type: RewardType) -> Mission {
    let mut mission = Mission::new(id, format!("Mission {}", id), 1, reward, reward_type);
    mission.advance(1);
    mission
}

/// Process a CSV string through the default pipeline and return the output
pub fn process_csv_string(csv_input: &str) -> Result<String, Box<dyn std::error::Error>> {
    let mut output = Vec::new();
    wallet_ledger::process_transactions(csv_input.as_bytes(), &mut output)?;
    Ok(String::from_utf8(output)?)
}

/// Create a test CSV from (type, user, tx, amount, fee, status, description) rows
pub fn build_csv(rows: &[(&str, &str, &str, i64, &str, &str, &str)]) -> String {
    let mut csv = String::from("type,user,tx,amount,fee,status,description\n");

    for (tx_type, user, tx, amount, fee, status, description) in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            tx_type, user, tx, amount, fee, status, description
        ));
    }

    csv
}

/// Assert that the wallet CSV output has the expected balances
pub fn assert_wallet_row(
    output: &str,
    user: &str,
    main: u64,
    market: u64,
    savings: u64,
    points: u64,
) {
    let total = main + market + savings;
    let expected = format!(
        "{},{},{},{},{},{}",
        user, main, market, savings, points, total
    );

    assert!(
        output.lines().any(|line| line == expected),
        "Expected wallet row {}\nActual output:\n{}",
        expected,
        output
    );
}

/// Shared buffer that collects formatted log lines
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with warnings routed into a buffer; returns `f`'s result and the captured log
pub fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_payment_is_debit() {
        let tx = make_payment("TX1", 500);
        assert_eq!(tx.amount, -500);
        assert!(tx.is_debit());
        assert_eq!(tx.status, TransactionStatus::Success);
    }

    #[test]
    fn test_build_csv() {
        let csv = build_csv(&[
            ("topup", "user-001", "TX1", 1000, "", "", "Top up"),
            ("payment", "user-001", "TX2", -400, "25", "success", "Coffee"),
        ]);

        assert!(csv.starts_with("type,user,tx,amount,fee,status,description\n"));
        assert!(csv.contains("topup,user-001,TX1,1000,,,Top up"));
        assert!(csv.contains("payment,user-001,TX2,-400,25,success,Coffee"));
    }
}
