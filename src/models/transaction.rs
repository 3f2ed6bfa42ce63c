use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of balance-affecting event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Topup,
    Transfer,
    Payment,
    Withdraw,
    Pulsa,
    Bills,
    Food,
    Crypto,
    Cashback,
    Reward,
}

/// Settlement status, fixed when the record is created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Success,
    Pending,
    Failed,
}

/// Immutable record of one balance-affecting event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    /// Negative = debit, positive = credit
    pub amount: i64,
    pub fee: u64,
    pub status: TransactionStatus,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a successful transaction stamped with the current time
    pub fn new(
        user_id: impl Into<String>,
        tx_type: TransactionType,
        amount: i64,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Self::generate_id(now),
            user_id: user_id.into(),
            tx_type,
            amount,
            fee: 0,
            status: TransactionStatus::Success,
            description: description.into(),
            created_at: now,
        }
    }

    pub fn with_fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    /// Timestamp-based identifier (`TX<epoch millis>`)
    ///
    /// Not collision-proof: two records created in the same millisecond share an id.
    pub fn generate_id(at: DateTime<Utc>) -> String {
        format!("TX{}", at.timestamp_millis())
    }

    pub fn is_debit(&self) -> bool {
        self.amount < 0
    }

    /// Net effect on the main balance once the fee is charged
    pub fn net_amount(&self) -> i128 {
        i128::from(self.amount) - i128::from(self.fee)
    }
}

/// Transaction row from CSV input
#[derive(Debug, Deserialize)]
pub struct TransactionRecord {
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub user: String,
    pub tx: String,
    pub amount: i64,
    #[serde(default)]
    pub fee: Option<u64>,
    #[serde(default)]
    pub status: Option<TransactionStatus>,
    #[serde(default)]
    pub description: String,
}

impl TransactionRecord {
    /// Build the ledger record; empty fee and status default to `0` and `success`
    pub fn into_transaction(self, created_at: DateTime<Utc>) -> Transaction {
        Transaction {
            id: self.tx,
            user_id: self.user,
            tx_type: self.tx_type,
            amount: self.amount,
            fee: self.fee.unwrap_or(0),
            status: self.status.unwrap_or_default(),
            description: self.description,
            created_at,
        }
    }
}
