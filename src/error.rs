use thiserror::Error;

use crate::models::Pocket;

/// Errors returned by ledger operations
///
/// System errors (I/O, CSV, JSON) come from import/export and storage;
/// the remaining variants are business rejections that leave state unchanged.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("insufficient {pocket} balance: requested {requested}, available {available}")]
    InsufficientBalance {
        pocket: Pocket,
        requested: u64,
        available: u64,
    },

    #[error("{pocket} balance would overflow")]
    BalanceOverflow { pocket: Pocket },

    #[error("mission '{0}' not found")]
    MissionNotFound(String),

    #[error("mission '{0}' is not completed")]
    MissionNotCompleted(String),

    #[error("mission '{0}' has already been claimed")]
    MissionAlreadyClaimed(String),

    #[error("invalid storage key '{0}'")]
    InvalidStorageKey(String),

    #[error("ledger state has not been hydrated from storage")]
    NotHydrated,

    #[error("persisted state has schema version {found}, newest supported is {supported}")]
    UnsupportedSchemaVersion { found: u32, supported: u32 },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
