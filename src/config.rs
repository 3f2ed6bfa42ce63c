//! Ledger configuration
//!
//! Defaults describe the demo session; a JSON file named by
//! `WALLET_LEDGER_CONFIG` overrides any subset of them.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::models::{Mission, RewardType, UserProfile, Wallet};

/// Environment variable naming a JSON config file
pub const CONFIG_ENV_VAR: &str = "WALLET_LEDGER_CONFIG";

/// Storage key the persisted blob lives under by default
pub const DEFAULT_STORAGE_KEY: &str = "wallet-storage";

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Key of the persisted state blob
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Simulated processing delay before a confirmed transaction is applied
    #[serde(default = "default_processing_delay_ms")]
    pub processing_delay_ms: u64,

    /// Session created when no persisted state exists
    #[serde(default)]
    pub seed: SeedConfig,

    /// Mission catalog installed at login
    #[serde(default = "default_missions")]
    pub missions: Vec<Mission>,
}

/// Initial user and balances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_user")]
    pub user: UserProfile,

    #[serde(default = "default_wallet")]
    pub wallet: Wallet,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            user: default_user(),
            wallet: default_wallet(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            processing_delay_ms: default_processing_delay_ms(),
            seed: SeedConfig::default(),
            missions: default_missions(),
        }
    }
}

impl LedgerConfig {
    /// Load from the file named by `WALLET_LEDGER_CONFIG`, or fall back to defaults
    pub fn load() -> Result<Self> {
        match env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Load from a JSON file; absent fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading ledger config");
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_processing_delay_ms() -> u64 {
    1500
}

fn default_user() -> UserProfile {
    UserProfile {
        id: "user-001".to_string(),
        name: "Demo User".to_string(),
        email: "demo@example.com".to_string(),
        phone: "+62 812 0000 0000".to_string(),
    }
}

fn default_wallet() -> Wallet {
    Wallet::new(5_000_000, 1_000_000, 2_500_000, 1_250)
}

fn default_missions() -> Vec<Mission> {
    vec![
        Mission::new("daily-login", "Daily check-in", 1, 50, RewardType::Points),
        Mission::new("first-transfer", "Send a transfer", 1, 100, RewardType::Points),
        Mission::new("topup-3x", "Top up three times", 3, 10_000, RewardType::Cashback),
        Mission::new("pay-bills", "Pay a bill", 1, 1, RewardType::Voucher),
    ]
}
