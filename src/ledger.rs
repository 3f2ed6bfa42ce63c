use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::models::{
    Mission, Pocket, RewardType, Transaction, TransactionStatus, TransactionType, UserProfile,
    Wallet, WalletPatch,
};

/// User id stamped on ledger-generated records when nobody is signed in
const GUEST_USER_ID: &str = "guest";

/// Serializable copy of the whole ledger state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub user: Option<UserProfile>,
    pub wallet: Option<Wallet>,
    #[serde(default)]
    pub is_authenticated: bool,
    /// Newest first
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub missions: Vec<Mission>,
}

/// Single-owner wallet state container
///
/// Every mutation takes `&mut self`, so exactly one writer exists at a time.
/// Share it across tasks through [`crate::concurrent_ledger::SharedLedger`].
#[derive(Debug, Clone, Default)]
pub struct WalletLedger {
    user: Option<UserProfile>,
    authenticated: bool,
    wallet: Wallet,
    /// Newest first
    transactions: VecDeque<Transaction>,
    /// Every id in `transactions`
    seen_ids: HashSet<String>,
    missions: Vec<Mission>,
}

impl WalletLedger {
    /// Create an empty, signed-out ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger signed in with the configured seed user, wallet and missions
    pub fn from_config(config: &LedgerConfig) -> Self {
        let mut ledger = Self::new();
        ledger.login(config.seed.user.clone(), config.seed.wallet);
        ledger.set_missions(config.missions.clone());
        ledger
    }

    /// Rebuild a ledger from a persisted snapshot
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        let seen_ids = snapshot.transactions.iter().map(|tx| tx.id.clone()).collect();
        Self {
            user: snapshot.user,
            authenticated: snapshot.is_authenticated,
            wallet: snapshot.wallet.unwrap_or_default(),
            transactions: snapshot.transactions.into(),
            seen_ids,
            missions: snapshot.missions,
        }
    }

    /// Capture the current state for persistence
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            user: self.user.clone(),
            wallet: Some(self.wallet),
            is_authenticated: self.authenticated,
            transactions: self.transactions.iter().cloned().collect(),
            missions: self.missions.clone(),
        }
    }

    // ---- session ----

    /// Start a session with seed balances
    pub fn login(&mut self, user: UserProfile, seed: Wallet) {
        info!(user_id = %user.id, "session started");
        self.user = Some(user);
        self.authenticated = true;
        self.wallet = seed;
    }

    /// End the session: profile, balances, history and mission progress are dropped
    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!(user_id = %user.id, "session ended");
        }
        self.authenticated = false;
        self.wallet = Wallet::default();
        self.transactions.clear();
        self.seen_ids.clear();
        self.reset_daily_missions();
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    fn user_id(&self) -> &str {
        self.user.as_ref().map_or(GUEST_USER_ID, |u| u.id.as_str())
    }

    // ---- wallet ----

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    /// Overwrite the balances named by `patch`; nothing is validated or conserved
    pub fn update_wallet(&mut self, patch: WalletPatch) -> Wallet {
        self.wallet.apply_patch(&patch);
        debug!(?patch, "wallet patched");
        self.wallet
    }

    /// Add loyalty points
    pub fn add_points(&mut self, amount: u64) -> Result<Wallet> {
        self.credit(Pocket::Points, amount)
    }

    /// Add funds to a pocket
    pub fn credit(&mut self, pocket: Pocket, amount: u64) -> Result<Wallet> {
        self.wallet.credit(pocket, amount)?;
        Ok(self.wallet)
    }

    /// Check the balance and remove funds in one step
    pub fn debit(&mut self, pocket: Pocket, amount: u64) -> Result<Wallet> {
        if let Err(err) = self.wallet.debit(pocket, amount) {
            warn!(%pocket, amount, "debit rejected: {}", err);
            return Err(err);
        }
        Ok(self.wallet)
    }

    /// Move funds between pockets; both sides apply or neither does
    pub fn move_funds(&mut self, from: Pocket, to: Pocket, amount: u64) -> Result<Wallet> {
        self.wallet.move_funds(from, to, amount)?;
        debug!(%from, %to, amount, "funds moved");
        Ok(self.wallet)
    }

    // ---- transactions ----

    /// Prepend a record to the history without touching any balance
    ///
    /// Duplicate ids are accepted.
    pub fn add_transaction(&mut self, tx: Transaction) {
        if !self.seen_ids.insert(tx.id.clone()) {
            warn!(tx_id = %tx.id, "recording transaction with duplicate id");
        }
        self.transactions.push_front(tx);
    }

    /// Settle a transaction against the main balance and record it
    ///
    /// Successful records move `amount - fee` in or out of the main balance;
    /// pending and failed records are stored without moving funds. A rejected
    /// settlement records nothing.
    pub fn apply_transaction(&mut self, tx: Transaction) -> Result<Wallet> {
        if tx.status == TransactionStatus::Success {
            self.settle(&tx)?;
        }
        debug!(tx_id = %tx.id, tx_type = ?tx.tx_type, amount = tx.amount, "transaction applied");
        self.add_transaction(tx);
        Ok(self.wallet)
    }

    fn settle(&mut self, tx: &Transaction) -> Result<()> {
        let net = tx.net_amount();

        // A net debit beyond u64 can never be covered; report it as u64::MAX requested
        let result = match u64::try_from(net.unsigned_abs()) {
            Ok(magnitude) if net < 0 => self.wallet.debit(Pocket::Main, magnitude),
            Ok(magnitude) => self.wallet.credit(Pocket::Main, magnitude),
            Err(_) if net < 0 => Err(LedgerError::InsufficientBalance {
                pocket: Pocket::Main,
                requested: u64::MAX,
                available: self.wallet.balance_main,
            }),
            Err(_) => Err(LedgerError::BalanceOverflow {
                pocket: Pocket::Main,
            }),
        };

        if let Err(err) = &result {
            warn!(tx_id = %tx.id, user_id = %tx.user_id, "rejecting transaction: {}", err);
        }
        result
    }

    /// History, newest first
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Whether any record carries this id
    pub fn contains_transaction(&self, id: &str) -> bool {
        self.seen_ids.contains(id)
    }

    /// Most recent record with the given id
    pub fn find_transaction(&self, id: &str) -> Option<&Transaction> {
        if !self.seen_ids.contains(id) {
            return None;
        }
        self.transactions.iter().find(|tx| tx.id == id)
    }

    // ---- missions ----

    /// Replace the mission list
    pub fn set_missions(&mut self, missions: Vec<Mission>) {
        self.missions = missions;
    }

    pub fn missions(&self) -> &[Mission] {
        &self.missions
    }

    pub fn mission(&self, id: &str) -> Option<&Mission> {
        self.missions.iter().find(|m| m.id == id)
    }

    /// Completed missions that still have a reward to claim
    pub fn claimable_missions(&self) -> impl Iterator<Item = &Mission> {
        self.missions.iter().filter(|m| m.is_claimable())
    }

    /// Points that claiming every claimable points mission would credit
    pub fn pending_reward_points(&self) -> u64 {
        self.claimable_missions()
            .filter(|m| m.reward_type == RewardType::Points)
            .fold(0u64, |acc, m| acc.saturating_add(m.reward))
    }

    /// Advance a mission's progress
    pub fn record_mission_progress(&mut self, mission_id: &str, step: u32) -> Result<Mission> {
        let mission = self
            .missions
            .iter_mut()
            .find(|m| m.id == mission_id)
            .ok_or_else(|| LedgerError::MissionNotFound(mission_id.to_string()))?;

        if mission.advance(step) {
            info!(mission_id, "mission completed");
        }
        Ok(mission.clone())
    }

    /// Pay out a completed mission exactly once
    pub fn claim_mission_reward(&mut self, mission_id: &str) -> Result<Wallet> {
        let index = self
            .missions
            .iter()
            .position(|m| m.id == mission_id)
            .ok_or_else(|| LedgerError::MissionNotFound(mission_id.to_string()))?;

        let mission = &self.missions[index];
        if mission.is_claimed {
            warn!(mission_id, "ignoring repeated mission claim");
            return Err(LedgerError::MissionAlreadyClaimed(mission_id.to_string()));
        }
        if !mission.is_completed {
            return Err(LedgerError::MissionNotCompleted(mission_id.to_string()));
        }

        let reward = mission.reward;
        let reward_type = mission.reward_type;
        let title = mission.title.clone();

        match reward_type {
            RewardType::Points => {
                self.wallet.credit(Pocket::Points, reward)?;
            }
            RewardType::Cashback => {
                let amount = i64::try_from(reward).map_err(|_| LedgerError::BalanceOverflow {
                    pocket: Pocket::Main,
                })?;
                self.wallet.credit(Pocket::Main, reward)?;
                let record = Transaction::new(
                    self.user_id(),
                    TransactionType::Cashback,
                    amount,
                    format!("Mission reward: {}", title),
                );
                self.add_transaction(record);
            }
            RewardType::Voucher => {}
        }

        self.missions[index].is_claimed = true;
        info!(mission_id, reward, ?reward_type, "mission reward claimed");
        Ok(self.wallet)
    }

    /// Put every mission back to its unstarted state
    pub fn reset_daily_missions(&mut self) {
        for mission in &mut self.missions {
            mission.reset();
        }
    }
}
