use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// One of the four balances held by a wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pocket {
    Main,
    Market,
    Savings,
    Points,
}

impl fmt::Display for Pocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pocket::Main => "main",
            Pocket::Market => "market",
            Pocket::Savings => "savings",
            Pocket::Points => "points",
        };
        f.write_str(name)
    }
}

/// Multi-balance wallet state
///
/// Monetary balances are in the smallest IDR unit; points are loyalty units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub balance_main: u64,
    pub balance_market: u64,
    pub balance_savings: u64,
    pub balance_points: u64,
}

impl Wallet {
    /// Create a wallet with the given balances
    pub fn new(main: u64, market: u64, savings: u64, points: u64) -> Self {
        Self {
            balance_main: main,
            balance_market: market,
            balance_savings: savings,
            balance_points: points,
        }
    }

    /// Read a single balance
    pub fn balance(&self, pocket: Pocket) -> u64 {
        match pocket {
            Pocket::Main => self.balance_main,
            Pocket::Market => self.balance_market,
            Pocket::Savings => self.balance_savings,
            Pocket::Points => self.balance_points,
        }
    }

    fn balance_mut(&mut self, pocket: Pocket) -> &mut u64 {
        match pocket {
            Pocket::Main => &mut self.balance_main,
            Pocket::Market => &mut self.balance_market,
            Pocket::Savings => &mut self.balance_savings,
            Pocket::Points => &mut self.balance_points,
        }
    }

    /// Sum of the monetary balances (main + market + savings)
    ///
    /// Saturates instead of overflowing; points are not money and are excluded.
    pub fn total_funds(&self) -> u64 {
        self.balance_main
            .saturating_add(self.balance_market)
            .saturating_add(self.balance_savings)
    }

    /// Add funds to a pocket
    /// Fails without touching the wallet if the balance would overflow
    pub fn credit(&mut self, pocket: Pocket, amount: u64) -> Result<()> {
        let balance = self.balance_mut(pocket);
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { pocket })?;
        Ok(())
    }

    /// Remove funds from a pocket
    /// Fails without touching the wallet if the pocket holds less than `amount`
    pub fn debit(&mut self, pocket: Pocket, amount: u64) -> Result<()> {
        let balance = self.balance_mut(pocket);
        if *balance < amount {
            return Err(LedgerError::InsufficientBalance {
                pocket,
                requested: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        Ok(())
    }

    /// Move funds between two pockets; either both sides apply or neither does
    pub fn move_funds(&mut self, from: Pocket, to: Pocket, amount: u64) -> Result<()> {
        let mut next = *self;
        next.debit(from, amount)?;
        next.credit(to, amount)?;
        *self = next;
        Ok(())
    }

    /// Overwrite the fields named by `patch`, keeping the rest
    pub fn apply_patch(&mut self, patch: &WalletPatch) {
        if let Some(main) = patch.balance_main {
            self.balance_main = main;
        }
        if let Some(market) = patch.balance_market {
            self.balance_market = market;
        }
        if let Some(savings) = patch.balance_savings {
            self.balance_savings = savings;
        }
        if let Some(points) = patch.balance_points {
            self.balance_points = points;
        }
    }
}

/// Partial wallet update: every present field replaces the current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_main: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_market: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_savings: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_points: Option<u64>,
}

impl WalletPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn main(mut self, value: u64) -> Self {
        self.balance_main = Some(value);
        self
    }

    pub fn market(mut self, value: u64) -> Self {
        self.balance_market = Some(value);
        self
    }

    pub fn savings(mut self, value: u64) -> Self {
        self.balance_savings = Some(value);
        self
    }

    pub fn points(mut self, value: u64) -> Self {
        self.balance_points = Some(value);
        self
    }

    /// True when the patch names no field
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
