use serde::{Deserialize, Serialize};

/// What a mission pays out on claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardType {
    /// Credited to the points balance
    Points,
    /// Credited to the main balance and recorded as a cashback transaction
    Cashback,
    /// Granted outside the wallet; no balance changes
    Voucher,
}

/// Gamification unit tracked against a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    pub title: String,
    pub progress: u32,
    pub target: u32,
    pub is_completed: bool,
    pub is_claimed: bool,
    pub reward: u64,
    pub reward_type: RewardType,
}

impl Mission {
    /// Create a fresh, unstarted mission
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        target: u32,
        reward: u64,
        reward_type: RewardType,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            progress: 0,
            target,
            is_completed: false,
            is_claimed: false,
            reward,
            reward_type,
        }
    }

    /// Advance progress, saturating at the target
    /// Returns true if this step completed the mission
    pub fn advance(&mut self, step: u32) -> bool {
        let was_completed = self.is_completed;
        self.progress = self.progress.saturating_add(step).min(self.target);
        if self.progress >= self.target {
            self.is_completed = true;
        }
        !was_completed && self.is_completed
    }

    /// Completed and not yet claimed
    pub fn is_claimable(&self) -> bool {
        self.is_completed && !self.is_claimed
    }

    /// Back to the unstarted state
    pub fn reset(&mut self) {
        self.progress = 0;
        self.is_completed = false;
        self.is_claimed = false;
    }
}
