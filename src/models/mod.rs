pub mod mission;
pub mod transaction;
pub mod user;
pub mod wallet;

pub use mission::{Mission, RewardType};
pub use transaction::{Transaction, TransactionRecord, TransactionStatus, TransactionType};
pub use user::UserProfile;
pub use wallet::{Pocket, Wallet, WalletPatch};
