use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::ledger::WalletLedger;
use crate::models::{Transaction, Wallet};
use crate::persistence::StorageBackend;
use crate::persistent_ledger::PersistentLedger;

/// Clonable async handle to one persistent ledger
///
/// Every mutation runs under a single write lock, so a balance check and the
/// debit it guards can never interleave with another mutation. Two
/// "confirm" clicks racing on the same funds cannot both succeed.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use wallet_ledger::concurrent_ledger::SharedLedger;
/// use wallet_ledger::models::{Transaction, TransactionType};
/// use wallet_ledger::persistence::MemoryStorage;
/// use wallet_ledger::persistent_ledger::PersistentLedger;
///
/// #[tokio::main]
/// async fn main() {
///     let ledger = PersistentLedger::hydrate(MemoryStorage::new(), "wallet-storage").unwrap();
///     let shared = SharedLedger::new(ledger, Duration::from_millis(1500));
///
///     let handle = shared.clone_handle();
///     tokio::spawn(async move {
///         let tx = Transaction::new("user-001", TransactionType::Topup, 100_000, "Top up");
///         // Waits out the processing delay, then settles atomically
///         handle.confirm(tx).await
///     });
/// }
/// ```
///
/// # Cancellation
///
/// Dropping a `confirm` future while it is still in its processing delay
/// cancels the transaction; nothing has been applied at that point.
pub struct SharedLedger<S: StorageBackend> {
    inner: Arc<RwLock<PersistentLedger<S>>>,
    processing_delay: Duration,
}

impl<S: StorageBackend> SharedLedger<S> {
    /// Wrap a persistent ledger
    ///
    /// # Arguments
    ///
    /// * `ledger` - Hydrated ledger to share
    /// * `processing_delay` - Simulated wait before `confirm` applies a transaction
    pub fn new(ledger: PersistentLedger<S>, processing_delay: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
            processing_delay,
        }
    }

    /// Confirm a transaction after the processing delay
    ///
    /// The balance check and the settlement happen inside one write lock.
    pub async fn confirm(&self, tx: Transaction) -> Result<Wallet> {
        if !self.processing_delay.is_zero() {
            tokio::time::sleep(self.processing_delay).await;
        }

        let mut ledger = self.inner.write().await;
        debug!(tx_id = %tx.id, "confirming transaction");
        ledger.apply_transaction(tx)
    }

    /// Run an arbitrary mutation under the write lock, persisting on success
    pub async fn mutate<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut WalletLedger) -> Result<T>,
    {
        let mut ledger = self.inner.write().await;
        ledger.mutate(f)
    }

    /// Pay out a completed mission exactly once
    pub async fn claim_mission_reward(&self, mission_id: &str) -> Result<Wallet> {
        self.mutate(|ledger| ledger.claim_mission_reward(mission_id))
            .await
    }

    /// Current balances (read lock)
    pub async fn wallet(&self) -> Wallet {
        *self.inner.read().await.ledger().wallet()
    }

    /// Copy of the history, newest first (read lock)
    pub async fn transactions(&self) -> Vec<Transaction> {
        self.inner
            .read()
            .await
            .ledger()
            .transactions()
            .cloned()
            .collect()
    }

    /// Run a read-only closure against the ledger
    pub async fn read<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&WalletLedger) -> T,
    {
        let ledger = self.inner.read().await;
        f(ledger.ledger())
    }

    /// Clone handle for sharing across tasks
    ///
    /// Cheap: clones the `Arc`, not the ledger.
    pub fn clone_handle(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            processing_delay: self.processing_delay,
        }
    }

    pub fn processing_delay(&self) -> Duration {
        self.processing_delay
    }
}
