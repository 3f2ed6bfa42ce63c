use tracing::{debug, info};

use crate::error::{LedgerError, Result};
use crate::ledger::WalletLedger;
use crate::models::{Transaction, Wallet};
use crate::persistence::{PersistedState, StorageBackend, SCHEMA_VERSION};

/// Ledger whose state survives restarts through a storage backend
///
/// # Persistence Pattern
///
/// 1. **Hydrate**: on startup the blob under the storage key is read and the
///    ledger is rebuilt from it
/// 2. **Mutate**: every change goes through [`PersistentLedger::mutate`]
/// 3. **Persist**: a successful mutation writes the full snapshot back;
///    a rejected one writes nothing
///
/// # Example
///
/// ```
/// use wallet_ledger::models::{Pocket, UserProfile, Wallet};
/// use wallet_ledger::persistence::MemoryStorage;
/// use wallet_ledger::persistent_ledger::PersistentLedger;
///
/// let mut ledger = PersistentLedger::hydrate(MemoryStorage::new(), "wallet-storage").unwrap();
/// assert!(ledger.has_hydrated());
///
/// ledger
///     .mutate(|l| {
///         l.login(UserProfile::new("u1", "Ana"), Wallet::new(1000, 0, 0, 0));
///         l.debit(Pocket::Main, 400)
///     })
///     .unwrap();
///
/// assert_eq!(ledger.ledger().wallet().balance_main, 600);
/// assert_eq!(ledger.storage().write_count(), 1);
/// ```
///
/// # Thread Safety
///
/// PersistentLedger is NOT thread-safe by itself. Share it across tasks with
/// [`crate::concurrent_ledger::SharedLedger`].
pub struct PersistentLedger<S: StorageBackend> {
    ledger: WalletLedger,
    storage: S,
    key: String,
    hydrated: bool,
}

impl<S: StorageBackend> PersistentLedger<S> {
    /// Create an unhydrated ledger over `storage`
    ///
    /// Mutations are refused until [`PersistentLedger::rehydrate`] has loaded
    /// whatever is stored under `key`.
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            ledger: WalletLedger::new(),
            storage,
            key: key.into(),
            hydrated: false,
        }
    }

    /// Create a ledger and load the blob under `key`
    pub fn hydrate(storage: S, key: impl Into<String>) -> Result<Self> {
        let mut ledger = Self::new(storage, key);
        ledger.rehydrate()?;
        Ok(ledger)
    }

    /// Rebuild the in-memory state from storage
    ///
    /// A missing blob yields an empty, signed-out ledger. A blob written by a
    /// newer schema is refused rather than misread, and the ledger stays
    /// unhydrated.
    pub fn rehydrate(&mut self) -> Result<()> {
        self.ledger = match self.storage.get_item(&self.key)? {
            Some(raw) => {
                let persisted: PersistedState = serde_json::from_str(&raw)?;
                if persisted.version > SCHEMA_VERSION {
                    return Err(LedgerError::UnsupportedSchemaVersion {
                        found: persisted.version,
                        supported: SCHEMA_VERSION,
                    });
                }
                info!(
                    key = %self.key,
                    version = persisted.version,
                    transactions = persisted.state.transactions.len(),
                    "hydrated ledger state"
                );
                WalletLedger::from_snapshot(persisted.state)
            }
            None => {
                info!(key = %self.key, "no persisted ledger state, starting fresh");
                WalletLedger::new()
            }
        };
        self.hydrated = true;
        Ok(())
    }

    /// Whether persisted state has been loaded and the ledger is usable
    pub fn has_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Run a mutation and persist the result if it succeeds
    ///
    /// The closure works on a copy: if it fails, or if persisting fails, the
    /// ledger keeps its previous state. Refused with `NotHydrated` until
    /// stored state has been loaded.
    pub fn mutate<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut WalletLedger) -> Result<T>,
    {
        if !self.hydrated {
            return Err(LedgerError::NotHydrated);
        }
        let mut next = self.ledger.clone();
        let value = f(&mut next)?;
        self.write(&next)?;
        self.ledger = next;
        Ok(value)
    }

    /// Settle and record a transaction, then persist
    pub fn apply_transaction(&mut self, tx: Transaction) -> Result<Wallet> {
        self.mutate(|ledger| ledger.apply_transaction(tx))
    }

    /// Write the current state to storage
    pub fn persist(&mut self) -> Result<()> {
        if !self.hydrated {
            return Err(LedgerError::NotHydrated);
        }
        let ledger = self.ledger.clone();
        self.write(&ledger)
    }

    fn write(&mut self, ledger: &WalletLedger) -> Result<()> {
        let blob = serde_json::to_string(&PersistedState::current(ledger.snapshot()))?;
        self.storage.set_item(&self.key, blob)?;
        debug!(key = %self.key, "persisted ledger state");
        Ok(())
    }

    /// Drop the stored blob and reset to an empty ledger
    pub fn clear(&mut self) -> Result<()> {
        self.storage.remove_item(&self.key)?;
        self.ledger = WalletLedger::new();
        Ok(())
    }

    /// Read-only access to the ledger
    pub fn ledger(&self) -> &WalletLedger {
        &self.ledger
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}
