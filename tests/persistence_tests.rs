mod common;

use common::{completed_mission, make_payment, make_topup};
use wallet_ledger::error::LedgerError;
use wallet_ledger::models::{Pocket, RewardType, UserProfile, Wallet};
use wallet_ledger::persistence::{
    FileStorage, MemoryStorage, PersistedState, StorageBackend, SCHEMA_VERSION,
};
use wallet_ledger::persistent_ledger::PersistentLedger;

const KEY: &str = "wallet-storage";

fn logged_in(storage: MemoryStorage) -> PersistentLedger<MemoryStorage> {
    let mut ledger = PersistentLedger::hydrate(storage, KEY).unwrap();
    ledger
        .mutate(|l| {
            l.login(UserProfile::new("user-001", "Test User"), Wallet::new(1_000, 0, 0, 0));
            l.set_missions(vec![completed_mission("daily", 50, RewardType::Points)]);
            Ok(())
        })
        .unwrap();
    ledger
}

#[test]
fn test_hydrate_empty_storage_starts_fresh() {
    let ledger = PersistentLedger::hydrate(MemoryStorage::new(), KEY).unwrap();

    assert!(ledger.has_hydrated());
    assert!(!ledger.ledger().is_authenticated());
    assert_eq!(ledger.ledger().transaction_count(), 0);
}

#[test]
fn test_unhydrated_ledger_refuses_mutation() {
    let mut ledger = PersistentLedger::new(MemoryStorage::new(), KEY);

    assert!(!ledger.has_hydrated());
    assert!(matches!(
        ledger.mutate(|l| l.add_points(10)),
        Err(LedgerError::NotHydrated)
    ));
    assert!(matches!(ledger.persist(), Err(LedgerError::NotHydrated)));
    assert_eq!(ledger.storage().write_count(), 0);

    ledger.rehydrate().unwrap();
    assert!(ledger.mutate(|l| l.add_points(10)).is_ok());
}

#[test]
fn test_successful_mutation_persists() {
    let mut ledger = logged_in(MemoryStorage::new());
    let writes = ledger.storage().write_count();

    ledger.apply_transaction(make_payment("TX1", 400)).unwrap();

    assert_eq!(ledger.storage().write_count(), writes + 1);
    assert_eq!(ledger.ledger().wallet().balance_main, 600);
}

#[test]
fn test_rejected_mutation_writes_nothing_and_keeps_state() {
    let mut ledger = logged_in(MemoryStorage::new());
    let writes = ledger.storage().write_count();

    // Debit succeeds inside the closure, then the claim fails: nothing sticks
    let result = ledger.mutate(|l| {
        l.debit(Pocket::Main, 500)?;
        l.claim_mission_reward("missing")
    });

    assert!(matches!(result, Err(LedgerError::MissionNotFound(_))));
    assert_eq!(ledger.storage().write_count(), writes);
    assert_eq!(ledger.ledger().wallet().balance_main, 1_000);
}

#[test]
fn test_round_trip_through_storage() {
    let mut ledger = logged_in(MemoryStorage::new());
    ledger.apply_transaction(make_payment("TX1", 300)).unwrap();
    ledger.apply_transaction(make_topup("TX2", 50)).unwrap();
    ledger.mutate(|l| l.claim_mission_reward("daily")).unwrap();
    let before = ledger.ledger().snapshot();

    let mut storage = MemoryStorage::new();
    let blob = ledger.storage().get_item(KEY).unwrap().unwrap();
    storage.set_item(KEY, blob).unwrap();

    let restored = PersistentLedger::hydrate(storage, KEY).unwrap();

    assert_eq!(restored.ledger().snapshot(), before);
    assert_eq!(*restored.ledger().wallet(), Wallet::new(750, 0, 0, 50));
    assert!(restored.ledger().mission("daily").unwrap().is_claimed);
}

#[test]
fn test_blob_layout() {
    let ledger = logged_in(MemoryStorage::new());
    let blob = ledger.storage().get_item(KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&blob).unwrap();

    assert_eq!(value["version"], SCHEMA_VERSION);
    assert_eq!(value["state"]["isAuthenticated"], true);
    assert_eq!(value["state"]["user"]["id"], "user-001");
    assert_eq!(value["state"]["wallet"]["balanceMain"], 1_000);
    assert_eq!(value["state"]["missions"][0]["rewardType"], "points");
}

#[test]
fn test_legacy_blob_without_version_is_accepted() {
    let legacy = r#"{
        "state": {
            "user": {"id": "user-001", "name": "Legacy"},
            "wallet": {"balanceMain": 42, "balanceMarket": 0, "balanceSavings": 0, "balancePoints": 7},
            "isAuthenticated": true
        }
    }"#;
    let mut storage = MemoryStorage::new();
    storage.set_item(KEY, legacy.to_string()).unwrap();

    let ledger = PersistentLedger::hydrate(storage, KEY).unwrap();

    assert!(ledger.ledger().is_authenticated());
    assert_eq!(ledger.ledger().user().unwrap().name, "Legacy");
    assert_eq!(*ledger.ledger().wallet(), Wallet::new(42, 0, 0, 7));
    assert_eq!(ledger.ledger().transaction_count(), 0);
}

#[test]
fn test_null_wallet_hydrates_as_empty() {
    let blob = r#"{"version": 1, "state": {"user": null, "wallet": null, "isAuthenticated": false}}"#;
    let mut storage = MemoryStorage::new();
    storage.set_item(KEY, blob.to_string()).unwrap();

    let ledger = PersistentLedger::hydrate(storage, KEY).unwrap();

    assert_eq!(*ledger.ledger().wallet(), Wallet::default());
}

#[test]
fn test_newer_schema_version_rejected() {
    let state = PersistedState {
        version: SCHEMA_VERSION + 1,
        state: Default::default(),
    };
    let mut storage = MemoryStorage::new();
    storage
        .set_item(KEY, serde_json::to_string(&state).unwrap())
        .unwrap();

    let result = PersistentLedger::hydrate(storage, KEY);

    assert!(matches!(
        result,
        Err(LedgerError::UnsupportedSchemaVersion { found, supported })
            if found == SCHEMA_VERSION + 1 && supported == SCHEMA_VERSION
    ));
}

#[test]
fn test_corrupt_blob_is_json_error() {
    let mut storage = MemoryStorage::new();
    storage.set_item(KEY, "{not json".to_string()).unwrap();

    assert!(matches!(
        PersistentLedger::hydrate(storage, KEY),
        Err(LedgerError::Json(_))
    ));
}

#[test]
fn test_clear_removes_blob() {
    let mut ledger = logged_in(MemoryStorage::new());

    ledger.clear().unwrap();

    assert!(ledger.storage().get_item(KEY).unwrap().is_none());
    assert!(!ledger.ledger().is_authenticated());
}

#[test]
fn test_file_storage_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let storage = FileStorage::new(dir.path()).unwrap();
        let mut ledger = PersistentLedger::hydrate(storage, KEY).unwrap();
        ledger
            .mutate(|l| {
                l.login(UserProfile::new("user-001", "Test User"), Wallet::new(2_000, 0, 0, 0));
                l.apply_transaction(make_payment("TX1", 500))
            })
            .unwrap();
    }

    assert!(dir.path().join("wallet-storage.json").exists());

    let storage = FileStorage::new(dir.path()).unwrap();
    let ledger = PersistentLedger::hydrate(storage, KEY).unwrap();

    assert_eq!(ledger.ledger().wallet().balance_main, 1_500);
    assert_eq!(ledger.ledger().find_transaction("TX1").unwrap().amount, -500);
}

#[test]
fn test_file_storage_missing_key() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = FileStorage::new(dir.path().join("nested")).unwrap();

    assert!(storage.get_item("absent").unwrap().is_none());
    // Removing a missing key is not an error
    storage.remove_item("absent").unwrap();

    storage.set_item("present", "1".to_string()).unwrap();
    assert_eq!(storage.get_item("present").unwrap().as_deref(), Some("1"));
    storage.remove_item("present").unwrap();
    assert!(storage.get_item("present").unwrap().is_none());
}

#[test]
fn test_file_storage_refuses_keys_outside_its_directory() {
    let root = tempfile::tempdir().unwrap();
    let state_dir = root.path().join("state");
    let mut storage = FileStorage::new(&state_dir).unwrap();

    for key in ["../escaped", "nested/key", "..\\escaped", "..", ".", ""] {
        let result = storage.set_item(key, "{}".to_string());
        assert!(
            matches!(result, Err(LedgerError::InvalidStorageKey(ref k)) if k == key),
            "key {:?} was accepted",
            key
        );
        assert!(matches!(
            storage.get_item(key),
            Err(LedgerError::InvalidStorageKey(_))
        ));
        assert!(matches!(
            storage.remove_item(key),
            Err(LedgerError::InvalidStorageKey(_))
        ));
    }

    assert!(!root.path().join("escaped.json").exists());
    assert_eq!(std::fs::read_dir(&state_dir).unwrap().count(), 0);
}

#[test]
fn test_hydrate_with_escaping_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("state")).unwrap();

    let result = PersistentLedger::hydrate(storage, "../wallet-storage");

    assert!(matches!(result, Err(LedgerError::InvalidStorageKey(_))));
    assert!(!dir.path().join("wallet-storage.json").exists());
}
