//! Wallet Manager Integration Tests
//!
//! Account bootstrap end to end: key list on disk -> reconciliation -> persisted
//! UI projection. Uses a temporary storage directory per test.
//!
//! Run with: cargo test --test manager_test -- --nocapture

mod common;

use common::{init_logging, key, settle, RecordingListener, TestEnvironment};
use std::sync::Arc;
use std::time::Duration;
use wallet_lifecycle::{
    KeyInfo, KeyRegistry, LifecycleConfig, LifecycleError, Storage, SupportedWalletTypes,
    Transition, WalletVisibility,
};

#[tokio::test]
async fn test_initialize_account_activates_supported_wallets() -> anyhow::Result<()> {
    init_logging();
    let env = TestEnvironment::new()?;

    let mut foreign = key("btc", 0);
    foreign.wallet_type = "wallet:bitcoin".to_string();
    env.write_keys("alice", &[key("w2", 2), foreign, key("w1", 1)])?;

    let report = env.manager.initialize_account("alice").await?;

    assert_eq!(report.activated, vec!["w1", "w2"]);
    assert_eq!(env.factory.constructed(), vec!["w1", "w2"]);

    let active: Vec<_> = env.manager.active_wallet_ids("alice")?.into_iter().collect();
    assert_eq!(active, vec!["w1", "w2"]);
    assert_eq!(env.manager.accounts_loaded(), vec!["alice"]);
    Ok(())
}

#[tokio::test]
async fn test_initialize_creates_missing_account() -> anyhow::Result<()> {
    init_logging();
    let env = TestEnvironment::new()?;

    let report = env.manager.initialize_account("bob").await?;

    assert!(report.is_noop());
    assert!(env.manager.storage.account_exists("bob"));
    let meta = env.manager.storage.load_metadata("bob")?;
    assert_eq!(meta.account, "bob");
    assert!(meta.last_reconciled_at.is_some());
    Ok(())
}

#[tokio::test]
async fn test_refresh_applies_key_list_changes() -> anyhow::Result<()> {
    init_logging();
    let env = TestEnvironment::new()?;
    env.write_keys("alice", &[key("a", 0), key("b", 1), key("c", 2)])?;
    env.manager.initialize_account("alice").await?;

    env.write_keys("alice", &[key("a", 0), key("b", 1).archived()])?;
    let report = env.manager.refresh("alice").await?;
    settle().await;

    assert!(report.activated.is_empty());
    assert_eq!(report.archived, vec!["b"]);
    assert_eq!(report.deleted, vec!["c"]);

    let ui = env.manager.ui_snapshot("alice")?;
    assert_eq!(ui.active_ids(), vec!["a"]);
    assert_eq!(ui.archived_ids(), vec!["b"]);
    assert_eq!(ui.deleted_ids(), vec!["c"]);
    assert_eq!(env.factory.archived(), vec!["b"]);
    assert_eq!(env.factory.deleted(), vec!["c"]);
    Ok(())
}

#[tokio::test]
async fn test_ui_state_is_persisted_and_restored() -> anyhow::Result<()> {
    init_logging();
    let env = TestEnvironment::new()?;
    env.write_keys("alice", &[key("a", 0), key("b", 1)])?;
    env.manager.initialize_account("alice").await?;

    env.write_keys("alice", &[key("a", 0)])?;
    env.manager.refresh("alice").await?;

    let saved = env.manager.storage.load_ui_state("alice")?;
    assert_eq!(saved.visibility("a"), Some(WalletVisibility::Active));
    assert_eq!(saved.visibility("b"), Some(WalletVisibility::Deleted));

    // A fresh manager over the same directory restores the projection
    let storage = Storage::new_with_base_dir(env.temp_dir.path().to_path_buf());
    let manager = wallet_lifecycle::WalletManager::new_with_storage(
        env.factory.as_factory(),
        storage,
        LifecycleConfig::default(),
    );
    manager.initialize_account("alice").await?;
    let ui = manager.ui_snapshot("alice")?;
    assert_eq!(ui.visibility("b"), Some(WalletVisibility::Deleted));
    assert_eq!(ui.visibility("a"), Some(WalletVisibility::Active));
    Ok(())
}

#[tokio::test]
async fn test_refresh_unknown_account_fails() -> anyhow::Result<()> {
    init_logging();
    let env = TestEnvironment::new()?;

    let err = env.manager.refresh("nobody").await.unwrap_err();
    assert!(matches!(err, LifecycleError::AccountNotFound(_)));
    assert!(env.manager.ui_snapshot("nobody").is_err());
    Ok(())
}

#[tokio::test]
async fn test_config_supported_types_and_timeout_apply() -> anyhow::Result<()> {
    init_logging();
    let config = LifecycleConfig {
        supported_types: SupportedWalletTypes::new(["wallet:bitcoin"]),
        activation_timeout: Some(Duration::from_millis(50)),
        ..LifecycleConfig::default()
    };
    let env = TestEnvironment::with_config(config)?;
    env.factory.gate("slow");

    let mut btc = key("btc", 0);
    btc.wallet_type = "wallet:bitcoin".to_string();
    let mut slow = key("slow", 1);
    slow.wallet_type = "wallet:bitcoin".to_string();
    env.write_keys("alice", &[key("shit", 0), btc, slow])?;

    let report = env.manager.initialize_account("alice").await?;

    assert_eq!(report.activated, vec!["btc"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, "slow");
    assert_eq!(env.factory.constructed(), vec!["btc"]);
    Ok(())
}

struct FixedRegistry(Vec<KeyInfo>);

impl KeyRegistry for FixedRegistry {
    fn list_key_infos(&self, _account: &str) -> Result<Vec<KeyInfo>, LifecycleError> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn test_external_key_registry_and_listener() -> anyhow::Result<()> {
    init_logging();
    let env = TestEnvironment::new()?;
    let storage = Storage::new_with_base_dir(env.temp_dir.path().join("external"));
    let manager = wallet_lifecycle::WalletManager::new_with_storage(
        env.factory.as_factory(),
        storage,
        LifecycleConfig::default(),
    )
    .with_key_registry(Arc::new(FixedRegistry(vec![key("remote", 0)])));

    manager.initialize_account("carol").await?;
    let listener = RecordingListener::default();
    manager.add_listener("carol", Box::new(listener.clone()))?;

    // The registry still lists the wallet, so nothing changes
    let report = manager.refresh("carol").await?;
    assert!(report.is_noop());
    assert!(listener.events().is_empty());

    let reconciler = manager.reconciler("carol").expect("account loaded");
    assert!(reconciler.archive("remote"));
    assert_eq!(
        listener.events(),
        vec![("remote".to_string(), Transition::Archived)]
    );
    Ok(())
}

#[tokio::test]
async fn test_restart_reconciles_restored_projection() -> anyhow::Result<()> {
    init_logging();
    let env = TestEnvironment::new()?;
    env.write_keys("alice", &[key("a", 0), key("b", 1)])?;
    env.manager.initialize_account("alice").await?;

    // Restart: "a" is gone from the key list and "b" no longer constructs
    env.write_keys("alice", &[key("b", 1)])?;
    env.factory.fail_construct("b");
    let storage = Storage::new_with_base_dir(env.temp_dir.path().to_path_buf());
    let manager = wallet_lifecycle::WalletManager::new_with_storage(
        env.factory.as_factory(),
        storage,
        LifecycleConfig::default(),
    );
    let report = manager.initialize_account("alice").await?;

    assert_eq!(report.deleted, vec!["a"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, "b");
    assert!(manager.active_wallet_ids("alice")?.is_empty());

    let ui = manager.ui_snapshot("alice")?;
    assert!(ui.active_ids().is_empty());
    assert_eq!(ui.deleted_ids(), vec!["a"]);
    assert_eq!(ui.visibility("b"), None);

    let saved = manager.storage.load_ui_state("alice")?;
    assert_eq!(saved, ui);
    Ok(())
}

#[tokio::test]
async fn test_stored_accounts_are_listed_and_initialized() -> anyhow::Result<()> {
    init_logging();
    let env = TestEnvironment::new()?;
    env.write_keys("bob", &[key("b1", 0)])?;
    env.write_keys("alice", &[key("a1", 0)])?;

    assert_eq!(env.manager.list_accounts()?, vec!["alice", "bob"]);
    assert!(env.manager.accounts_loaded().is_empty());

    let initialized = env.manager.initialize_stored_accounts().await?;

    assert_eq!(initialized, vec!["alice", "bob"]);
    assert_eq!(env.manager.accounts_loaded(), vec!["alice", "bob"]);
    assert!(env.manager.active_wallet_ids("bob")?.contains("b1"));
    Ok(())
}

#[tokio::test]
async fn test_delete_account_stops_wallets_and_removes_data() -> anyhow::Result<()> {
    init_logging();
    let env = TestEnvironment::new()?;
    env.write_keys("alice", &[key("a", 0), key("b", 1)])?;
    env.manager.initialize_account("alice").await?;

    let deleted = env.manager.delete_account("alice")?;
    settle().await;

    assert_eq!(deleted, vec!["a", "b"]);
    assert_eq!(env.factory.deleted(), vec!["a", "b"]);
    assert!(!env.manager.storage.account_exists("alice"));
    assert!(env.manager.accounts_loaded().is_empty());
    assert!(env.manager.list_accounts()?.is_empty());

    let err = env.manager.delete_account("alice").unwrap_err();
    assert!(matches!(err, LifecycleError::AccountNotFound(_)));
    Ok(())
}
