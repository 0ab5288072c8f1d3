//! Wallet Manager - Orchestration Layer
//!
//! Bootstraps accounts and drives one lifecycle reconciler per account:
//! read the key list, keep supported types, reconcile, persist the UI projection.

use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::LifecycleConfig;
use crate::engine::{EngineContext, WalletEngineFactory};
use crate::error::LifecycleError;
use crate::key_info::{AccountId, WalletId};
use crate::observer::LifecycleListener;
use crate::reconciler::{ReconcileReport, WalletLifecycleReconciler, WalletStores};
use crate::storage::{KeyRegistry, Storage};
use crate::ui_state::UiWalletStore;

pub struct WalletManager {
    pub config: LifecycleConfig,
    pub storage: Storage,
    key_registry: Arc<dyn KeyRegistry>,
    factory: Arc<dyn WalletEngineFactory>,
    accounts: Mutex<HashMap<AccountId, Arc<WalletLifecycleReconciler>>>,
}

impl WalletManager {
    // ============================================================================
    // Constructor
    // ============================================================================

    pub fn new(factory: Arc<dyn WalletEngineFactory>) -> Result<Self, LifecycleError> {
        // Load configuration from environment
        let config = LifecycleConfig::from_env()?;
        let storage = Storage::new_with_base_dir(config.data_dir.clone());
        Ok(Self::new_with_storage(factory, storage, config))
    }

    /// Create WalletManager with custom storage (for testing)
    pub fn new_with_storage(
        factory: Arc<dyn WalletEngineFactory>,
        storage: Storage,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            config,
            key_registry: Arc::new(storage.clone()),
            storage,
            factory,
            accounts: Mutex::new(HashMap::new()),
        }
    }

    /// Read key descriptors from somewhere other than local storage
    pub fn with_key_registry(mut self, key_registry: Arc<dyn KeyRegistry>) -> Self {
        self.key_registry = key_registry;
        self
    }

    fn accounts(&self) -> MutexGuard<'_, HashMap<AccountId, Arc<WalletLifecycleReconciler>>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ============================================================================
    // Account bootstrap
    // ============================================================================

    /// Add an account and bring its wallets in line with its key list
    ///
    /// Calling this again for a known account behaves like [`Self::refresh`].
    pub async fn initialize_account(&self, account: &str) -> Result<ReconcileReport, LifecycleError> {
        if self.reconciler(account).is_none() {
            self.storage.ensure_account(account)?;
            let ui = self.storage.load_ui_state(account)?;

            let context = EngineContext::new(account, self.storage.account_dir(account));
            let stores = Arc::new(Mutex::new(WalletStores::with_ui(ui)));
            let reconciler = WalletLifecycleReconciler::with_stores(
                self.factory.clone(),
                context,
                self.config.supported_types.clone(),
                stores,
            )
            .with_activation_timeout(self.config.activation_timeout);

            self.accounts()
                .entry(account.to_string())
                .or_insert_with(|| Arc::new(reconciler));
            log::info!("Account '{}' added", account);
        }

        self.refresh(account).await
    }

    /// Re-read the account's key list and reconcile against it
    pub async fn refresh(&self, account: &str) -> Result<ReconcileReport, LifecycleError> {
        let reconciler = self
            .reconciler(account)
            .ok_or_else(|| LifecycleError::AccountNotFound(account.to_string()))?;

        let all_keys = self.key_registry.list_key_infos(account)?;
        let key_infos = reconciler.supported_types().filter(&all_keys);
        if key_infos.len() < all_keys.len() {
            log::debug!(
                "Ignoring {} key infos of unsupported wallet types",
                all_keys.len() - key_infos.len()
            );
        }

        let report = reconciler.reconcile(&key_infos).await;

        let ui = self.ui_snapshot(account)?;
        self.storage.save_ui_state(account, &ui)?;
        let mut meta = self.storage.ensure_account(account)?;
        meta.last_reconciled_at = Some(Utc::now());
        self.storage.save_metadata(account, &meta)?;

        Ok(report)
    }

    /// Initialize every account found in storage
    pub async fn initialize_stored_accounts(&self) -> Result<Vec<AccountId>, LifecycleError> {
        let accounts = self.list_accounts()?;
        for account in &accounts {
            self.initialize_account(account).await?;
        }
        Ok(accounts)
    }

    /// Delete an account's running wallets and its stored data
    ///
    /// Returns the wallet ids whose engines were sent a delete request.
    pub fn delete_account(&self, account: &str) -> Result<Vec<WalletId>, LifecycleError> {
        let removed = self.accounts().remove(account);
        if removed.is_none() && !self.storage.account_exists(account) {
            return Err(LifecycleError::AccountNotFound(account.to_string()));
        }

        let mut deleted = Vec::new();
        if let Some(reconciler) = removed {
            let active_ids = reconciler
                .stores()
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .registry
                .active_ids();
            for id in active_ids {
                if reconciler.delete(&id) {
                    deleted.push(id);
                }
            }
        }

        self.storage.delete_account(account)?;
        log::info!("Account '{}' deleted ({} wallets stopped)", account, deleted.len());
        Ok(deleted)
    }

    // ============================================================================
    // Queries
    // ============================================================================

    /// Accounts with stored metadata, loaded or not
    pub fn list_accounts(&self) -> Result<Vec<AccountId>, LifecycleError> {
        Ok(self.storage.list_accounts()?)
    }

    pub fn reconciler(&self, account: &str) -> Option<Arc<WalletLifecycleReconciler>> {
        self.accounts().get(account).cloned()
    }

    pub fn accounts_loaded(&self) -> Vec<AccountId> {
        let mut accounts: Vec<_> = self.accounts().keys().cloned().collect();
        accounts.sort();
        accounts
    }

    pub fn ui_snapshot(&self, account: &str) -> Result<UiWalletStore, LifecycleError> {
        let reconciler = self
            .reconciler(account)
            .ok_or_else(|| LifecycleError::AccountNotFound(account.to_string()))?;
        let stores = reconciler.stores();
        let ui = stores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ui
            .clone();
        Ok(ui)
    }

    pub fn active_wallet_ids(&self, account: &str) -> Result<BTreeSet<WalletId>, LifecycleError> {
        let reconciler = self
            .reconciler(account)
            .ok_or_else(|| LifecycleError::AccountNotFound(account.to_string()))?;
        let stores = reconciler.stores();
        let ids = stores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .registry
            .active_ids();
        Ok(ids)
    }

    /// Subscribe to every transition applied for an account
    pub fn add_listener(
        &self,
        account: &str,
        listener: Box<dyn LifecycleListener>,
    ) -> Result<(), LifecycleError> {
        let reconciler = self
            .reconciler(account)
            .ok_or_else(|| LifecycleError::AccountNotFound(account.to_string()))?;
        reconciler
            .stores()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .add_listener(listener);
        Ok(())
    }
}
