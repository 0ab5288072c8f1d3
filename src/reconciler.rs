//! Wallet lifecycle reconciler
//!
//! Diffs the account's key descriptors against the running engines and applies
//! the resulting transitions. Activations are issued first, then archivals,
//! then deletions. Only activations wait on the engine: archivals and deletions
//! are applied while constructions are still pending.
//!
//! Registry and UI projection share one lock, so an id is never visible as
//! changed in one and unchanged in the other. The lock is never held across an
//! `.await`; activations that are awaiting the factory are tracked as in flight
//! so overlapping passes construct each engine at most once.

use futures::future::join_all;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::engine::{spawn_teardown, EngineContext, TeardownKind, WalletEngineFactory, WalletHandle};
use crate::error::EngineError;
use crate::key_info::{KeyInfo, SupportedWalletTypes, WalletId};
use crate::observer::{CoreWalletObserver, LifecycleListener, Transition, UiWalletObserver};
use crate::plan::TransitionPlan;
use crate::registry::ActiveWalletRegistry;
use crate::ui_state::UiWalletStore;

/// Core registry and UI projection, updated together
#[derive(Default)]
pub struct WalletStores {
    pub registry: ActiveWalletRegistry,
    pub ui: UiWalletStore,
    // Active in a persisted projection, no engine running yet
    restored: BTreeSet<WalletId>,
    listeners: Vec<Box<dyn LifecycleListener>>,
}

pub type SharedStores = Arc<Mutex<WalletStores>>;

impl WalletStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously persisted UI projection
    ///
    /// Ids the projection lists as active are held back until their engine
    /// starts again; the next pass archives or deletes them in the UI if the
    /// key list no longer wants them.
    pub fn with_ui(mut ui: UiWalletStore) -> Self {
        let restored = ui.take_active();
        Self {
            ui,
            restored,
            ..Self::default()
        }
    }

    /// Restored ids that have not been activated, archived or deleted yet
    pub fn restored_ids(&self) -> BTreeSet<WalletId> {
        self.restored.clone()
    }

    pub fn add_listener(&mut self, listener: Box<dyn LifecycleListener>) {
        self.listeners.push(listener);
    }

    fn apply_activated(&mut self, handle: WalletHandle) {
        let id = handle.id().to_string();
        self.restored.remove(&id);
        self.registry.on_wallet_activated(handle);
        self.ui.on_ui_activate(&id);
        self.notify(&id, Transition::Activated);
    }

    fn apply_archived(&mut self, id: &str) {
        self.registry.on_wallet_removed(id);
        self.ui.on_ui_archive(id);
        self.notify(id, Transition::Archived);
    }

    fn apply_deleted(&mut self, id: &str) {
        self.registry.on_wallet_removed(id);
        self.ui.on_ui_delete(id);
        self.notify(id, Transition::Deleted);
    }

    fn notify(&mut self, id: &str, transition: Transition) {
        for listener in self.listeners.iter_mut() {
            listener.on_transition(id, transition);
        }
    }
}

/// Result of a single activation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// Engine constructed, started and registered
    Activated,
    /// Already running or already being constructed by another pass
    AlreadyActive,
    /// Constructed, but a later pass no longer wanted it; torn down unregistered
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationFailure {
    pub id: WalletId,
    pub error: EngineError,
}

/// What one reconciliation pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub activated: Vec<WalletId>,
    pub failed: Vec<ActivationFailure>,
    pub skipped: Vec<WalletId>,
    pub superseded: Vec<WalletId>,
    pub archived: Vec<WalletId>,
    pub deleted: Vec<WalletId>,
}

impl ReconcileReport {
    /// True when no registry or UI state changed
    pub fn is_noop(&self) -> bool {
        self.activated.is_empty() && self.archived.is_empty() && self.deleted.is_empty()
    }
}

pub struct WalletLifecycleReconciler {
    factory: Arc<dyn WalletEngineFactory>,
    context: EngineContext,
    supported: SupportedWalletTypes,
    activation_timeout: Option<Duration>,
    stores: SharedStores,
}

impl WalletLifecycleReconciler {
    pub fn new(
        factory: Arc<dyn WalletEngineFactory>,
        context: EngineContext,
        supported: SupportedWalletTypes,
    ) -> Self {
        Self::with_stores(factory, context, supported, Arc::new(Mutex::new(WalletStores::new())))
    }

    /// Reconcile into stores shared with other components
    pub fn with_stores(
        factory: Arc<dyn WalletEngineFactory>,
        context: EngineContext,
        supported: SupportedWalletTypes,
        stores: SharedStores,
    ) -> Self {
        Self {
            factory,
            context,
            supported,
            activation_timeout: None,
            stores,
        }
    }

    /// Treat activations slower than `timeout` as failed
    pub fn with_activation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.activation_timeout = timeout;
        self
    }

    pub fn stores(&self) -> SharedStores {
        self.stores.clone()
    }

    pub fn supported_types(&self) -> &SupportedWalletTypes {
        &self.supported
    }

    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    fn lock(&self) -> MutexGuard<'_, WalletStores> {
        self.stores.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ============================================================================
    // Planning
    // ============================================================================

    /// Dry run against the current registry
    pub fn plan(&self, key_infos: &[KeyInfo]) -> TransitionPlan {
        let active_ids = self.lock().registry.active_ids();
        TransitionPlan::compute(key_infos, &active_ids, &self.supported)
    }

    // ============================================================================
    // Reconciliation
    // ============================================================================

    pub async fn reconcile(&self, key_infos: &[KeyInfo]) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        // Plan, claim activation slots and pick teardowns against one registry snapshot
        let (claimed, to_archive, to_delete) = {
            let mut stores = self.lock();
            let plan =
                TransitionPlan::compute(key_infos, &stores.registry.active_ids(), &self.supported);

            // Activations still pending from earlier passes follow the latest descriptors
            for id in stores.registry.in_flight_ids() {
                if plan.wants_active(&id) {
                    stores.registry.revive(&id);
                } else if stores.registry.supersede(&id) {
                    log::info!("In-flight activation of wallet {} superseded", id);
                }
            }

            let mut claimed = Vec::with_capacity(plan.to_activate.len());
            for info in &plan.to_activate {
                if stores.registry.begin_activation(&info.id) {
                    claimed.push(info.clone());
                } else {
                    log::debug!("Wallet {} already active or activating, skipping", info.id);
                    report.skipped.push(info.id.clone());
                }
            }

            let mut to_archive = plan.to_archive.clone();
            let mut to_delete: BTreeSet<WalletId> = plan.to_delete.iter().cloned().collect();
            for id in stores.restored_ids() {
                if plan.wants_active(&id) {
                    continue;
                }
                if plan.is_live(&id) {
                    to_archive.push(id);
                } else {
                    to_delete.insert(id);
                }
            }

            log::info!(
                "Reconciling {} key infos for account {}: {} to activate, {} to archive, {} to delete",
                key_infos.len(),
                self.context.account,
                claimed.len(),
                to_archive.len(),
                to_delete.len()
            );
            (claimed, to_archive, to_delete)
        };

        let activations = join_all(claimed.iter().map(|info| self.activate_claimed(info)));
        let teardowns = async move {
            let archived: Vec<WalletId> =
                to_archive.into_iter().filter(|id| self.archive(id)).collect();
            let deleted: Vec<WalletId> =
                to_delete.into_iter().filter(|id| self.delete(id)).collect();
            (archived, deleted)
        };
        // join! polls in argument order: constructions start before any teardown
        let (results, (archived, deleted)) = futures::join!(activations, teardowns);

        for (info, result) in claimed.iter().zip(results) {
            match result {
                Ok(ActivationOutcome::Activated) => report.activated.push(info.id.clone()),
                Ok(ActivationOutcome::Superseded) => report.superseded.push(info.id.clone()),
                Ok(ActivationOutcome::AlreadyActive) => report.skipped.push(info.id.clone()),
                Err(error) => report.failed.push(ActivationFailure {
                    id: info.id.clone(),
                    error,
                }),
            }
        }
        report.archived = archived;
        report.deleted = deleted;

        log::info!(
            "Reconciliation done: {} activated, {} failed, {} archived, {} deleted",
            report.activated.len(),
            report.failed.len(),
            report.archived.len(),
            report.deleted.len()
        );
        report
    }

    // ============================================================================
    // Individual transitions
    // ============================================================================

    /// Construct, start and register one wallet
    ///
    /// On failure nothing is recorded in either store.
    pub async fn activate(&self, key_info: &KeyInfo) -> Result<ActivationOutcome, EngineError> {
        let claimed = self.lock().registry.begin_activation(&key_info.id);
        if !claimed {
            return Ok(ActivationOutcome::AlreadyActive);
        }
        self.activate_claimed(key_info).await
    }

    /// Archive a running or restored wallet; returns false if it is neither
    ///
    /// The engine stop request is detached. Local state changes regardless of
    /// its outcome.
    pub fn archive(&self, id: &str) -> bool {
        self.teardown(id, TeardownKind::Archive)
    }

    /// Delete a running wallet; same request semantics as [`Self::archive`]
    pub fn delete(&self, id: &str) -> bool {
        self.teardown(id, TeardownKind::Delete)
    }

    // Caller holds the in-flight slot for key_info.id
    async fn activate_claimed(&self, key_info: &KeyInfo) -> Result<ActivationOutcome, EngineError> {
        let result = self.construct(key_info).await;
        self.complete_activation(key_info, result)
    }

    async fn construct(&self, key_info: &KeyInfo) -> Result<WalletHandle, EngineError> {
        let id = key_info.id.clone();
        let build = async {
            let handle = self.factory.make_wallet(key_info, &self.context).await?;
            if handle.id() != key_info.id {
                return Err(EngineError::construction(
                    &key_info.id,
                    format!("factory returned engine for wallet {}", handle.id()),
                ));
            }
            handle.start().await?;
            Ok::<WalletHandle, EngineError>(handle)
        };

        match self.activation_timeout {
            Some(timeout) => tokio::time::timeout(timeout, build)
                .await
                .map_err(|_| EngineError::TimedOut {
                    id,
                    secs: timeout.as_secs(),
                })?,
            None => build.await,
        }
    }

    fn complete_activation(
        &self,
        key_info: &KeyInfo,
        result: Result<WalletHandle, EngineError>,
    ) -> Result<ActivationOutcome, EngineError> {
        let mut stores = self.lock();
        let superseded = stores.registry.finish_activation(&key_info.id);

        match result {
            Ok(handle) if superseded => {
                log::info!(
                    "Wallet {} started after it was archived or removed, stopping it",
                    key_info.id
                );
                spawn_teardown(handle, TeardownKind::Archive);
                Ok(ActivationOutcome::Superseded)
            }
            Ok(handle) => {
                stores.apply_activated(handle);
                log::info!("✓ Wallet {} activated", key_info.id);
                Ok(ActivationOutcome::Activated)
            }
            Err(e) => {
                log::error!("Failed to activate wallet {}: {}", key_info.id, e);
                Err(e)
            }
        }
    }

    fn teardown(&self, id: &str, kind: TeardownKind) -> bool {
        let mut stores = self.lock();
        let handle = stores.registry.handle(id);
        match handle {
            Some(handle) => {
                spawn_teardown(handle, kind);
            }
            None => {
                if !stores.restored.remove(id) {
                    log::debug!("Wallet {} is not active, nothing to {}", id, kind);
                    return false;
                }
                log::debug!("Wallet {} never restarted, updating UI only", id);
            }
        }

        match kind {
            TeardownKind::Archive => stores.apply_archived(id),
            TeardownKind::Delete => stores.apply_deleted(id),
        }
        log::info!("Wallet {} {}d", id, kind);
        true
    }
}
