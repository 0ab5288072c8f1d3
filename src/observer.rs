//! Transition observers
//!
//! The reconciler reports every transition to the core registry and the UI
//! projection, then to any extra listeners.

use crate::engine::WalletHandle;

/// Receives changes to the set of running engines
pub trait CoreWalletObserver {
    fn on_wallet_activated(&mut self, handle: WalletHandle);
    fn on_wallet_removed(&mut self, id: &str);
}

/// Receives changes to the UI visibility buckets
pub trait UiWalletObserver {
    fn on_ui_activate(&mut self, id: &str);
    fn on_ui_archive(&mut self, id: &str);
    fn on_ui_delete(&mut self, id: &str);
}

/// Kind of lifecycle transition applied to a wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Activated,
    Archived,
    Deleted,
}

/// Subscriber notified after each transition has been applied
pub trait LifecycleListener: Send {
    fn on_transition(&mut self, id: &str, transition: Transition);
}
