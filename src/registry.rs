//! Active wallet registry
//!
//! Tracks running engines by wallet id, plus the ids whose activation is
//! currently awaiting the engine factory.

use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};

use crate::engine::WalletHandle;
use crate::key_info::WalletId;
use crate::observer::CoreWalletObserver;

/// A started engine and when it became active
#[derive(Debug, Clone)]
pub struct ActiveWallet {
    pub handle: WalletHandle,
    pub activated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ActiveWalletRegistry {
    wallets: HashMap<WalletId, ActiveWallet>,
    // id -> superseded
    in_flight: HashMap<WalletId, bool>,
}

impl ActiveWalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorted snapshot of the running wallet ids
    pub fn active_ids(&self) -> BTreeSet<WalletId> {
        self.wallets.keys().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<&ActiveWallet> {
        self.wallets.get(id)
    }

    pub fn handle(&self, id: &str) -> Option<WalletHandle> {
        self.wallets.get(id).map(|w| w.handle.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.wallets.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    // ============================================================================
    // In-flight activations
    // ============================================================================

    /// Claim an activation slot for `id`
    ///
    /// Returns false when the wallet is already running or another pass is
    /// already constructing it.
    pub fn begin_activation(&mut self, id: &str) -> bool {
        if self.wallets.contains_key(id) || self.in_flight.contains_key(id) {
            return false;
        }
        self.in_flight.insert(id.to_string(), false);
        true
    }

    /// Release the activation slot; returns whether it was superseded meanwhile
    pub fn finish_activation(&mut self, id: &str) -> bool {
        self.in_flight.remove(id).unwrap_or(false)
    }

    /// Mark an in-flight activation as no longer wanted
    pub fn supersede(&mut self, id: &str) -> bool {
        match self.in_flight.get_mut(id) {
            Some(superseded) => {
                *superseded = true;
                true
            }
            None => false,
        }
    }

    /// A later pass that wants the wallet again revives a superseded activation
    pub fn revive(&mut self, id: &str) {
        if let Some(superseded) = self.in_flight.get_mut(id) {
            *superseded = false;
        }
    }

    pub fn is_in_flight(&self, id: &str) -> bool {
        self.in_flight.contains_key(id)
    }

    pub fn in_flight_ids(&self) -> BTreeSet<WalletId> {
        self.in_flight.keys().cloned().collect()
    }
}

impl CoreWalletObserver for ActiveWalletRegistry {
    fn on_wallet_activated(&mut self, handle: WalletHandle) {
        let id = handle.id().to_string();
        log::debug!("Registry: wallet {} active", id);
        self.wallets.insert(
            id,
            ActiveWallet {
                handle,
                activated_at: Utc::now(),
            },
        );
    }

    fn on_wallet_removed(&mut self, id: &str) {
        if self.wallets.remove(id).is_some() {
            log::debug!("Registry: wallet {} removed", id);
        }
    }
}
