//! UI projection of wallet ids into visibility buckets

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::key_info::WalletId;
use crate::observer::UiWalletObserver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletVisibility {
    Active,
    Archived,
    Deleted,
}

/// Wallet id -> bucket. Each id lives in exactly one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiWalletStore {
    wallets: BTreeMap<WalletId, WalletVisibility>,
}

impl UiWalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visibility(&self, id: &str) -> Option<WalletVisibility> {
        self.wallets.get(id).copied()
    }

    pub fn active_ids(&self) -> Vec<WalletId> {
        self.ids_in(WalletVisibility::Active)
    }

    pub fn archived_ids(&self) -> Vec<WalletId> {
        self.ids_in(WalletVisibility::Archived)
    }

    pub fn deleted_ids(&self) -> Vec<WalletId> {
        self.ids_in(WalletVisibility::Deleted)
    }

    /// Remove and return every id in the active bucket
    ///
    /// A projection loaded from disk says nothing about which engines are
    /// running now, so its active ids are taken out until they start again.
    pub fn take_active(&mut self) -> BTreeSet<WalletId> {
        let active: BTreeSet<WalletId> = self.active_ids().into_iter().collect();
        self.wallets.retain(|_, v| *v != WalletVisibility::Active);
        active
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    fn ids_in(&self, bucket: WalletVisibility) -> Vec<WalletId> {
        self.wallets
            .iter()
            .filter(|(_, v)| **v == bucket)
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn mark(&mut self, id: &str, bucket: WalletVisibility) {
        self.wallets.insert(id.to_string(), bucket);
    }
}

impl UiWalletObserver for UiWalletStore {
    fn on_ui_activate(&mut self, id: &str) {
        self.mark(id, WalletVisibility::Active);
    }

    fn on_ui_archive(&mut self, id: &str) {
        self.mark(id, WalletVisibility::Archived);
    }

    fn on_ui_delete(&mut self, id: &str) {
        self.mark(id, WalletVisibility::Deleted);
    }
}
