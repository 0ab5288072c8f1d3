//! Transition planning
//!
//! Pure diff between the desired wallet set (key descriptors) and the actual
//! one (active registry ids). Nothing here touches an engine.

use crate::key_info::{KeyInfo, SupportedWalletTypes, WalletId};
use std::collections::BTreeSet;

/// The three disjoint transition sets of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionPlan {
    /// Descriptors to construct and start, in processing order
    pub to_activate: Vec<KeyInfo>,
    /// Active wallets whose descriptor is now archived, in processing order
    pub to_archive: Vec<WalletId>,
    /// Active wallets with no live descriptor left, ascending by id
    pub to_delete: Vec<WalletId>,
    wanted_active: BTreeSet<WalletId>,
    live_ids: BTreeSet<WalletId>,
}

/// Supported, non-deleted descriptors stable-sorted by `sort_index`
///
/// Equal sort indices keep their input order.
pub fn prepare_key_infos(key_infos: &[KeyInfo], supported: &SupportedWalletTypes) -> Vec<KeyInfo> {
    let mut live: Vec<KeyInfo> = supported
        .filter(key_infos)
        .into_iter()
        .filter(|info| !info.deleted)
        .collect();
    // sort_by_key is stable
    live.sort_by_key(|info| info.sort_index);
    live
}

impl TransitionPlan {
    pub fn compute(
        key_infos: &[KeyInfo],
        active_ids: &BTreeSet<WalletId>,
        supported: &SupportedWalletTypes,
    ) -> Self {
        let live = prepare_key_infos(key_infos, supported);

        let to_activate: Vec<KeyInfo> = live
            .iter()
            .filter(|info| !info.archived && !active_ids.contains(&info.id))
            .cloned()
            .collect();

        let to_archive: Vec<WalletId> = live
            .iter()
            .filter(|info| info.archived && active_ids.contains(&info.id))
            .map(|info| info.id.clone())
            .collect();

        let live_ids: BTreeSet<WalletId> = live.iter().map(|info| info.id.clone()).collect();
        let to_delete: Vec<WalletId> = active_ids
            .iter()
            .filter(|id| !live_ids.contains(*id))
            .cloned()
            .collect();

        let wanted_active = live
            .iter()
            .filter(|info| !info.archived)
            .map(|info| info.id.clone())
            .collect();

        Self {
            to_activate,
            to_archive,
            to_delete,
            wanted_active,
            live_ids,
        }
    }

    /// True when the pass has nothing to do
    pub fn is_empty(&self) -> bool {
        self.to_activate.is_empty() && self.to_archive.is_empty() && self.to_delete.is_empty()
    }

    /// Whether the descriptors still want this wallet running
    pub fn wants_active(&self, id: &str) -> bool {
        self.wanted_active.contains(id)
    }

    /// Whether a supported, non-deleted descriptor exists for this id
    pub fn is_live(&self, id: &str) -> bool {
        self.live_ids.contains(id)
    }

    pub fn activate_ids(&self) -> Vec<WalletId> {
        self.to_activate.iter().map(|info| info.id.clone()).collect()
    }
}
