//! Key descriptors and the supported wallet type set

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Stable wallet identifier, unique within an account
pub type WalletId = String;

/// Opaque account identifier
pub type AccountId = String;

/// Wallet type handled by the bundled currency plugin
pub const DEFAULT_WALLET_TYPE: &str = "wallet:shitcoin";

/// One descriptor per wallet the account knows about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    pub id: WalletId,
    #[serde(rename = "type")]
    pub wallet_type: String,
    #[serde(default)]
    pub sort_index: i64,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl KeyInfo {
    /// Live, visible wallet descriptor
    pub fn new(id: impl Into<WalletId>, wallet_type: impl Into<String>, sort_index: i64) -> Self {
        Self {
            id: id.into(),
            wallet_type: wallet_type.into(),
            sort_index,
            archived: false,
            deleted: false,
        }
    }

    pub fn archived(mut self) -> Self {
        self.archived = true;
        self
    }

    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }
}

/// Wallet types that have a currency plugin behind them
///
/// One entry per supported plugin. Descriptors of any other type are ignored
/// by reconciliation entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedWalletTypes {
    types: BTreeSet<String>,
}

impl SupportedWalletTypes {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, wallet_type: &str) -> bool {
        self.types.contains(wallet_type)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(String::as_str)
    }

    /// Keep only descriptors whose type has a plugin, preserving input order
    pub fn filter(&self, key_infos: &[KeyInfo]) -> Vec<KeyInfo> {
        key_infos
            .iter()
            .filter(|info| self.contains(&info.wallet_type))
            .cloned()
            .collect()
    }
}

impl Default for SupportedWalletTypes {
    fn default() -> Self {
        Self::new([DEFAULT_WALLET_TYPE])
    }
}
