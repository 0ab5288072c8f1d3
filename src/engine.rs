//! Wallet engine collaborators
//!
//! Engines (network sync, balance tracking) live outside this crate. The
//! reconciler only constructs, starts and tears them down through these traits.

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::EngineError;
use crate::key_info::{AccountId, KeyInfo};

/// Shared handle to a running wallet engine
pub type WalletHandle = Arc<dyn WalletEngine>;

/// A constructed wallet engine
#[async_trait]
pub trait WalletEngine: Send + Sync + fmt::Debug {
    /// Id of the key descriptor this engine was built from
    fn id(&self) -> &str;

    /// Start network sync; activation completes only once this succeeds
    async fn start(&self) -> Result<(), EngineError>;

    /// Stop the engine and keep its data (archive)
    async fn archive(&self) -> Result<(), EngineError>;

    /// Stop the engine and drop its data (delete)
    async fn delete(&self) -> Result<(), EngineError>;
}

/// Builds engines from key descriptors
#[async_trait]
pub trait WalletEngineFactory: Send + Sync {
    async fn make_wallet(
        &self,
        key_info: &KeyInfo,
        context: &EngineContext,
    ) -> Result<WalletHandle, EngineError>;
}

/// Everything an engine needs besides its own descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineContext {
    pub account: AccountId,
    /// Per-account directory engines may use for their own state
    pub data_dir: PathBuf,
}

impl EngineContext {
    pub fn new(account: impl Into<AccountId>, data_dir: PathBuf) -> Self {
        Self {
            account: account.into(),
            data_dir,
        }
    }
}

/// Which teardown a detached request performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownKind {
    Archive,
    Delete,
}

impl fmt::Display for TeardownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Archive => write!(f, "archive"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Issue a teardown request without waiting for it
///
/// The outcome is only logged; callers update local state immediately.
pub fn spawn_teardown(handle: WalletHandle, kind: TeardownKind) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let result = match kind {
            TeardownKind::Archive => handle.archive().await,
            TeardownKind::Delete => handle.delete().await,
        };
        match result {
            Ok(()) => log::debug!("Wallet {} {} request completed", handle.id(), kind),
            Err(e) => log::warn!("Wallet {} {} request failed (ignored): {}", handle.id(), kind, e),
        }
    })
}
