//! Wallet Lifecycle: key-list driven wallet engine orchestration
//!
//! This crate keeps the set of running wallet engines in line with an
//! account's key descriptors, and holds the headless state of the dual-currency
//! "flip" amount input.
//!
//! # Architecture
//!
//! - **Transition Plan**: pure diff of key descriptors against active wallet ids
//! - **Lifecycle Reconciler**: activates, archives and deletes engines, updating
//!   the core registry and UI projection together
//! - **Wallet Manager**: account bootstrap and persistence on top of the reconciler
//! - **Flip Input**: two-way amount binding between two currencies
//!
//! Wallet engines, decimal math and locale formatting are external and are
//! plugged in through traits.
//!
//! # Example
//!
//! ```ignore
//! use wallet_lifecycle::{KeyInfo, WalletManager, Storage, LifecycleConfig};
//!
//! let storage = Storage::new_with_base_dir("./wallets".into());
//! storage.ensure_account("alice")?;
//! storage.save_key_infos("alice", &[KeyInfo::new("wallet-1", "wallet:shitcoin", 0)])?;
//!
//! let manager = WalletManager::new_with_storage(factory, storage, LifecycleConfig::default());
//! let report = manager.initialize_account("alice").await?;
//! assert_eq!(report.activated, vec!["wallet-1"]);
//! ```

// Public modules
pub mod config;
pub mod engine;
pub mod error;
pub mod flip_input;
pub mod key_info;
pub mod manager;
pub mod observer;
pub mod plan;
pub mod reconciler;
pub mod registry;
pub mod storage;
pub mod ui_state;

// Re-exports for convenience
pub use config::LifecycleConfig;
pub use engine::{spawn_teardown, EngineContext, TeardownKind, WalletEngine, WalletEngineFactory, WalletHandle};
pub use error::{EngineError, LifecycleError, StorageError};
pub use flip_input::{
    truncate_decimals, ExchangeMath, FlipFace, FlipInput, FlipInputFieldInfo, FlipInputProps,
    FlipInputState, FlipRow, FlipTransition, LocaleFormat,
};
pub use key_info::{AccountId, KeyInfo, SupportedWalletTypes, WalletId, DEFAULT_WALLET_TYPE};
pub use manager::WalletManager;
pub use observer::{CoreWalletObserver, LifecycleListener, Transition, UiWalletObserver};
pub use plan::{prepare_key_infos, TransitionPlan};
pub use reconciler::{
    ActivationFailure, ActivationOutcome, ReconcileReport, SharedStores, WalletLifecycleReconciler,
    WalletStores,
};
pub use registry::{ActiveWallet, ActiveWalletRegistry};
pub use storage::{AccountMetadata, KeyRegistry, Storage};
pub use ui_state::{UiWalletStore, WalletVisibility};

// Common result type
pub type Result<T> = std::result::Result<T, LifecycleError>;
