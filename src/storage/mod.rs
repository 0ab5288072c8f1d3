//! Storage and persistence layer
//!
//! - Account key lists (the file-backed key registry)
//! - Persisted UI projection
//! - Account metadata

mod file_system;
mod models;

pub use file_system::Storage;
pub use models::AccountMetadata;

use crate::error::LifecycleError;
use crate::key_info::KeyInfo;

/// Authoritative source of an account's key descriptors
pub trait KeyRegistry: Send + Sync {
    fn list_key_infos(&self, account: &str) -> Result<Vec<KeyInfo>, LifecycleError>;
}
