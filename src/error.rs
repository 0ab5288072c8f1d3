//! Error types for wallet lifecycle operations
//!
//! Engine failures are kept apart from storage and account errors: the
//! reconciler reports the former per wallet and never aborts a pass on them.

use thiserror::Error;

/// Failure reported by a wallet engine or its factory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Engine construction failed for wallet {id}: {reason}")]
    Construction { id: String, reason: String },

    #[error("Engine start failed for wallet {id}: {reason}")]
    Start { id: String, reason: String },

    #[error("Engine teardown failed for wallet {id}: {reason}")]
    Teardown { id: String, reason: String },

    #[error("Engine activation timed out for wallet {id} after {secs}s")]
    TimedOut { id: String, secs: u64 },
}

impl EngineError {
    /// Create a construction failed error
    pub fn construction(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Construction {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a start failed error
    pub fn start(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Start {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a teardown failed error
    pub fn teardown(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Teardown {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Key registry error: {0}")]
    KeyRegistry(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),
}
