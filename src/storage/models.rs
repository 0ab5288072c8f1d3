//! Data models for account storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMetadata {
    pub account: String,
    pub created_at: DateTime<Utc>,
    pub last_reconciled_at: Option<DateTime<Utc>>,
}

impl AccountMetadata {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            created_at: Utc::now(),
            last_reconciled_at: None,
        }
    }
}
