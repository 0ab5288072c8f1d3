//! Lifecycle configuration
//!
//! Supported wallet types, data directory and activation timeout, loaded from
//! the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::LifecycleError;
use crate::key_info::{SupportedWalletTypes, DEFAULT_WALLET_TYPE};

pub const DEFAULT_DATA_DIR: &str = "./wallets";

#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Wallet types with a currency plugin available
    pub supported_types: SupportedWalletTypes,
    /// Base directory for account key lists and UI state
    pub data_dir: PathBuf,
    /// Give up on engine construction after this long (None waits forever)
    pub activation_timeout: Option<Duration>,
}

impl LifecycleConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `SUPPORTED_WALLET_TYPES`: comma-separated type tags (default `wallet:shitcoin`)
    /// - `WALLET_DATA_DIR`: storage base directory (default `./wallets`)
    /// - `ACTIVATION_TIMEOUT_SECS`: optional activation timeout in seconds
    ///
    /// # Examples
    ///
    /// ```bash
    /// SUPPORTED_WALLET_TYPES=wallet:shitcoin,wallet:bitcoin ACTIVATION_TIMEOUT_SECS=30 cargo test
    /// ```
    pub fn from_env() -> Result<Self, LifecycleError> {
        let supported_types = match env::var("SUPPORTED_WALLET_TYPES") {
            Ok(raw) => parse_wallet_types(&raw)?,
            Err(_) => SupportedWalletTypes::default(),
        };
        log::info!(
            "Supported wallet types: {}",
            supported_types.iter().collect::<Vec<_>>().join(", ")
        );

        let data_dir = env::var("WALLET_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        log::info!("Wallet data directory: {}", data_dir.display());

        let activation_timeout = match env::var("ACTIVATION_TIMEOUT_SECS") {
            Ok(raw) => Some(parse_timeout(&raw)?),
            Err(_) => None,
        };
        if let Some(timeout) = activation_timeout {
            log::info!("Activation timeout: {}s", timeout.as_secs());
        }

        Ok(Self {
            supported_types,
            data_dir,
            activation_timeout,
        })
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            supported_types: SupportedWalletTypes::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            activation_timeout: None,
        }
    }
}

fn parse_wallet_types(raw: &str) -> Result<SupportedWalletTypes, LifecycleError> {
    let types: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if types.is_empty() {
        log::warn!("SUPPORTED_WALLET_TYPES is empty, defaulting to {}", DEFAULT_WALLET_TYPE);
        return Ok(SupportedWalletTypes::default());
    }
    if let Some(bad) = types.iter().find(|t| !t.starts_with("wallet:")) {
        return Err(LifecycleError::Config(format!(
            "wallet type '{}' must start with 'wallet:'",
            bad
        )));
    }
    Ok(SupportedWalletTypes::new(types))
}

fn parse_timeout(raw: &str) -> Result<Duration, LifecycleError> {
    let secs: u64 = raw.trim().parse().map_err(|_| {
        LifecycleError::Config(format!("ACTIVATION_TIMEOUT_SECS '{}' is not a number", raw))
    })?;
    if secs == 0 {
        return Err(LifecycleError::Config(
            "ACTIVATION_TIMEOUT_SECS must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}
