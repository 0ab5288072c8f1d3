use std::fs;
use std::path::{Path, PathBuf};

use super::models::AccountMetadata;
use super::KeyRegistry;
use crate::config::DEFAULT_DATA_DIR;
use crate::error::{LifecycleError, StorageError};
use crate::key_info::KeyInfo;
use crate::ui_state::UiWalletStore;

const METADATA_FILE: &str = "account.json";
const KEYS_FILE: &str = "keys.json";
const UI_STATE_FILE: &str = "ui_state.json";

#[derive(Debug, Clone)]
pub struct Storage {
    base_path: PathBuf,
}

impl Storage {
    /// Create a new storage instance with the default base directory ("./wallets")
    pub fn new() -> Self {
        Self {
            base_path: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }

    /// Create storage with custom base directory (for testing)
    pub fn new_with_base_dir(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_path
    }

    /// Directory holding everything for one account
    pub fn account_dir(&self, account: &str) -> PathBuf {
        self.base_path.join(account)
    }

    pub fn account_exists(&self, account: &str) -> bool {
        self.account_dir(account).join(METADATA_FILE).exists()
    }

    /// Create the account directory and metadata if missing; returns the metadata
    pub fn ensure_account(&self, account: &str) -> Result<AccountMetadata, StorageError> {
        if self.account_exists(account) {
            return self.load_metadata(account);
        }
        fs::create_dir_all(self.account_dir(account))?;
        let meta = AccountMetadata::new(account);
        self.save_metadata(account, &meta)?;
        log::info!("Created storage for account '{}'", account);
        Ok(meta)
    }

    pub fn save_metadata(&self, account: &str, meta: &AccountMetadata) -> Result<(), StorageError> {
        write_json(&self.account_dir(account).join(METADATA_FILE), meta)
    }

    pub fn load_metadata(&self, account: &str) -> Result<AccountMetadata, StorageError> {
        read_json(&self.account_dir(account).join(METADATA_FILE))
    }

    /// Save the account's key descriptor list
    pub fn save_key_infos(&self, account: &str, key_infos: &[KeyInfo]) -> Result<(), StorageError> {
        fs::create_dir_all(self.account_dir(account))?;
        write_json(&self.account_dir(account).join(KEYS_FILE), &key_infos)
    }

    /// Load the account's key descriptors; a missing file means no keys yet
    pub fn load_key_infos(&self, account: &str) -> Result<Vec<KeyInfo>, StorageError> {
        let path = self.account_dir(account).join(KEYS_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        read_json(&path)
    }

    pub fn save_ui_state(&self, account: &str, ui: &UiWalletStore) -> Result<(), StorageError> {
        fs::create_dir_all(self.account_dir(account))?;
        write_json(&self.account_dir(account).join(UI_STATE_FILE), ui)
    }

    /// Load the persisted UI projection, or an empty one if none was saved
    pub fn load_ui_state(&self, account: &str) -> Result<UiWalletStore, StorageError> {
        let path = self.account_dir(account).join(UI_STATE_FILE);
        if !path.exists() {
            return Ok(UiWalletStore::default());
        }
        read_json(&path)
    }

    pub fn list_accounts(&self) -> Result<Vec<String>, StorageError> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }

        let mut accounts = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.join(METADATA_FILE).exists() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    accounts.push(name.to_string());
                }
            }
        }
        accounts.sort();
        Ok(accounts)
    }

    pub fn delete_account(&self, account: &str) -> Result<(), StorageError> {
        let dir = self.account_dir(account);
        if !dir.exists() {
            return Err(StorageError::FileNotFound(dir.display().to_string()));
        }
        log::warn!("Deleting account directory: {:?}", dir);
        fs::remove_dir_all(&dir)?;
        Ok(())
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyRegistry for Storage {
    fn list_key_infos(&self, account: &str) -> Result<Vec<KeyInfo>, LifecycleError> {
        if !self.account_exists(account) {
            return Err(LifecycleError::AccountNotFound(account.to_string()));
        }
        Ok(self.load_key_infos(account)?)
    }
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    if !path.exists() {
        return Err(StorageError::FileNotFound(path.display().to_string()));
    }
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
