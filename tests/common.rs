//! Common test utilities for wallet lifecycle integration tests
//!
//! This module provides shared test infrastructure including:
//! - A scriptable in-memory wallet engine factory
//! - Gates that hold engine construction until released
//! - A listener that records transitions in order
//! - Storage-backed test environments with automatic cleanup

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Notify;

use wallet_lifecycle::{
    EngineContext, EngineError, KeyInfo, LifecycleConfig, LifecycleListener, Storage, Transition,
    WalletEngine, WalletEngineFactory, WalletHandle, WalletManager, DEFAULT_WALLET_TYPE,
};

/// Load environment variables from .env file
pub fn load_env() {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push(".env");
    dotenv::from_path(&path).ok();
}

pub fn init_logging() {
    load_env();
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

/// Let detached teardown tasks run
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

pub fn key(id: &str, sort_index: i64) -> KeyInfo {
    KeyInfo::new(id, DEFAULT_WALLET_TYPE, sort_index)
}

// ============================================================================
// Mock engine factory
// ============================================================================

#[derive(Default)]
pub struct MockState {
    pub constructed: Mutex<Vec<String>>,
    pub started: Mutex<Vec<String>>,
    pub archived: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
    fail_construct: Mutex<HashSet<String>>,
    fail_start: Mutex<HashSet<String>>,
    fail_teardown: Mutex<bool>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

#[derive(Clone, Default)]
pub struct MockFactory {
    pub state: Arc<MockState>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_construct(&self, id: &str) {
        self.state.fail_construct.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_start(&self, id: &str) {
        self.state.fail_start.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_teardown(&self) {
        *self.state.fail_teardown.lock().unwrap() = true;
    }

    /// Hold construction of `id` until [`Self::release`] is called
    pub fn gate(&self, id: &str) {
        self.state
            .gates
            .lock()
            .unwrap()
            .insert(id.to_string(), Arc::new(Notify::new()));
    }

    pub fn release(&self, id: &str) {
        if let Some(gate) = self.state.gates.lock().unwrap().get(id) {
            gate.notify_one();
        }
    }

    pub fn constructed(&self) -> Vec<String> {
        self.state.constructed.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<String> {
        self.state.started.lock().unwrap().clone()
    }

    pub fn archived(&self) -> Vec<String> {
        self.state.archived.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.deleted.lock().unwrap().clone()
    }

    pub fn as_factory(&self) -> Arc<dyn WalletEngineFactory> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl WalletEngineFactory for MockFactory {
    async fn make_wallet(
        &self,
        key_info: &KeyInfo,
        _context: &EngineContext,
    ) -> Result<WalletHandle, EngineError> {
        let gate = self.state.gates.lock().unwrap().get(&key_info.id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.state
            .constructed
            .lock()
            .unwrap()
            .push(key_info.id.clone());

        if self.state.fail_construct.lock().unwrap().contains(&key_info.id) {
            return Err(EngineError::construction(&key_info.id, "plugin rejected key"));
        }

        Ok(Arc::new(MockEngine {
            id: key_info.id.clone(),
            state: self.state.clone(),
        }))
    }
}

#[derive(Debug)]
pub struct MockEngine {
    id: String,
    state: Arc<MockState>,
}

impl std::fmt::Debug for MockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockState").finish_non_exhaustive()
    }
}

impl MockEngine {
    fn teardown_result(&self) -> Result<(), EngineError> {
        if *self.state.fail_teardown.lock().unwrap() {
            return Err(EngineError::teardown(&self.id, "engine already gone"));
        }
        Ok(())
    }
}

#[async_trait]
impl WalletEngine for MockEngine {
    fn id(&self) -> &str {
        &self.id
    }

    async fn start(&self) -> Result<(), EngineError> {
        if self.state.fail_start.lock().unwrap().contains(&self.id) {
            return Err(EngineError::start(&self.id, "sync failed"));
        }
        self.state.started.lock().unwrap().push(self.id.clone());
        Ok(())
    }

    async fn archive(&self) -> Result<(), EngineError> {
        self.state.archived.lock().unwrap().push(self.id.clone());
        self.teardown_result()
    }

    async fn delete(&self) -> Result<(), EngineError> {
        self.state.deleted.lock().unwrap().push(self.id.clone());
        self.teardown_result()
    }
}

// ============================================================================
// Transition recording
// ============================================================================

#[derive(Clone, Default)]
pub struct RecordingListener {
    pub events: Arc<Mutex<Vec<(String, Transition)>>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<(String, Transition)> {
        self.events.lock().unwrap().clone()
    }
}

impl LifecycleListener for RecordingListener {
    fn on_transition(&mut self, id: &str, transition: Transition) {
        self.events.lock().unwrap().push((id.to_string(), transition));
    }
}

// ============================================================================
// Storage-backed environment
// ============================================================================

/// Test environment with automatic cleanup
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub factory: MockFactory,
    pub manager: WalletManager,
}

impl TestEnvironment {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(LifecycleConfig::default())
    }

    pub fn with_config(config: LifecycleConfig) -> anyhow::Result<Self> {
        let temp_dir = TempDir::new()?;
        log::info!("📁 Test directory: {:?}", temp_dir.path());

        let storage = Storage::new_with_base_dir(temp_dir.path().to_path_buf());
        let factory = MockFactory::new();
        let manager = WalletManager::new_with_storage(factory.as_factory(), storage, config);

        Ok(Self {
            temp_dir,
            factory,
            manager,
        })
    }

    /// Write an account's key list the way the key registry would
    pub fn write_keys(&self, account: &str, keys: &[KeyInfo]) -> anyhow::Result<()> {
        self.manager.storage.ensure_account(account)?;
        self.manager.storage.save_key_infos(account, keys)?;
        Ok(())
    }
}
