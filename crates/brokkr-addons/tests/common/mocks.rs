//! Spy gateway recording every external call instead of shelling out

use anyhow::Result;
use async_trait::async_trait;
use brokkr_addons::{ProcessGateway, ScriptEnv};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Records call names and addon script file names; every call succeeds
#[derive(Clone, Default)]
pub struct SpyGateway {
    calls: Arc<Mutex<Vec<String>>>,
    scripts: Arc<Mutex<Vec<String>>>,
    script_targets: Arc<Mutex<Vec<String>>>,
    migration_dirs: Arc<Mutex<Vec<String>>>,
}

impl SpyGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times a gateway method was invoked
    pub fn count(&self, call: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == call)
            .count()
    }

    /// File names of every addon script run, in order
    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }

    /// ADDON_TARGET value handed to each addon script, in order
    pub fn script_targets(&self) -> Vec<String> {
        self.script_targets.lock().unwrap().clone()
    }

    /// Directory names passed to run_migrations, in order
    pub fn migration_dirs(&self) -> Vec<String> {
        self.migration_dirs.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl ProcessGateway for SpyGateway {
    async fn install_dependencies(&self, _panel_dir: &Path) -> Result<bool> {
        self.record("install_dependencies");
        Ok(true)
    }

    async fn build_assets(&self, _panel_dir: &Path) -> Result<bool> {
        self.record("build_assets");
        Ok(true)
    }

    async fn run_migrations(&self, _panel_dir: &Path, migrations_dir: &Path) -> Result<bool> {
        self.record("run_migrations");
        if let Some(name) = migrations_dir.file_name() {
            self.migration_dirs
                .lock()
                .unwrap()
                .push(name.to_string_lossy().into_owned());
        }
        Ok(true)
    }

    async fn rollback_migrations(&self, _panel_dir: &Path, _migrations_dir: &Path) -> Result<bool> {
        self.record("rollback_migrations");
        Ok(true)
    }

    async fn run_addon_script(&self, script: &Path, env: &ScriptEnv) -> Result<bool> {
        self.record("run_addon_script");
        if let Some(name) = script.file_name() {
            self.scripts
                .lock()
                .unwrap()
                .push(name.to_string_lossy().into_owned());
        }
        self.script_targets
            .lock()
            .unwrap()
            .push(env.addon_target.clone());
        Ok(true)
    }

    async fn clear_caches(&self, _panel_dir: &Path) -> Result<bool> {
        self.record("clear_caches");
        Ok(true)
    }

    async fn fix_permissions(&self, _panel_dir: &Path) -> Result<bool> {
        self.record("fix_permissions");
        Ok(true)
    }
}
