//! Panel-side process gateway
//!
//! All yarn, artisan, and shell-script invocations go through the
//! [`ProcessGateway`] trait so transactions can run against a spy in
//! tests. Gateway calls are best-effort: a failed command resolves to
//! `Ok(false)` and the transaction keeps going. Only a failure to
//! spawn at all surfaces as an error.

use anyhow::{Context, Result};
use async_trait::async_trait;
use brokkr_core::{ENGINE, ENGINE_VERSION};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncBufReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Environment handed to addon install/remove/update scripts
#[derive(Debug, Clone)]
pub struct ScriptEnv {
    pub tmp_dir: PathBuf,
    pub addon_target: String,
    pub addon_identifier: String,
    pub addon_version: String,
    pub panel_directory: PathBuf,
}

impl ScriptEnv {
    fn apply(&self, cmd: &mut Command) {
        cmd.env("ENGINE", ENGINE)
            .env("ENGINE_VERSION", ENGINE_VERSION)
            .env("ENGINE_DEVELOPER", "false")
            .env("ENGINE_TMP", &self.tmp_dir)
            .env("ADDON_TARGET", &self.addon_target)
            .env("ADDON_IDENTIFIER", &self.addon_identifier)
            .env("ADDON_VERSION", &self.addon_version)
            .env("PANEL_DIRECTORY", &self.panel_directory);
    }
}

/// External commands a transaction may need
#[async_trait]
pub trait ProcessGateway: Send + Sync {
    async fn install_dependencies(&self, panel_dir: &Path) -> Result<bool>;
    async fn build_assets(&self, panel_dir: &Path) -> Result<bool>;
    async fn run_migrations(&self, panel_dir: &Path, migrations_dir: &Path) -> Result<bool>;
    async fn rollback_migrations(&self, panel_dir: &Path, migrations_dir: &Path) -> Result<bool>;
    async fn run_addon_script(&self, script: &Path, env: &ScriptEnv) -> Result<bool>;
    async fn clear_caches(&self, panel_dir: &Path) -> Result<bool>;
    async fn fix_permissions(&self, panel_dir: &Path) -> Result<bool>;
}

/// Gateway backed by real shell commands
pub struct ShellGateway;

impl ShellGateway {
    pub fn new() -> Self {
        Self
    }

    /// Spawn a command, stream its stdout at debug level, and report
    /// whether it exited cleanly
    async fn run(&self, mut cmd: Command, label: &str) -> Result<bool> {
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .context(format!("failed to spawn {}", label))?;

        // both pipes must be drained or a chatty child blocks on write
        if let Some(stdout) = child.stdout.take() {
            let reader = tokio::io::BufReader::new(stdout);
            let mut lines = reader.lines();
            let label = label.to_string();

            tokio::spawn(async move {
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("{}: {}", label, line);
                }
            });
        }

        if let Some(stderr) = child.stderr.take() {
            let reader = tokio::io::BufReader::new(stderr);
            let mut lines = reader.lines();
            let label = label.to_string();

            tokio::spawn(async move {
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("{}: {}", label, line);
                }
            });
        }

        let status = child
            .wait()
            .await
            .context(format!("failed to wait for {}", label))?;

        if !status.success() {
            warn!("{} exited with {}", label, status);
        }

        Ok(status.success())
    }
}

impl Default for ShellGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessGateway for ShellGateway {
    async fn install_dependencies(&self, panel_dir: &Path) -> Result<bool> {
        let mut cmd = Command::new("yarn");
        cmd.arg("install").current_dir(panel_dir);
        self.run(cmd, "yarn install").await
    }

    async fn build_assets(&self, panel_dir: &Path) -> Result<bool> {
        let mut cmd = Command::new("yarn");
        cmd.arg("build:production")
            .current_dir(panel_dir)
            .env("NODE_OPTIONS", "--openssl-legacy-provider");
        self.run(cmd, "yarn build:production").await
    }

    async fn run_migrations(&self, panel_dir: &Path, migrations_dir: &Path) -> Result<bool> {
        let mut cmd = Command::new("php");
        cmd.arg("artisan")
            .arg("migrate")
            .arg(format!("--path={}", migrations_dir.display()))
            .arg("--force")
            .current_dir(panel_dir);
        self.run(cmd, "artisan migrate").await
    }

    async fn rollback_migrations(&self, panel_dir: &Path, migrations_dir: &Path) -> Result<bool> {
        let mut cmd = Command::new("php");
        cmd.arg("artisan")
            .arg("migrate:rollback")
            .arg(format!("--path={}", migrations_dir.display()))
            .arg("--force")
            .current_dir(panel_dir);
        self.run(cmd, "artisan migrate:rollback").await
    }

    async fn run_addon_script(&self, script: &Path, env: &ScriptEnv) -> Result<bool> {
        let mut cmd = Command::new("bash");
        cmd.arg(script);
        if let Some(parent) = script.parent() {
            cmd.current_dir(parent);
        }
        env.apply(&mut cmd);
        self.run(cmd, "addon script").await
    }

    async fn clear_caches(&self, panel_dir: &Path) -> Result<bool> {
        for args in [
            ["route:clear"].as_slice(),
            ["config:clear"].as_slice(),
            ["view:clear"].as_slice(),
            ["optimize"].as_slice(),
        ] {
            let mut cmd = Command::new("php");
            cmd.arg("artisan").args(args).current_dir(panel_dir);
            if !self.run(cmd, "artisan cache").await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn fix_permissions(&self, panel_dir: &Path) -> Result<bool> {
        let mut cmd = Command::new("chown");
        cmd.arg("-R")
            .arg("www-data:www-data")
            .arg(panel_dir.join("storage"))
            .arg(panel_dir.join("bootstrap/cache"));
        self.run(cmd, "chown").await
    }
}
