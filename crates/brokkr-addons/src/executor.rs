//! Transaction executor
//!
//! Drives install, remove, and upgrade transactions over an install root.
//! A transaction moves through a fixed sequence of states and either
//! finishes with a [`TransactionLog`] or stops at a [`PendingTransaction`]
//! when a dashboard route needs operator confirmation. There is no
//! rollback: a failure leaves whatever was already applied in place.

use crate::archive::PackageArchive;
use crate::placeholders::{self, capitalize};
use crate::process::{ProcessGateway, ScriptEnv};
use crate::record::{copy_dir_recursive, force_symlink, InstallRoot};
use crate::routes::{self, RouteTable};
use crate::steps::{self, PendingManualStep, RouteAction, StepApplied, StepRecord};
use anyhow::{Context, Result};
use brokkr_core::types::{
    has_package_extension, parse_config, parse_console_config, parse_manifest, AddonConfig,
    AddonManifest, Flag, PathContext, Step,
};
use brokkr_core::{check_requirement, Error};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// In the smooth rebuild the previous asset snapshot is restored this
/// long after the build starts, so the panel never serves a half-built
/// asset directory
const SMOOTH_RESTORE_DELAY: Duration = Duration::from_millis(1800);

const DEFAULT_ADMIN_CONTROLLER: &str = r#"<?php

namespace App\Http\Controllers\Admin\Addons\__ID__;

use App\Http\Controllers\Controller;

class __CLASS__Controller extends Controller
{
    public function index()
    {
        return view('admin.addons.__ID__.index');
    }
}
"#;

/// Transaction phases in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Idle,
    Validating,
    Unpacking,
    Linking,
    Patching,
    StepReplay,
    ExternalBuild,
    Finalizing,
    Done,
    Failed,
}

impl std::fmt::Display for TxState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TxState::Idle => "idle",
            TxState::Validating => "validating",
            TxState::Unpacking => "unpacking",
            TxState::Linking => "linking",
            TxState::Patching => "patching",
            TxState::StepReplay => "step-replay",
            TxState::ExternalBuild => "external-build",
            TxState::Finalizing => "finalizing",
            TxState::Done => "done",
            TxState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Ordered record of everything a transaction did
#[derive(Debug, Default)]
pub struct TransactionLog {
    records: Vec<StepRecord>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    pub force: bool,
    pub skip_steps: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RemoveOptions {
    /// Roll the addon's migrations back before deleting them
    pub migrate: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpgradeOptions {
    pub skip_steps: bool,
}

/// Parsed metadata of a package, no side effects
#[derive(Debug)]
pub struct PackageProbe {
    pub manifest: AddonManifest,
    pub config: AddonConfig,
}

/// Outcome of driving a transaction as far as it can go without input
#[derive(Debug)]
pub enum TransactionFlow {
    Done(TransactionLog),
    Pending(PendingTransaction),
}

/// A transaction suspended on a manual route edit. Feed the operator's
/// answer back through [`AddonEngine::resume`].
#[derive(Debug)]
pub struct PendingTransaction {
    pub manual: PendingManualStep,
    cont: Continuation,
}

#[derive(Debug)]
enum Continuation {
    Install(InstallCont),
    Remove(RemoveCont),
}

#[derive(Debug)]
struct InstallCont {
    manifest: AddonManifest,
    config: AddonConfig,
    scratch: TempDir,
    package_path: PathBuf,
    remaining: VecDeque<Step>,
    log: TransactionLog,
}

#[derive(Debug)]
struct RemoveCont {
    config: AddonConfig,
    // keeps bundle-rooted step paths alive while suspended
    _scratch: TempDir,
    remaining: VecDeque<Step>,
    log: TransactionLog,
    follow_up: Option<FollowUpInstall>,
}

#[derive(Debug)]
struct FollowUpInstall {
    package: PathBuf,
    options: InstallOptions,
}

struct ValidatedPackage {
    manifest: AddonManifest,
    config: AddonConfig,
    scratch: TempDir,
}

/// The engine. Generic over the process gateway so tests can count
/// external calls instead of shelling out.
pub struct AddonEngine<G: ProcessGateway> {
    root: InstallRoot,
    gateway: G,
    state: TxState,
}

impl<G: ProcessGateway> AddonEngine<G> {
    pub fn new(root: InstallRoot, gateway: G) -> Self {
        Self {
            root,
            gateway,
            state: TxState::Idle,
        }
    }

    pub fn root(&self) -> &InstallRoot {
        &self.root
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    /// Parse a package without touching the install root
    pub fn probe(&self, package: &Path) -> Result<PackageProbe> {
        let validated = self.validate_package(package)?;
        Ok(PackageProbe {
            manifest: validated.manifest,
            config: validated.config,
        })
    }

    pub async fn install(
        &mut self,
        package: &Path,
        options: &InstallOptions,
    ) -> Result<TransactionFlow> {
        let result = self
            .install_inner(package, options, TransactionLog::new())
            .await;
        if result.is_err() {
            self.state = TxState::Failed;
        }
        result
    }

    pub async fn remove(&mut self, id: &str, options: &RemoveOptions) -> Result<TransactionFlow> {
        let result = self.remove_inner(id, options, None).await;
        if result.is_err() {
            self.state = TxState::Failed;
        }
        result
    }

    pub async fn upgrade(
        &mut self,
        package: &Path,
        options: &UpgradeOptions,
    ) -> Result<TransactionFlow> {
        let result = self.upgrade_inner(package, options).await;
        if result.is_err() {
            self.state = TxState::Failed;
        }
        result
    }

    /// Continue a suspended transaction with the operator's answer.
    /// Declining aborts; rerunning the command resumes from scratch.
    pub async fn resume(
        &mut self,
        pending: PendingTransaction,
        confirmed: bool,
    ) -> Result<TransactionFlow> {
        let PendingTransaction { manual, cont } = pending;

        if !confirmed {
            self.state = TxState::Failed;
            return Err(Error::Cancelled.into());
        }

        let verb = match manual.action {
            RouteAction::Add => "add",
            RouteAction::Remove => "remove",
        };
        let record = StepRecord::done(format!("route {} {} (confirmed)", verb, manual.route.name));

        let result = match cont {
            Continuation::Install(mut c) => {
                c.log.push(record);
                match self.replay(&c.config, RouteAction::Add, &mut c.remaining, &mut c.log)? {
                    Some(next) => Ok(TransactionFlow::Pending(PendingTransaction {
                        manual: next,
                        cont: Continuation::Install(c),
                    })),
                    None => self.finish_install(c).await,
                }
            }
            Continuation::Remove(mut c) => {
                c.log.push(record);
                match self.replay(&c.config, RouteAction::Remove, &mut c.remaining, &mut c.log)? {
                    Some(next) => Ok(TransactionFlow::Pending(PendingTransaction {
                        manual: next,
                        cont: Continuation::Remove(c),
                    })),
                    None => self.finish_remove(c).await,
                }
            }
        };

        if result.is_err() {
            self.state = TxState::Failed;
        }
        result
    }

    /// Reinstall frontend dependencies and rebuild panel assets. With
    /// `smooth` the previous asset build is restored shortly after the
    /// build starts so the panel keeps serving while it runs.
    pub async fn rebuild(&self, smooth: bool) -> Result<bool> {
        let panel = self.root.path().to_path_buf();

        if !self.gateway.install_dependencies(&panel).await? {
            return Ok(false);
        }

        if smooth {
            let assets = self.root.built_assets_dir();
            let snapshot = TempDir::new()?;
            if assets.exists() {
                copy_dir_recursive(&assets, snapshot.path())?;
            }

            let build = self.gateway.build_assets(&panel);
            let restore = async {
                tokio::time::sleep(SMOOTH_RESTORE_DELAY).await;
                if let Err(err) = copy_dir_recursive(snapshot.path(), &assets) {
                    warn!("asset snapshot restore failed: {}", err);
                }
            };

            let (built, ()) = tokio::join!(build, restore);
            built
        } else {
            self.gateway.build_assets(&panel).await
        }
    }

    // Validation

    fn validate_package(&self, package: &Path) -> Result<ValidatedPackage> {
        if !package.exists() {
            return Err(Error::file_not_found(package.display().to_string()).into());
        }
        if !has_package_extension(package) {
            return Err(Error::wrong_file_type(package.display().to_string()).into());
        }

        let archive = PackageArchive::open(package)?;
        let manifest_json = archive.read_text("manifest.json")?;
        let bundle = archive.bundle()?;

        let scratch = TempDir::new().context("failed to create scratch directory")?;
        bundle.extract_all(scratch.path())?;

        let ctx = PathContext::new(scratch.path(), self.root.path());
        let manifest = parse_manifest(&manifest_json, &ctx)?;

        let conf = bundle.read_text("conf.yml")?;
        let config = parse_config(&conf, &[])?;

        if config.info.identifier != manifest.id {
            return Err(Error::invalid_package(format!(
                "config identifies as {}, manifest says {}",
                config.info.identifier, manifest.id
            ))
            .into());
        }

        check_requirement(&manifest.requirement)?;

        Ok(ValidatedPackage {
            manifest,
            config,
            scratch,
        })
    }

    // Install

    async fn install_inner(
        &mut self,
        package: &Path,
        options: &InstallOptions,
        mut log: TransactionLog,
    ) -> Result<TransactionFlow> {
        self.state = TxState::Validating;
        let validated = self.validate_package(package)?;
        let id = validated.manifest.id.clone();

        if self.root.is_installed(&id) && !options.force {
            return Err(Error::already_installed(&id).into());
        }

        info!("installing {} {}", id, validated.config.info.version);

        self.state = TxState::Unpacking;
        self.unpack(&validated.config, validated.scratch.path())?;
        log.push(StepRecord::done(format!("unpack {}", id)));

        self.state = TxState::Linking;
        self.link(&validated.config, validated.scratch.path())?;
        log.push(StepRecord::done(format!("link {}", id)));

        self.state = TxState::Patching;
        self.patch(&validated.config)?;

        // the install script runs before step replay so steps can rely on
        // files it creates
        self.state = TxState::ExternalBuild;
        self.run_install_script(&validated.config, validated.scratch.path(), &mut log)
            .await?;

        self.state = TxState::StepReplay;
        let mut remaining: VecDeque<Step> = if options.skip_steps {
            VecDeque::new()
        } else {
            validated.manifest.installation.iter().cloned().collect()
        };

        if let Some(manual) =
            self.replay(&validated.config, RouteAction::Add, &mut remaining, &mut log)?
        {
            return Ok(TransactionFlow::Pending(PendingTransaction {
                manual,
                cont: Continuation::Install(InstallCont {
                    manifest: validated.manifest,
                    config: validated.config,
                    scratch: validated.scratch,
                    package_path: package.to_path_buf(),
                    remaining,
                    log,
                }),
            }));
        }

        self.finish_install(InstallCont {
            manifest: validated.manifest,
            config: validated.config,
            scratch: validated.scratch,
            package_path: package.to_path_buf(),
            remaining,
            log,
        })
        .await
    }

    async fn finish_install(&mut self, cont: InstallCont) -> Result<TransactionFlow> {
        let InstallCont {
            manifest,
            config,
            package_path,
            mut log,
            ..
        } = cont;
        let id = &manifest.id;

        if config
            .database
            .as_ref()
            .is_some_and(|db| db.migrations.is_some())
        {
            let ok = self
                .gateway
                .run_migrations(self.root.path(), &self.root.migrations_dir(id))
                .await?;
            log.push(gateway_record("migrate", ok));
        }

        self.state = TxState::Finalizing;
        std::fs::copy(&package_path, self.root.package_file(id))
            .context("failed to persist package into the record")?;

        let cleared = self.gateway.clear_caches(self.root.path()).await?;
        log.push(gateway_record("clear caches", cleared));
        let fixed = self.gateway.fix_permissions(self.root.path()).await?;
        log.push(gateway_record("fix permissions", fixed));

        info!("installed {}", id);
        self.state = TxState::Done;
        Ok(TransactionFlow::Done(log))
    }

    /// Record directory plus staging copy of the bundle
    fn unpack(&self, config: &AddonConfig, bundle_root: &Path) -> Result<()> {
        let id = &config.info.identifier;

        std::fs::create_dir_all(self.root.record_dir(id))?;
        std::fs::create_dir_all(self.root.record_fs_dir(id))?;

        let private = self.root.record_private_dir(id);
        copy_dir_recursive(bundle_root, &private)?;
        placeholders::substitute_file_tree(config, &self.root, &private)?;
        Ok(())
    }

    /// Wire the bundle into the host tree: views, controllers, routers,
    /// wrappers, public data, storage, console, migrations
    fn link(&self, config: &AddonConfig, bundle_root: &Path) -> Result<()> {
        let id = &config.info.identifier;

        // admin view
        let view = self.read_substituted(config, &bundle_root.join(&config.admin.view))?;
        write_file(&self.root.admin_view_file(id), &view)?;

        // admin controller, bundled default when the addon declares none
        let controller_dir = self.root.admin_controller_dir(id);
        match &config.admin.controller {
            Some(rel) => {
                let source = bundle_root.join(rel);
                if source.is_dir() {
                    copy_dir_recursive(&source, &controller_dir)?;
                    placeholders::substitute_file_tree(config, &self.root, &controller_dir)?;
                } else {
                    let content = self.read_substituted(config, &source)?;
                    let name = source
                        .file_name()
                        .ok_or_else(|| Error::invalid_package("controller path has no file name"))?;
                    write_file(&controller_dir.join(name), &content)?;
                }
            }
            None => {
                let class = capitalize(id);
                let content = DEFAULT_ADMIN_CONTROLLER
                    .replace("__CLASS__", &class)
                    .replace("__ID__", id);
                write_file(
                    &controller_dir.join(format!("{}Controller.php", class)),
                    &content,
                )?;
            }
        }

        if let Some(requests) = &config.requests {
            if let Some(views) = &requests.views {
                let dest = self.root.views_dir(id);
                copy_dir_recursive(&bundle_root.join(views), &dest)?;
                placeholders::substitute_file_tree(config, &self.root, &dest)?;
            }
            if let Some(app) = &requests.app {
                let dest = self.root.app_dir(id);
                copy_dir_recursive(&bundle_root.join(app), &dest)?;
                placeholders::substitute_file_tree(config, &self.root, &dest)?;
            }
            if let Some(routers) = &requests.routers {
                let pairs = [
                    (RouteTable::Client, &routers.client),
                    (RouteTable::Application, &routers.application),
                    (RouteTable::Web, &routers.web),
                ];
                for (table, source) in pairs {
                    if let Some(rel) = source {
                        let content = self.read_substituted(config, &bundle_root.join(rel))?;
                        routes::install_router(&self.root, table, id, &content)?;
                    }
                }
            }
        }

        // wrappers: record copy plus the live one the panel renders
        if let Some(rel) = &config.admin.wrapper {
            let content = self.read_substituted(config, &bundle_root.join(rel))?;
            write_file(
                &self.root.record_wrappers_dir(id).join("admin.blade.php"),
                &content,
            )?;
            write_file(&self.root.admin_wrapper_file(id), &content)?;
        }
        if let Some(rel) = config.dashboard.as_ref().and_then(|d| d.wrapper.as_ref()) {
            let content = self.read_substituted(config, &bundle_root.join(rel))?;
            write_file(
                &self.root.record_wrappers_dir(id).join("dashboard.blade.php"),
                &content,
            )?;
            write_file(&self.root.dashboard_wrapper_file(id), &content)?;
        }

        // stylesheets land in the record assets dir, served via symlink
        let css_sources = [
            config.admin.css.as_ref(),
            config.dashboard.as_ref().and_then(|d| d.css.as_ref()),
        ];
        if css_sources.iter().any(Option::is_some) {
            for rel in css_sources.into_iter().flatten() {
                let source = bundle_root.join(rel);
                let content = self.read_substituted(config, &source)?;
                let name = source
                    .file_name()
                    .ok_or_else(|| Error::invalid_package("css path has no file name"))?;
                write_file(&self.root.record_assets_dir(id).join(name), &content)?;
            }
            force_symlink(&self.root.record_assets_dir(id), &self.root.assets_symlink(id))?;
        }

        if let Some(data) = &config.data {
            if let Some(public) = &data.public {
                let dest = self.root.record_public_dir(id);
                copy_dir_recursive(&bundle_root.join(public), &dest)?;
                placeholders::substitute_file_tree(config, &self.root, &dest)?;
                force_symlink(&dest, &self.root.public_symlink(id))?;
            }
            if let Some(console) = &data.console {
                let dest = self.root.record_console_dir(id);
                copy_dir_recursive(&bundle_root.join(console), &dest)?;

                let console_yml = dest.join("Console.yml");
                if console_yml.exists() {
                    let entries =
                        parse_console_config(&std::fs::read_to_string(&console_yml)?)?;
                    for entry in &entries {
                        debug!("console command {}: {}", entry.signature, entry.description);
                    }
                }
            }
        }

        force_symlink(&self.root.record_fs_dir(id), &self.root.fs_symlink(id))?;

        if let Some(rel) = config.database.as_ref().and_then(|db| db.migrations.as_ref()) {
            copy_dir_recursive(&bundle_root.join(rel), &self.root.migrations_dir(id))?;
        }

        Ok(())
    }

    /// Guarded stylesheet tags in the panel layouts
    fn patch(&self, config: &AddonConfig) -> Result<()> {
        let id = &config.info.identifier;

        if let Some(rel) = &config.admin.css {
            routes::append_guarded(
                &self.root.admin_layout_file(),
                &css_link_tag(id, rel)?,
            )?;
        }
        if let Some(rel) = config.dashboard.as_ref().and_then(|d| d.css.as_ref()) {
            routes::append_guarded(
                &self.root.dashboard_layout_file(),
                &css_link_tag(id, rel)?,
            )?;
        }
        Ok(())
    }

    fn replay(
        &mut self,
        config: &AddonConfig,
        action: RouteAction,
        remaining: &mut VecDeque<Step>,
        log: &mut TransactionLog,
    ) -> Result<Option<PendingManualStep>> {
        self.state = TxState::StepReplay;
        while let Some(step) = remaining.pop_front() {
            match steps::apply_step(config, &self.root, &step, action)? {
                StepApplied::Completed(record) => log.push(record),
                StepApplied::Manual(manual) => return Ok(Some(manual)),
            }
        }
        Ok(None)
    }

    async fn run_install_script(
        &mut self,
        config: &AddonConfig,
        scratch: &Path,
        log: &mut TransactionLog,
    ) -> Result<()> {
        let id = &config.info.identifier;
        let Some(dir) = config.data.as_ref().and_then(|d| d.directory.as_ref()) else {
            if config.has_flag(Flag::HasInstallScript) {
                warn!("{} sets the install-script flag but has no data directory", id);
            }
            return Ok(());
        };

        let script = self.root.record_private_dir(id).join(dir).join("install.sh");
        if !script.exists() {
            if config.has_flag(Flag::HasInstallScript) {
                warn!("{} sets the install-script flag but ships no install.sh", id);
            }
            return Ok(());
        }

        let env = self.script_env(config, scratch);
        let ok = self.gateway.run_addon_script(&script, &env).await?;
        log.push(gateway_record("install script", ok));
        Ok(())
    }

    fn script_env(&self, config: &AddonConfig, scratch: &Path) -> ScriptEnv {
        ScriptEnv {
            tmp_dir: scratch.to_path_buf(),
            addon_target: config.info.target.clone(),
            addon_identifier: config.info.identifier.clone(),
            addon_version: config.info.version.clone(),
            panel_directory: self.root.path().to_path_buf(),
        }
    }

    fn read_substituted(&self, config: &AddonConfig, path: &Path) -> Result<String> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(placeholders::substitute(config, &self.root, &content))
    }

    // Remove

    async fn remove_inner(
        &mut self,
        id: &str,
        options: &RemoveOptions,
        follow_up: Option<FollowUpInstall>,
    ) -> Result<TransactionFlow> {
        self.state = TxState::Validating;
        if !self.root.is_installed(id) || !self.root.has_package(id) {
            return Err(Error::not_installed(id).into());
        }

        // capability flags come from the installed copy, not a new upload
        let validated = self.validate_package(&self.root.package_file(id))?;
        if validated.manifest.id != id {
            return Err(Error::invalid_package(format!(
                "recorded package identifies as {}, expected {}",
                validated.manifest.id, id
            ))
            .into());
        }

        info!("removing {}", id);
        let mut log = TransactionLog::new();

        self.state = TxState::ExternalBuild;
        self.run_remove_script(&validated.manifest, &validated.config, validated.scratch.path(), &mut log)
            .await?;

        self.state = TxState::Linking;
        self.unlink(&validated.config, options, &mut log).await?;

        let mut remaining: VecDeque<Step> =
            validated.manifest.removal_steps().into_iter().collect();

        if let Some(manual) =
            self.replay(&validated.config, RouteAction::Remove, &mut remaining, &mut log)?
        {
            return Ok(TransactionFlow::Pending(PendingTransaction {
                manual,
                cont: Continuation::Remove(RemoveCont {
                    config: validated.config,
                    _scratch: validated.scratch,
                    remaining,
                    log,
                    follow_up,
                }),
            }));
        }

        self.finish_remove(RemoveCont {
            config: validated.config,
            _scratch: validated.scratch,
            remaining,
            log,
            follow_up,
        })
        .await
    }

    async fn finish_remove(&mut self, cont: RemoveCont) -> Result<TransactionFlow> {
        let RemoveCont {
            config,
            mut log,
            follow_up,
            ..
        } = cont;
        let id = &config.info.identifier;

        self.state = TxState::Finalizing;
        self.root.remove_record(id)?;
        log.push(StepRecord::done(format!("remove record {}", id)));

        let cleared = self.gateway.clear_caches(self.root.path()).await?;
        log.push(gateway_record("clear caches", cleared));

        info!("removed {}", id);

        match follow_up {
            Some(next) => self.install_inner(&next.package, &next.options, log).await,
            None => {
                self.state = TxState::Done;
                Ok(TransactionFlow::Done(log))
            }
        }
    }

    async fn run_remove_script(
        &mut self,
        manifest: &AddonManifest,
        config: &AddonConfig,
        scratch: &Path,
        log: &mut TransactionLog,
    ) -> Result<()> {
        let wants_script =
            config.has_flag(Flag::HasRemovalScript) || manifest.remove_script.is_some();
        if !wants_script {
            return Ok(());
        }

        let id = &config.info.identifier;
        let Some(dir) = config.data.as_ref().and_then(|d| d.directory.as_ref()) else {
            warn!("{} declares a removal script but has no data directory", id);
            return Ok(());
        };

        let name = manifest.remove_script.as_deref().unwrap_or("remove.sh");
        let script = self.root.record_private_dir(id).join(dir).join(name);
        if !script.exists() {
            warn!("{} declares a removal script but {} is missing", id, name);
            return Ok(());
        }

        let env = self.script_env(config, scratch);
        let ok = self.gateway.run_addon_script(&script, &env).await?;
        log.push(gateway_record("remove script", ok));
        Ok(())
    }

    /// Undo the host-tree wiring done by `link` and `patch`
    async fn unlink(
        &mut self,
        config: &AddonConfig,
        options: &RemoveOptions,
        log: &mut TransactionLog,
    ) -> Result<()> {
        let id = &config.info.identifier;

        for table in [RouteTable::Client, RouteTable::Application, RouteTable::Web] {
            routes::remove_router(&self.root, table, id)?;
        }

        if let Some(rel) = &config.admin.css {
            routes::strip_line(&self.root.admin_layout_file(), &css_link_tag(id, rel)?)?;
        }
        if let Some(rel) = config.dashboard.as_ref().and_then(|d| d.css.as_ref()) {
            routes::strip_line(&self.root.dashboard_layout_file(), &css_link_tag(id, rel)?)?;
        }

        if options.migrate {
            if config
                .database
                .as_ref()
                .is_some_and(|db| db.migrations.is_some())
            {
                let migrations = self.root.migrations_dir(id);
                let ok = self
                    .gateway
                    .rollback_migrations(self.root.path(), &migrations)
                    .await?;
                log.push(gateway_record("rollback migrations", ok));
            }
        }

        let admin_view_dir = self
            .root
            .admin_view_file(id)
            .parent()
            .map(Path::to_path_buf);
        let mut doomed = vec![
            self.root.admin_controller_dir(id),
            self.root.app_dir(id),
            self.root.views_dir(id),
            self.root.admin_wrapper_file(id),
            self.root.dashboard_wrapper_file(id),
            self.root.public_symlink(id),
            self.root.fs_symlink(id),
            self.root.assets_symlink(id),
            self.root.migrations_dir(id),
        ];
        if let Some(dir) = admin_view_dir {
            doomed.push(dir);
        }

        for path in doomed {
            remove_path(&path);
        }
        log.push(StepRecord::done(format!("unlink {}", id)));
        Ok(())
    }

    // Upgrade

    async fn upgrade_inner(
        &mut self,
        package: &Path,
        options: &UpgradeOptions,
    ) -> Result<TransactionFlow> {
        self.state = TxState::Validating;
        let validated = self.validate_package(package)?;
        let id = validated.manifest.id.clone();

        if !self.root.is_installed(&id) {
            return Err(Error::not_installed(&id).into());
        }

        // branch 1: the addon ships its own update script
        let update_script = validated
            .config
            .data
            .as_ref()
            .and_then(|d| d.directory.as_ref())
            .map(|dir| validated.scratch.path().join(dir).join("update.sh"))
            .filter(|p| p.exists());

        if let Some(script) = update_script {
            info!("upgrading {} via its update script", id);
            return self
                .upgrade_via_script(validated, package, &script, options)
                .await;
        }

        // branch 2: in-place reinstall without the remove phase
        if validated.manifest.skip_remove_on_upgrade {
            info!("upgrading {} in place", id);
            return self
                .install_inner(
                    package,
                    &InstallOptions {
                        force: true,
                        skip_steps: options.skip_steps,
                    },
                    TransactionLog::new(),
                )
                .await;
        }

        // branch 3: full remove, then install
        info!("upgrading {} via remove and reinstall", id);
        self.remove_inner(
            &id,
            &RemoveOptions { migrate: false },
            Some(FollowUpInstall {
                package: package.to_path_buf(),
                options: InstallOptions {
                    force: true,
                    skip_steps: options.skip_steps,
                },
            }),
        )
        .await
    }

    /// The update script replaces only the removal half of an upgrade;
    /// the install half still runs so the new bundle's host wiring lands
    async fn upgrade_via_script(
        &mut self,
        validated: ValidatedPackage,
        package: &Path,
        script: &Path,
        options: &UpgradeOptions,
    ) -> Result<TransactionFlow> {
        let mut log = TransactionLog::new();

        self.state = TxState::ExternalBuild;
        let env = self.script_env(&validated.config, validated.scratch.path());
        let ok = self.gateway.run_addon_script(script, &env).await?;
        log.push(gateway_record("update script", ok));

        self.install_inner(
            package,
            &InstallOptions {
                force: true,
                skip_steps: options.skip_steps,
            },
            log,
        )
        .await
    }
}

fn gateway_record(action: &str, ok: bool) -> StepRecord {
    if ok {
        StepRecord::done(action)
    } else {
        StepRecord::failed(action, "command exited nonzero")
    }
}

fn css_link_tag(id: &str, css_path: &str) -> Result<String> {
    let name = Path::new(css_path)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::invalid_package("css path has no file name"))?;
    Ok(format!(
        "<link rel=\"stylesheet\" href=\"/assets/addons/{}/{}\">",
        id, name
    ))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Best-effort delete for removal cleanup
fn remove_path(path: &Path) {
    let result = if path.is_symlink() || path.is_file() {
        std::fs::remove_file(path)
    } else if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        return;
    };

    if let Err(err) = result {
        warn!("could not delete {}: {}", path.display(), err);
    }
}
