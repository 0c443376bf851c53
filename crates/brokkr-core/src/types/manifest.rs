//! Addon manifest (manifest.json) parsing
//!
//! The manifest declares the package identity, the minimum engine version,
//! and the ordered installation/removal step lists. Step paths may contain
//! the `(bundle)` and `(panel)` macros which are expanded eagerly at parse
//! time against an explicit [`PathContext`] - never against the process
//! working directory.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Macro token resolving to the addon's extracted bundle root
pub const BUNDLE_MACRO: &str = "(bundle)";

/// Macro token resolving to the panel install root
pub const PANEL_MACRO: &str = "(panel)";

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("static pattern"))
}

/// Roots against which step path macros are resolved
#[derive(Debug, Clone)]
pub struct PathContext {
    /// Scratch directory holding the extracted framework bundle
    pub bundle_root: PathBuf,

    /// The panel's base directory
    pub install_root: PathBuf,
}

impl PathContext {
    pub fn new(bundle_root: impl Into<PathBuf>, install_root: impl Into<PathBuf>) -> Self {
        Self {
            bundle_root: bundle_root.into(),
            install_root: install_root.into(),
        }
    }

    /// Expand `(bundle)` and `(panel)` in a step path
    fn expand(&self, value: &str) -> String {
        value
            .replace(BUNDLE_MACRO, &self.bundle_root.to_string_lossy())
            .replace(PANEL_MACRO, &self.install_root.to_string_lossy())
    }
}

/// One entry of a dashboard route table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteEntry {
    pub path: String,
    pub name: String,
    pub permission: String,
    pub component: String,
}

/// One declarative installation or removal action
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Step {
    /// Recursive-aware file or directory copy
    Copy { source: String, destination: String },

    /// Best-effort recursive delete, never fatal
    Remove { path: String },

    /// In-place text substitution with double-application guards
    Replace {
        file: String,
        search: String,
        replace: String,
        #[serde(default)]
        matches: Option<Vec<String>>,
        #[serde(default)]
        newline: bool,
        #[serde(default)]
        global: bool,
        #[serde(default)]
        unique: bool,
    },

    /// Frontend route registration requiring operator confirmation
    DashboardRoute {
        path: String,
        name: String,
        permission: String,
        component: String,
        #[serde(rename = "componentPath")]
        component_path: String,
        after: RouteEntry,
    },
}

impl Step {
    /// Expand path macros in place. Runs once, at manifest-parse time.
    fn expand_macros(&mut self, ctx: &PathContext) {
        match self {
            Step::Copy {
                source,
                destination,
            } => {
                *source = ctx.expand(source);
                *destination = ctx.expand(destination);
            }
            Step::Remove { path } => *path = ctx.expand(path),
            Step::Replace { file, .. } => *file = ctx.expand(file),
            Step::DashboardRoute { .. } => {}
        }
    }
}

fn default_requirement() -> String {
    crate::version::BASELINE_REQUIREMENT.to_string()
}

/// Addon manifest from manifest.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonManifest {
    /// Stable identifier, also the install directory name
    pub id: String,

    /// Minimum engine version required to install
    #[serde(default = "default_requirement")]
    pub requirement: String,

    /// Ordered installation steps
    pub installation: Vec<Step>,

    /// Ordered removal steps; absence means removal is the inverse of a
    /// subset of the installation steps
    #[serde(default)]
    pub removal: Option<Vec<Step>>,

    /// Bundle-relative path of an external remove script
    #[serde(default)]
    pub remove_script: Option<String>,

    /// Re-run install over the existing installation on upgrade instead of
    /// removing first
    #[serde(default)]
    pub skip_remove_on_upgrade: bool,
}

impl AddonManifest {
    /// Steps replayed on removal: the installation's dashboard-route steps
    /// (stripped instead of inserted) followed by the explicit removal list.
    pub fn removal_steps(&self) -> Vec<Step> {
        let mut steps: Vec<Step> = self
            .installation
            .iter()
            .filter(|step| matches!(step, Step::DashboardRoute { .. }))
            .cloned()
            .collect();

        if let Some(removal) = &self.removal {
            steps.extend(removal.iter().cloned());
        }

        steps
    }

    /// On-disk name of the persisted package copy
    pub fn package_file_name(&self) -> String {
        format!("{}.package", self.id)
    }
}

/// Parse and validate a manifest, expanding path macros against `ctx`.
///
/// Malformed JSON, missing required fields and wrong field types all
/// surface as the same "invalid package" error; the parse failure itself
/// is only logged.
pub fn parse_manifest(json: &str, ctx: &PathContext) -> Result<AddonManifest> {
    let mut manifest: AddonManifest = serde_json::from_str(json).map_err(|err| {
        debug!("manifest parse failed: {}", err);
        Error::invalid_package("malformed manifest.json")
    })?;

    if !id_pattern().is_match(&manifest.id) {
        return Err(Error::invalid_identifier(&manifest.id));
    }

    for step in &mut manifest.installation {
        step.expand_macros(ctx);
    }
    if let Some(removal) = &mut manifest.removal {
        for step in removal {
            step.expand_macros(ctx);
        }
    }

    Ok(manifest)
}

/// Whether a package path carries the expected file extension
pub fn has_package_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "package")
}
