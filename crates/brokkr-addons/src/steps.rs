//! Step replay interpretation
//!
//! Executes one declarative step at a time. Copy and replace failures are
//! fatal to the surrounding transaction; remove steps are best-effort and
//! never abort. A dashboard-route step cannot be auto-merged into the
//! frontend route table, so it surfaces as a [`PendingManualStep`] the
//! caller must confirm before the transaction resumes.

use crate::placeholders::{self, substitute};
use crate::record::{copy_dir_recursive, InstallRoot};
use brokkr_core::types::{AddonConfig, RouteEntry, Step};
use brokkr_core::Result;
use std::path::Path;
use tracing::{debug, warn};

/// Line index at which the import auto-insert is attempted
const IMPORT_INSERT_LINE: usize = 4;

/// Outcome of one executed step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Done,
    Skipped,
    Failed(String),
}

/// One entry of the transaction log
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub action: String,
    pub status: StepStatus,
}

impl StepRecord {
    pub fn done(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            status: StepStatus::Done,
        }
    }

    pub fn skipped(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            status: StepStatus::Skipped,
        }
    }

    pub fn failed(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            status: StepStatus::Failed(message.into()),
        }
    }
}

/// Whether a dashboard route is being registered or stripped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    Add,
    Remove,
}

/// A frontend route edit awaiting operator confirmation
#[derive(Debug, Clone)]
pub struct PendingManualStep {
    pub action: RouteAction,
    pub route: RouteEntry,
    pub after: RouteEntry,
    pub component_path: String,
    pub router_file: std::path::PathBuf,
}

impl PendingManualStep {
    fn route_block(route: &RouteEntry) -> String {
        [
            "        {".to_string(),
            format!("            path: '{}',", route.path),
            format!("            name: '{}',", route.name),
            format!("            permission: '{}',", route.permission),
            format!("            component: {},", route.component),
            "        },".to_string(),
        ]
        .join("\n")
    }

    /// Diff-style instruction block showing the exact lines to add or
    /// remove and their context
    pub fn instructions(&self) -> String {
        let mut out = String::new();

        match self.action {
            RouteAction::Add => {
                out.push_str("Add the following route manually:\n");
                out.push_str(&format!("  {}\n\n", self.router_file.display()));
                out.push_str(&Self::route_block(&self.route));
                out.push_str("\n\nAfter:\n\n");
                out.push_str(&Self::route_block(&self.after));
            }
            RouteAction::Remove => {
                out.push_str("Remove the following route manually:\n");
                out.push_str(&format!("  {}\n\n", self.router_file.display()));
                out.push_str(&Self::route_block(&self.route));
            }
        }

        out.push('\n');
        out
    }
}

/// Result of applying one step
#[derive(Debug)]
pub enum StepApplied {
    Completed(StepRecord),
    Manual(PendingManualStep),
}

/// Execute one step. `action` selects the dashboard-route direction;
/// every other variant behaves identically on install and removal replay.
pub fn apply_step(
    config: &AddonConfig,
    root: &InstallRoot,
    step: &Step,
    action: RouteAction,
) -> Result<StepApplied> {
    match step {
        Step::Copy {
            source,
            destination,
        } => apply_copy(config, root, source, destination).map(StepApplied::Completed),
        Step::Remove { path } => Ok(StepApplied::Completed(apply_remove(path))),
        Step::Replace {
            file,
            search,
            replace,
            matches,
            newline,
            global,
            unique,
        } => apply_replace(file, search, replace, matches.as_deref(), *newline, *global, *unique)
            .map(StepApplied::Completed),
        Step::DashboardRoute {
            path,
            name,
            permission,
            component,
            component_path,
            after,
        } => {
            let route = RouteEntry {
                path: path.clone(),
                name: name.clone(),
                permission: permission.clone(),
                component: component.clone(),
            };
            apply_dashboard_route(root, route, after.clone(), component_path, action)
                .map(StepApplied::Manual)
        }
    }
}

/// Copy with placeholder application. Directory copies substitute the
/// destination tree after the copy; file copies substitute in memory
/// before writing. Both end states are equivalent.
fn apply_copy(
    config: &AddonConfig,
    root: &InstallRoot,
    source: &str,
    destination: &str,
) -> Result<StepRecord> {
    let source_path = Path::new(source);
    let destination_path = Path::new(destination);
    let action = format!("copy {} -> {}", source, destination);

    if source_path.is_dir() {
        copy_dir_recursive(source_path, destination_path)?;
        placeholders::substitute_file_tree(config, root, destination_path)?;
    } else {
        if let Some(parent) = destination_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = std::fs::read(source_path)?;
        if content.contains(&0) {
            // binary, copy verbatim
            std::fs::copy(source_path, destination_path)?;
        } else {
            let text = String::from_utf8_lossy(&content);
            std::fs::write(destination_path, substitute(config, root, &text))?;
        }
    }

    Ok(StepRecord::done(action))
}

/// Best-effort recursive delete; failures are logged, never raised
fn apply_remove(path: &str) -> StepRecord {
    let action = format!("remove {}", path);
    let target = Path::new(path);

    if !target.exists() {
        return StepRecord::skipped(action);
    }

    let result = if target.is_dir() {
        std::fs::remove_dir_all(target)
    } else {
        std::fs::remove_file(target)
    };

    match result {
        Ok(()) => StepRecord::done(action),
        Err(err) => {
            warn!("remove step failed for {}: {}", path, err);
            StepRecord::failed(action, err.to_string())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_replace(
    file: &str,
    search: &str,
    replace: &str,
    matches: Option<&[String]>,
    newline: bool,
    global: bool,
    unique: bool,
) -> Result<StepRecord> {
    let action = format!("replace in {}", file);
    let content = std::fs::read_to_string(file)?;

    let replacement = if newline {
        format!("{}\n", replace)
    } else {
        replace.to_string()
    };

    // don't double-patch
    let already_applied = match (unique, matches) {
        (true, None) => content.contains(replace),
        (true, Some(matches)) => matches.iter().any(|m| content.contains(m.as_str())),
        (false, _) => false,
    };
    if already_applied {
        debug!("replace already applied in {}", file);
        return Ok(StepRecord::skipped(action));
    }

    let replaced = if global {
        content.replace(search, &replacement)
    } else {
        content.replacen(search, &replacement, 1)
    };

    std::fs::write(file, replaced)?;
    Ok(StepRecord::done(action))
}

/// Best-effort import-line edit, then yield the manual confirmation
fn apply_dashboard_route(
    root: &InstallRoot,
    route: RouteEntry,
    after: RouteEntry,
    component_path: &str,
    action: RouteAction,
) -> Result<PendingManualStep> {
    let router_file = root.dashboard_router_file();
    let import_line = format!("import {} from '{}';", route.component, component_path);

    if router_file.exists() {
        let content = std::fs::read_to_string(&router_file)?;

        match action {
            RouteAction::Add => {
                if !content.contains(&import_line) {
                    let mut lines: Vec<&str> = content.lines().collect();
                    let at = IMPORT_INSERT_LINE.min(lines.len());
                    lines.insert(at, &import_line);
                    std::fs::write(&router_file, lines.join("\n") + "\n")?;
                }
            }
            RouteAction::Remove => {
                if content.contains(&import_line) {
                    let lines: Vec<&str> = content
                        .lines()
                        .filter(|line| !line.contains(&import_line))
                        .collect();
                    std::fs::write(&router_file, lines.join("\n") + "\n")?;
                }
            }
        }
    }

    Ok(PendingManualStep {
        action,
        route,
        after,
        component_path: component_path.to_string(),
        router_file,
    })
}
