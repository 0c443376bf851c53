//! Route table stitching
//!
//! Addon routers are written as standalone files under `routes/addons/` and
//! wired into the panel's aggregator route tables by appending an include
//! line. The append is guarded by a contains check so force-reinstalls
//! never duplicate the line; removal is string-stripping, not
//! line-numbered. Safe under the engine's single-writer-at-a-time model.

use crate::record::InstallRoot;
use brokkr_core::Result;
use std::path::{Path, PathBuf};

/// The three aggregator route tables an addon can extend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTable {
    Client,
    Application,
    Web,
}

impl RouteTable {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Application => "application",
            Self::Web => "web",
        }
    }

    /// The aggregator file include lines are appended to
    pub fn aggregator_file(&self, root: &InstallRoot) -> PathBuf {
        match self {
            Self::Client => root.join("routes/api-client.php"),
            Self::Application => root.join("routes/api-application.php"),
            Self::Web => root.join("routes/web.php"),
        }
    }

    /// The addon's standalone router file
    pub fn router_file(&self, root: &InstallRoot, id: &str) -> PathBuf {
        root.join(format!("routes/addons/{}/{}.php", self.name(), id))
    }

    /// The include line wiring the router into the aggregator
    pub fn include_line(&self, id: &str) -> String {
        format!("include 'addons/{}/{}.php';", self.name(), id)
    }
}

/// Append `line` to `file` unless the file already contains it.
/// Returns whether the line was added.
pub fn append_guarded(file: &Path, line: &str) -> Result<bool> {
    let content = if file.exists() {
        std::fs::read_to_string(file)?
    } else {
        String::new()
    };

    if content.contains(line) {
        return Ok(false);
    }

    let mut updated = content;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(line);
    updated.push('\n');

    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file, updated)?;
    Ok(true)
}

/// Remove every line of `file` containing `needle`. Missing files are
/// ignored; removal must never abort a transaction.
pub fn strip_line(file: &Path, needle: &str) -> Result<()> {
    if !file.exists() {
        return Ok(());
    }

    let content = std::fs::read_to_string(file)?;
    if !content.contains(needle) {
        return Ok(());
    }

    let stripped: Vec<&str> = content
        .lines()
        .filter(|line| !line.contains(needle))
        .collect();
    std::fs::write(file, stripped.join("\n") + "\n")?;
    Ok(())
}

/// Rewrite the router's route-group prefix so the addon's endpoints live
/// under its own namespace. First occurrence only.
pub fn rewrite_prefix(content: &str, id: &str) -> String {
    content.replacen(
        "'prefix' => '",
        &format!("'prefix' => '/addons/{}", id),
        1,
    )
}

/// Write the addon's router file and wire it into the aggregator
pub fn install_router(
    root: &InstallRoot,
    table: RouteTable,
    id: &str,
    content: &str,
) -> Result<()> {
    let router = table.router_file(root, id);
    if let Some(parent) = router.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&router, rewrite_prefix(content, id))?;

    append_guarded(&table.aggregator_file(root), &table.include_line(id))?;
    Ok(())
}

/// Delete the addon's router file and strip the aggregator include
pub fn remove_router(root: &InstallRoot, table: RouteTable, id: &str) -> Result<()> {
    let router = table.router_file(root, id);
    if router.exists() {
        std::fs::remove_file(router)?;
    }

    strip_line(&table.aggregator_file(root), &table.include_line(id))
}
