//! Installed-addon record layout
//!
//! Every installed addon owns `<root>/.framework/extensions/<id>/` holding
//! the original package file, a `private/` staging copy of the unpacked
//! bundle, `fs/` mutable storage, and optional `public/`, `assets/`,
//! `_wrappers/` and `console/` subtrees. Deleting the whole directory is
//! the canonical fully-removed postcondition.
//!
//! [`InstallRoot`] threads the panel base directory explicitly through
//! every component; nothing here consults the process working directory.

use brokkr_core::Result;
use std::path::{Path, PathBuf};

/// Relative path of the extensions tree under the install root
pub const EXTENSIONS_DIR: &str = ".framework/extensions";

/// The panel's base directory
#[derive(Debug, Clone)]
pub struct InstallRoot(PathBuf);

impl InstallRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn join(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.0.join(rel)
    }

    // Record tree

    pub fn extensions_dir(&self) -> PathBuf {
        self.0.join(EXTENSIONS_DIR)
    }

    pub fn record_dir(&self, id: &str) -> PathBuf {
        self.extensions_dir().join(id)
    }

    pub fn package_file(&self, id: &str) -> PathBuf {
        self.record_dir(id).join(format!("{}.package", id))
    }

    pub fn record_private_dir(&self, id: &str) -> PathBuf {
        self.record_dir(id).join("private")
    }

    pub fn record_fs_dir(&self, id: &str) -> PathBuf {
        self.record_dir(id).join("fs")
    }

    pub fn record_public_dir(&self, id: &str) -> PathBuf {
        self.record_dir(id).join("public")
    }

    pub fn record_assets_dir(&self, id: &str) -> PathBuf {
        self.record_dir(id).join("assets")
    }

    pub fn record_wrappers_dir(&self, id: &str) -> PathBuf {
        self.record_dir(id).join("_wrappers")
    }

    pub fn record_console_dir(&self, id: &str) -> PathBuf {
        self.record_dir(id).join("console")
    }

    /// An addon counts as installed once its record directory exists
    pub fn is_installed(&self, id: &str) -> bool {
        self.record_dir(id).exists()
    }

    /// Whether the persisted package copy is present (a "properly
    /// installed" addon, required for upgrades)
    pub fn has_package(&self, id: &str) -> bool {
        self.package_file(id).exists()
    }

    /// Installed addon ids, sorted
    pub fn installed_ids(&self) -> Result<Vec<String>> {
        let dir = self.extensions_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Delete the whole record directory
    pub fn remove_record(&self, id: &str) -> Result<()> {
        let dir = self.record_dir(id);
        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        Ok(())
    }

    // Host tree

    pub fn admin_view_file(&self, id: &str) -> PathBuf {
        self.0
            .join("resources/views/admin/addons")
            .join(id)
            .join("index.blade.php")
    }

    pub fn admin_controller_dir(&self, id: &str) -> PathBuf {
        self.0.join("app/Http/Controllers/Admin/Addons").join(id)
    }

    pub fn app_dir(&self, id: &str) -> PathBuf {
        self.0.join("app/Addons").join(id)
    }

    pub fn views_dir(&self, id: &str) -> PathBuf {
        self.0.join("resources/views/addons").join(id)
    }

    pub fn admin_wrapper_file(&self, id: &str) -> PathBuf {
        self.0
            .join("resources/views/addons/wrappers/admin")
            .join(format!("{}.blade.php", id))
    }

    pub fn dashboard_wrapper_file(&self, id: &str) -> PathBuf {
        self.0
            .join("resources/views/addons/wrappers/dashboard")
            .join(format!("{}.blade.php", id))
    }

    pub fn admin_layout_file(&self) -> PathBuf {
        self.0.join("resources/views/layouts/admin.blade.php")
    }

    pub fn dashboard_layout_file(&self) -> PathBuf {
        self.0.join("resources/views/layouts/dashboard.blade.php")
    }

    pub fn public_symlink(&self, id: &str) -> PathBuf {
        self.0.join("public/addons").join(id)
    }

    pub fn fs_symlink(&self, id: &str) -> PathBuf {
        self.0.join("public/fs/addons").join(id)
    }

    pub fn assets_symlink(&self, id: &str) -> PathBuf {
        self.0.join("public/assets/addons").join(id)
    }

    pub fn built_assets_dir(&self) -> PathBuf {
        self.0.join("public/assets")
    }

    pub fn migrations_dir(&self, id: &str) -> PathBuf {
        self.0.join(format!("database/migrations-{}", id))
    }

    /// The frontend route table source, probing the .ts name first
    pub fn dashboard_router_file(&self) -> PathBuf {
        let ts = self.0.join("resources/scripts/routers/routes.ts");
        if ts.exists() {
            ts
        } else {
            self.0.join("resources/scripts/routers/routes.tsx")
        }
    }
}

/// Replace whatever occupies `link` with a symlink to `target`.
/// Safe to re-run: an existing link, file or directory is removed first.
pub fn force_symlink(target: &Path, link: &Path) -> Result<()> {
    if let Some(parent) = link.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match std::fs::symlink_metadata(link) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(link)?,
        Ok(_) => std::fs::remove_file(link)?,
        Err(_) => {}
    }

    #[cfg(unix)]
    std::os::unix::fs::symlink(target, link)?;
    #[cfg(not(unix))]
    std::fs::hard_link(target, link)?;

    Ok(())
}

/// Recursive directory copy, creating `destination` as needed
pub fn copy_dir_recursive(source: &Path, destination: &Path) -> Result<()> {
    std::fs::create_dir_all(destination)?;

    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let target = destination.join(entry.file_name());

        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_record_layout() {
        let root = InstallRoot::new("/srv/panel");

        assert_eq!(
            root.package_file("demo"),
            PathBuf::from("/srv/panel/.framework/extensions/demo/demo.package")
        );
        assert_eq!(
            root.record_private_dir("demo"),
            PathBuf::from("/srv/panel/.framework/extensions/demo/private")
        );
        assert_eq!(
            root.migrations_dir("demo"),
            PathBuf::from("/srv/panel/database/migrations-demo")
        );
    }

    #[test]
    fn test_installed_ids_empty_without_tree() {
        let dir = TempDir::new().unwrap();
        let root = InstallRoot::new(dir.path());
        assert!(root.installed_ids().unwrap().is_empty());
        assert!(!root.is_installed("demo"));
    }

    #[test]
    fn test_installed_ids_lists_records() {
        let dir = TempDir::new().unwrap();
        let root = InstallRoot::new(dir.path());

        std::fs::create_dir_all(root.record_dir("beta")).unwrap();
        std::fs::create_dir_all(root.record_dir("alpha")).unwrap();

        assert_eq!(root.installed_ids().unwrap(), vec!["alpha", "beta"]);
        assert!(root.is_installed("alpha"));
        assert!(!root.has_package("alpha"));
    }

    #[test]
    fn test_force_symlink_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let target_a = dir.path().join("a");
        let target_b = dir.path().join("b");
        let link = dir.path().join("nested/link");

        std::fs::create_dir_all(&target_a).unwrap();
        std::fs::create_dir_all(&target_b).unwrap();
        std::fs::write(target_b.join("marker"), "b").unwrap();

        force_symlink(&target_a, &link).unwrap();
        force_symlink(&target_b, &link).unwrap();

        assert!(link.join("marker").exists());
    }

    #[test]
    fn test_copy_dir_recursive() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("deep/deeper")).unwrap();
        std::fs::write(src.join("deep/deeper/file.txt"), "x").unwrap();

        let dst = dir.path().join("dst");
        copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(
            std::fs::read_to_string(dst.join("deep/deeper/file.txt")).unwrap(),
            "x"
        );
    }
}
