//! A minimal panel tree the way the engine expects to find it

use super::mocks::SpyGateway;
use brokkr_addons::{AddonEngine, InstallRoot};
use std::path::Path;
use tempfile::TempDir;

pub const ROUTES_TS: &str = "import React from 'react';

export default [
    // panel routes
    {
        path: '/',
        name: 'Home',
        permission: '',
        component: HomeContainer,
    },
];
";

const LAYOUT: &str = "<html>\n<head>\n</head>\n<body></body>\n</html>\n";

/// Temporary panel installation with routers, layouts, and the frontend
/// route table in place
pub struct PanelFixture {
    pub dir: TempDir,
    pub root: InstallRoot,
    pub spy: SpyGateway,
}

impl PanelFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let base = dir.path();

        write_file(base, "routes/api-client.php", "<?php\n");
        write_file(base, "routes/api-application.php", "<?php\n");
        write_file(base, "routes/web.php", "<?php\n");
        write_file(base, "resources/views/layouts/admin.blade.php", LAYOUT);
        write_file(base, "resources/views/layouts/dashboard.blade.php", LAYOUT);
        write_file(base, "resources/scripts/routers/routes.ts", ROUTES_TS);
        std::fs::create_dir_all(base.join("public/assets")).unwrap();

        let root = InstallRoot::new(base);
        Self {
            dir,
            root,
            spy: SpyGateway::new(),
        }
    }

    pub fn engine(&self) -> AddonEngine<SpyGateway> {
        AddonEngine::new(self.root.clone(), self.spy.clone())
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(rel)).unwrap()
    }

    pub fn exists(&self, rel: &str) -> bool {
        // symlink-aware: a dangling link still "exists" as an entry
        let path = self.dir.path().join(rel);
        path.symlink_metadata().is_ok()
    }

    pub fn write(&self, rel: &str, content: &str) {
        write_file(self.dir.path(), rel, content);
    }
}

impl Default for PanelFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn write_file(base: &Path, rel: &str, content: &str) {
    let path = base.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}
