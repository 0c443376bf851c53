//! Builder producing real Generation 2 package archives for tests

use brokkr_addons::{pack_dir, write_package};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

pub struct PackageBuilder {
    id: String,
    name: String,
    version: String,
    requirement: String,
    target: String,
    flags: Option<String>,
    admin_view: String,
    admin_css: Option<String>,
    dashboard_css: Option<String>,
    client_router: Option<String>,
    public_files: Vec<(String, String)>,
    data_files: Vec<(String, String)>,
    migrations: Vec<(String, String)>,
    bundle_files: Vec<(String, String)>,
    manifest_id: Option<String>,
    installation: Vec<Value>,
    removal: Option<Vec<Value>>,
    remove_script: Option<String>,
    skip_remove_on_upgrade: bool,
}

impl PackageBuilder {
    pub fn new(id: &str) -> Self {
        let mut chars = id.chars();
        let name = match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        };

        Self {
            id: id.to_string(),
            name,
            version: "1.0.0".to_string(),
            requirement: "1.0.0".to_string(),
            target: "panel@1.11.x".to_string(),
            flags: None,
            admin_view: "<h1>{name}</h1>\n".to_string(),
            admin_css: None,
            dashboard_css: None,
            client_router: None,
            public_files: Vec::new(),
            data_files: Vec::new(),
            migrations: Vec::new(),
            bundle_files: Vec::new(),
            manifest_id: None,
            installation: Vec::new(),
            removal: None,
            remove_script: None,
            skip_remove_on_upgrade: false,
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn requirement(mut self, requirement: &str) -> Self {
        self.requirement = requirement.to_string();
        self
    }

    pub fn target(mut self, target: &str) -> Self {
        self.target = target.to_string();
        self
    }

    pub fn flags(mut self, flags: &str) -> Self {
        self.flags = Some(flags.to_string());
        self
    }

    pub fn admin_view(mut self, content: &str) -> Self {
        self.admin_view = content.to_string();
        self
    }

    pub fn admin_css(mut self, content: &str) -> Self {
        self.admin_css = Some(content.to_string());
        self
    }

    pub fn dashboard_css(mut self, content: &str) -> Self {
        self.dashboard_css = Some(content.to_string());
        self
    }

    pub fn client_router(mut self, content: &str) -> Self {
        self.client_router = Some(content.to_string());
        self
    }

    pub fn public_file(mut self, name: &str, content: &str) -> Self {
        self.public_files.push((name.to_string(), content.to_string()));
        self
    }

    /// Adds a file under the addon's `data/` directory and enables it in
    /// the config
    pub fn data_file(mut self, name: &str, content: &str) -> Self {
        self.data_files.push((name.to_string(), content.to_string()));
        self
    }

    pub fn migration(mut self, name: &str, content: &str) -> Self {
        self.migrations.push((name.to_string(), content.to_string()));
        self
    }

    /// Adds a raw file to the bundle without wiring it into the config
    pub fn bundle_file(mut self, path: &str, content: &str) -> Self {
        self.bundle_files.push((path.to_string(), content.to_string()));
        self
    }

    /// Write a different id into the manifest than the config declares
    pub fn manifest_id(mut self, id: &str) -> Self {
        self.manifest_id = Some(id.to_string());
        self
    }

    pub fn install_step(mut self, step: Value) -> Self {
        self.installation.push(step);
        self
    }

    pub fn removal_step(mut self, step: Value) -> Self {
        self.removal.get_or_insert_with(Vec::new).push(step);
        self
    }

    pub fn remove_script(mut self, name: &str) -> Self {
        self.remove_script = Some(name.to_string());
        self
    }

    pub fn skip_remove_on_upgrade(mut self) -> Self {
        self.skip_remove_on_upgrade = true;
        self
    }

    fn conf_yaml(&self) -> String {
        let mut out = String::new();
        out.push_str("info:\n");
        out.push_str(&format!("  identifier: {}\n", self.id));
        out.push_str(&format!("  name: {}\n", self.name));
        out.push_str("  description: test addon\n");
        out.push_str(&format!("  version: \"{}\"\n", self.version));
        out.push_str(&format!("  target: \"{}\"\n", self.target));
        if let Some(flags) = &self.flags {
            out.push_str(&format!("  flags: \"{}\"\n", flags));
        }
        out.push_str("  author: tester@example.com\n");

        out.push_str("admin:\n");
        out.push_str("  view: admin/index.blade.php\n");
        if self.admin_css.is_some() {
            out.push_str("  css: admin/admin.css\n");
        }

        if self.dashboard_css.is_some() {
            out.push_str("dashboard:\n");
            out.push_str("  css: dashboard/dashboard.css\n");
        }

        if self.client_router.is_some() {
            out.push_str("requests:\n");
            out.push_str("  routers:\n");
            out.push_str("    client: routers/client.php\n");
        }

        if !self.public_files.is_empty() || !self.data_files.is_empty() {
            out.push_str("data:\n");
            if !self.public_files.is_empty() {
                out.push_str("  public: public\n");
            }
            if !self.data_files.is_empty() {
                out.push_str("  directory: data\n");
            }
        }

        if !self.migrations.is_empty() {
            out.push_str("database:\n");
            out.push_str("  migrations: migrations\n");
        }

        out
    }

    fn manifest_json(&self) -> Value {
        let mut manifest = json!({
            "id": self.manifest_id.as_ref().unwrap_or(&self.id),
            "requirement": self.requirement,
            "installation": self.installation,
        });
        if let Some(removal) = &self.removal {
            manifest["removal"] = json!(removal);
        }
        if let Some(script) = &self.remove_script {
            manifest["removeScript"] = json!(script);
        }
        if self.skip_remove_on_upgrade {
            manifest["skipRemoveOnUpgrade"] = json!(true);
        }
        manifest
    }

    /// Assemble the bundle, pack it, and write `<id>.package` under `dir`
    pub fn write_to(&self, dir: &Path) -> PathBuf {
        let bundle_dir = dir.join(format!("{}-bundle", self.id));

        put(&bundle_dir, "conf.yml", &self.conf_yaml());
        put(&bundle_dir, "admin/index.blade.php", &self.admin_view);
        if let Some(css) = &self.admin_css {
            put(&bundle_dir, "admin/admin.css", css);
        }
        if let Some(css) = &self.dashboard_css {
            put(&bundle_dir, "dashboard/dashboard.css", css);
        }
        if let Some(router) = &self.client_router {
            put(&bundle_dir, "routers/client.php", router);
        }
        for (name, content) in &self.public_files {
            put(&bundle_dir, &format!("public/{}", name), content);
        }
        for (name, content) in &self.data_files {
            put(&bundle_dir, &format!("data/{}", name), content);
        }
        for (name, content) in &self.migrations {
            put(&bundle_dir, &format!("migrations/{}", name), content);
        }
        for (path, content) in &self.bundle_files {
            put(&bundle_dir, path, content);
        }

        let bundle = pack_dir(&bundle_dir).unwrap();
        let manifest = serde_json::to_string_pretty(&self.manifest_json()).unwrap();

        let out = dir.join(format!("{}.package", self.id));
        write_package(&manifest, &bundle, &out).unwrap();
        out
    }
}

fn put(base: &Path, rel: &str, content: &str) {
    let path = base.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}
