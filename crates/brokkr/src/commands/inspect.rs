//! Show a package's metadata and the host files it would touch

use crate::cli::InspectArgs;
use crate::output;
use anyhow::Result;
use serde_json::json;
use std::path::Path;

pub fn run(args: InspectArgs, panel: Option<&Path>) -> Result<()> {
    let engine = super::engine(panel)?;
    let probe = engine.probe(&args.file)?;
    let root = engine.root();

    let manifest = &probe.manifest;
    let config = &probe.config;
    let id = &manifest.id;

    let mut footprint = vec![
        root.record_dir(id),
        root.admin_view_file(id),
        root.admin_controller_dir(id),
    ];
    if let Some(requests) = &config.requests {
        if requests.views.is_some() {
            footprint.push(root.views_dir(id));
        }
        if requests.app.is_some() {
            footprint.push(root.app_dir(id));
        }
        if let Some(routers) = &requests.routers {
            if routers.client.is_some() {
                footprint.push(root.join(format!("routes/addons/client/{}.php", id)));
            }
            if routers.application.is_some() {
                footprint.push(root.join(format!("routes/addons/application/{}.php", id)));
            }
            if routers.web.is_some() {
                footprint.push(root.join(format!("routes/addons/web/{}.php", id)));
            }
        }
    }
    if config.admin.css.is_some() {
        footprint.push(root.admin_layout_file());
    }
    if config.dashboard.as_ref().is_some_and(|d| d.css.is_some()) {
        footprint.push(root.dashboard_layout_file());
    }
    if config.data.as_ref().is_some_and(|d| d.public.is_some()) {
        footprint.push(root.public_symlink(id));
    }
    if config
        .database
        .as_ref()
        .is_some_and(|db| db.migrations.is_some())
    {
        footprint.push(root.migrations_dir(id));
    }
    footprint.push(root.fs_symlink(id));

    if args.json {
        let value = json!({
            "manifest": manifest,
            "config": config,
            "footprint": footprint
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    output::header(&format!("{} {}", config.info.name, config.info.version));
    output::kv("identifier", id);
    output::kv("target", &config.info.target);
    output::kv("requirement", &manifest.requirement);
    if let Some(author) = &config.info.author {
        output::kv("author", author);
    }
    if let Some(flags) = &config.info.flags {
        output::kv("flags", flags);
    }
    output::kv("install steps", &manifest.installation.len().to_string());
    output::kv(
        "installed",
        if root.is_installed(id) { "yes" } else { "no" },
    );

    output::header("Files this addon would touch");
    for path in &footprint {
        println!("  {}", path.display());
    }
    Ok(())
}
