//! List installed addons from their records

use crate::cli::ListArgs;
use crate::output;
use anyhow::Result;
use brokkr_core::types::parse_config;
use serde_json::json;
use std::path::Path;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Target")]
    target: String,
}

pub fn run(args: ListArgs, panel: Option<&Path>) -> Result<()> {
    let root = super::install_root(panel)?;
    let ids = root.installed_ids()?;

    let mut rows = Vec::new();
    for id in &ids {
        let conf_path = root.record_private_dir(id).join("conf.yml");
        let row = match std::fs::read_to_string(&conf_path)
            .ok()
            .and_then(|yaml| parse_config(&yaml, &[]).ok())
        {
            Some(config) => Row {
                id: id.clone(),
                name: config.info.name,
                version: config.info.version,
                target: config.info.target,
            },
            // record exists but its config is unreadable
            None => Row {
                id: id.clone(),
                name: "?".to_string(),
                version: "?".to_string(),
                target: "?".to_string(),
            },
        };
        rows.push(row);
    }

    if args.json {
        let entries: Vec<_> = rows
            .iter()
            .map(|row| {
                json!({
                    "id": row.id,
                    "name": row.name,
                    "version": row.version,
                    "target": row.target,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if rows.is_empty() {
        output::info("no addons installed");
        return Ok(());
    }

    println!("{}", Table::new(rows));
    Ok(())
}
