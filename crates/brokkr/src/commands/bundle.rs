//! Pack a manifest and bundle directory into a Generation 2 package

use crate::cli::BundleArgs;
use crate::output;
use anyhow::{bail, Context, Result};
use brokkr_addons::{pack_dir, write_package};
use brokkr_core::BASELINE_REQUIREMENT;
use semver::Version;

pub fn run(args: BundleArgs) -> Result<()> {
    if !args.dir.join("conf.yml").exists() {
        bail!(
            "bundle directory has no conf.yml: {}",
            args.dir.display()
        );
    }

    let manifest_text = std::fs::read_to_string(&args.manifest)
        .with_context(|| format!("failed to read {}", args.manifest.display()))?;
    let mut manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("malformed manifest.json")?;

    let id = manifest
        .get("id")
        .and_then(|v| v.as_str())
        .context("manifest has no id")?
        .to_string();

    // packages built today must not claim an older engine floor
    let floor = Version::parse(BASELINE_REQUIREMENT)?;
    let requirement = manifest
        .get("requirement")
        .and_then(|v| v.as_str())
        .unwrap_or(BASELINE_REQUIREMENT)
        .to_string();
    match Version::parse(&requirement) {
        Ok(version) if version >= floor => {}
        _ => {
            output::warning(&format!(
                "raising requirement {} to the engine floor {}",
                requirement, BASELINE_REQUIREMENT
            ));
            manifest["requirement"] = serde_json::json!(BASELINE_REQUIREMENT);
        }
    }

    let out_dir = match args.output {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&out_dir)?;

    let bundle = pack_dir(&args.dir)?;

    if !args.package_only {
        let bundle_path = out_dir.join(format!("{}.bundle", id));
        std::fs::write(&bundle_path, &bundle)?;
        output::info(&format!("wrote {}", bundle_path.display()));
    }

    let package_path = out_dir.join(format!("{}.package", id));
    write_package(&serde_json::to_string_pretty(&manifest)?, &bundle, &package_path)?;
    output::success(&format!("wrote {}", package_path.display()));
    Ok(())
}
