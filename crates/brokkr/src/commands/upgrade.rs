//! Upgrade installed addons from newer packages

use crate::cli::UpgradeArgs;
use crate::output;
use anyhow::Result;
use brokkr_addons::UpgradeOptions;
use std::path::Path;

pub async fn run(args: UpgradeArgs, panel: Option<&Path>) -> Result<()> {
    let mut engine = super::engine(panel)?;

    let prompt = format!("Upgrade {} addon(s)?", args.files.len());
    if !super::confirm_batch(&prompt, args.yes)? {
        output::warning("aborted");
        return Ok(());
    }

    let options = UpgradeOptions {
        skip_steps: args.skip_steps,
    };

    for file in &args.files {
        let spinner = output::spinner(&format!("upgrading from {}", file.display()));
        let flow = engine.upgrade(file, &options).await;
        spinner.finish_and_clear();

        match flow {
            Ok(flow) => {
                super::drive(&mut engine, flow, args.yes).await?;
                output::success(&format!("upgraded from {}", file.display()));
            }
            Err(err) => {
                output::error(&format!("{}: {}", file.display(), err));
                return Err(err);
            }
        }
    }

    if args.rebuild {
        super::run_rebuild(&engine, !args.no_smooth).await?;
    }
    Ok(())
}
