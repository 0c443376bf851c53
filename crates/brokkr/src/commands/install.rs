//! Install one or more addon packages

use crate::cli::InstallArgs;
use crate::output;
use anyhow::Result;
use brokkr_addons::InstallOptions;
use std::path::Path;

pub async fn run(args: InstallArgs, panel: Option<&Path>) -> Result<()> {
    let mut engine = super::engine(panel)?;

    let prompt = format!("Install {} addon(s)?", args.files.len());
    if !super::confirm_batch(&prompt, args.yes)? {
        output::warning("aborted");
        return Ok(());
    }

    let options = InstallOptions {
        force: args.force,
        skip_steps: args.skip_steps,
    };

    for file in &args.files {
        let spinner = output::spinner(&format!("installing {}", file.display()));
        let flow = engine.install(file, &options).await;
        spinner.finish_and_clear();

        match flow {
            Ok(flow) => {
                let log = super::drive(&mut engine, flow, args.yes).await?;
                output::success(&format!(
                    "installed {} ({} steps)",
                    file.display(),
                    log.len()
                ));
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
