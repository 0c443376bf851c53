//! Remove installed addons

use crate::cli::RemoveArgs;
use crate::output;
use anyhow::Result;
use brokkr_addons::RemoveOptions;
use std::path::Path;

pub async fn run(args: RemoveArgs, panel: Option<&Path>) -> Result<()> {
    let mut engine = super::engine(panel)?;

    let prompt = format!("Remove {}?", args.addons.join(", "));
    if !super::confirm_batch(&prompt, args.yes)? {
        output::warning("aborted");
        return Ok(());
    }

    let options = RemoveOptions {
        migrate: args.migrate,
    };

    for addon in &args.addons {
        let spinner = output::spinner(&format!("removing {}", addon));
        let flow = engine.remove(addon, &options).await;
        spinner.finish_and_clear();

        match flow {
            Ok(flow) => {
                super::drive(&mut engine, flow, args.yes).await?;
                output::success(&format!("removed {}", addon));
            }
            Err(err) => {
                output::error(&format!("{}: {}", addon, err));
                return Err(err);
            }
        }
    }

    if args.rebuild {
        super::run_rebuild(&engine, !args.no_smooth).await?;
    }
    Ok(())
}
