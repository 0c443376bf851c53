//! Command implementations

pub mod bundle;
pub mod inspect;
pub mod install;
pub mod list;
pub mod rebuild;
pub mod remove;
pub mod upgrade;
pub mod version;

use crate::output;
use anyhow::Result;
use brokkr_addons::{
    AddonEngine, InstallRoot, ShellGateway, TransactionFlow, TransactionLog,
};
use std::path::Path;

/// Engine over the panel directory, current directory by default
pub(crate) fn engine(panel: Option<&Path>) -> Result<AddonEngine<ShellGateway>> {
    Ok(AddonEngine::new(install_root(panel)?, ShellGateway::new()))
}

pub(crate) fn install_root(panel: Option<&Path>) -> Result<InstallRoot> {
    let root = match panel {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()?,
    };
    Ok(InstallRoot::new(root))
}

/// Drive a transaction to completion, prompting for every manual route
/// edit. `--yes` confirms them all without asking.
pub(crate) async fn drive(
    engine: &mut AddonEngine<ShellGateway>,
    mut flow: TransactionFlow,
    yes: bool,
) -> Result<TransactionLog> {
    loop {
        match flow {
            TransactionFlow::Done(log) => return Ok(log),
            TransactionFlow::Pending(pending) => {
                println!("{}", pending.manual.instructions());
                let confirmed = yes
                    || dialoguer::Confirm::new()
                        .with_prompt("Route change applied?")
                        .default(true)
                        .interact()?;
                flow = engine.resume(pending, confirmed).await?;
            }
        }
    }
}

/// One up-front confirmation for a batch operation
pub(crate) fn confirm_batch(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    Ok(dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(true)
        .interact()?)
}

/// Single rebuild at the end of a batch
pub(crate) async fn run_rebuild(engine: &AddonEngine<ShellGateway>, smooth: bool) -> Result<()> {
    let spinner = output::spinner("rebuilding panel assets");
    let built = engine.rebuild(smooth).await?;
    spinner.finish_and_clear();

    if built {
        output::success("panel assets rebuilt");
    } else {
        output::warning("asset rebuild reported a failure, check the build output");
    }
    Ok(())
}
