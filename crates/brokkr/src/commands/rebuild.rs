use crate::cli::RebuildArgs;
use anyhow::Result;
use std::path::Path;

pub async fn run(args: RebuildArgs, panel: Option<&Path>) -> Result<()> {
    let engine = super::engine(panel)?;
    super::run_rebuild(&engine, !args.no_smooth).await
}
