//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Brokkr - addon package manager for the panel
#[derive(Parser, Debug)]
#[command(name = "brokkr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Panel directory (defaults to the current directory)
    #[arg(short, long, global = true, env = "PANEL_DIRECTORY")]
    pub panel: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install addon packages
    Install(InstallArgs),

    /// Remove installed addons
    Remove(RemoveArgs),

    /// Upgrade installed addons from newer packages
    Upgrade(UpgradeArgs),

    /// List installed addons
    List(ListArgs),

    /// Show a package's metadata and the files it would touch
    Inspect(InspectArgs),

    /// Pack a manifest and bundle directory into a package
    Bundle(BundleArgs),

    /// Reinstall frontend dependencies and rebuild panel assets
    Rebuild(RebuildArgs),

    /// Show version information
    Version(VersionArgs),
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Package files to install
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Reinstall over an existing record
    #[arg(short, long)]
    pub force: bool,

    /// Skip the declarative installation steps
    #[arg(long)]
    pub skip_steps: bool,

    /// Rebuild the panel frontend afterwards
    #[arg(long)]
    pub rebuild: bool,

    /// Rebuild without the smooth asset snapshot
    #[arg(long)]
    pub no_smooth: bool,

    /// Answer yes to every prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Identifiers of the addons to remove
    #[arg(required = true)]
    pub addons: Vec<String>,

    /// Roll back the addons' database migrations
    #[arg(long)]
    pub migrate: bool,

    /// Rebuild the panel frontend afterwards
    #[arg(long)]
    pub rebuild: bool,

    /// Rebuild without the smooth asset snapshot
    #[arg(long)]
    pub no_smooth: bool,

    /// Answer yes to every prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct UpgradeArgs {
    /// Package files holding the new versions
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Skip the declarative installation steps
    #[arg(long)]
    pub skip_steps: bool,

    /// Rebuild the panel frontend afterwards
    #[arg(long)]
    pub rebuild: bool,

    /// Rebuild without the smooth asset snapshot
    #[arg(long)]
    pub no_smooth: bool,

    /// Answer yes to every prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Package file to inspect
    pub file: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct BundleArgs {
    /// Bundle directory containing conf.yml
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Manifest file
    #[arg(short, long, default_value = "manifest.json")]
    pub manifest: PathBuf,

    /// Output directory (defaults to the current directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only write the package, not the intermediate bundle archive
    #[arg(long)]
    pub package_only: bool,
}

#[derive(Args, Debug)]
pub struct RebuildArgs {
    /// Rebuild without the smooth asset snapshot
    #[arg(long)]
    pub no_smooth: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
