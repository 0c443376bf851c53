//! Addon package transaction engine
//!
//! This crate handles:
//! - Package archive reading (both package generations)
//! - Placeholder substitution (legacy and current grammars)
//! - The installed-addon record layout
//! - Router file stitching
//! - Step replay interpretation
//! - The install/remove/upgrade transaction executor
//! - The external process gateway

pub mod archive;
pub mod executor;
pub mod placeholders;
pub mod process;
pub mod record;
pub mod routes;
pub mod steps;

pub use archive::{pack_dir, write_package, PackageArchive};
pub use executor::{
    AddonEngine, InstallOptions, PackageProbe, PendingTransaction, RemoveOptions, TransactionFlow,
    TransactionLog, TxState, UpgradeOptions,
};
pub use placeholders::{substitute, substitute_file_tree};
pub use process::{ProcessGateway, ScriptEnv, ShellGateway};
pub use record::InstallRoot;
pub use steps::{PendingManualStep, RouteAction, StepRecord, StepStatus};
