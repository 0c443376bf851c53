//! Type definitions for addon manifests and framework configs

pub mod conf;
pub mod console;
pub mod manifest;

pub use conf::{
    parse_config, AddonConfig, AddonInfo, AdminConfig, DashboardConfig, DataConfig,
    DatabaseConfig, Flag, PlaceholderGrammar, RequestsConfig, RoutersConfig,
};
pub use console::{parse_console_config, ConsoleEntry};
pub use manifest::{has_package_extension, parse_manifest, AddonManifest, PathContext, RouteEntry, Step};
