//! # brokkr-core
//!
//! Core library for the brokkr CLI providing:
//! - Addon manifest parsing (manifest.json)
//! - Framework config parsing (conf.yml)
//! - Placeholder grammar selection
//! - Engine version gating

pub mod error;
pub mod types;
pub mod version;

pub use error::{Error, Result};
pub use version::{check_requirement, engine_target, BASELINE_REQUIREMENT, ENGINE, ENGINE_VERSION};
