//! Engine version gating
//!
//! Every package carries a minimum engine requirement in its manifest.
//! The gate runs before any filesystem mutation; failing it is a pure
//! precondition error with zero side effects.

use crate::error::{Error, Result};
use semver::Version;

/// Engine name passed to addon scripts via the ENGINE variable
pub const ENGINE: &str = "brokkr";

/// Running engine version
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Oldest known engine version, assumed when a manifest omits its
/// requirement field
pub const BASELINE_REQUIREMENT: &str = "1.0.0";

/// Engine target string exposed through placeholders and script
/// environments, e.g. `brokkr@1.4.0`
pub fn engine_target() -> String {
    format!("{}@{}", ENGINE, ENGINE_VERSION)
}

/// Compare a manifest requirement against the running engine.
///
/// Returns `RequirementNotMet` when the package requires a newer engine.
pub fn check_requirement(required: &str) -> Result<()> {
    let required_version =
        Version::parse(required).map_err(|_| Error::invalid_version(required))?;
    let current =
        Version::parse(ENGINE_VERSION).map_err(|_| Error::invalid_version(ENGINE_VERSION))?;

    if required_version > current {
        return Err(Error::requirement_not_met(required, ENGINE_VERSION));
    }

    Ok(())
}
