//! Version information for the brokkr CLI

use brokkr_core::{ENGINE, ENGINE_VERSION};
use serde::Serialize;

/// Version information for the current build
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    /// Engine name
    pub name: &'static str,

    /// Semantic version
    pub version: &'static str,

    /// Git commit SHA (short)
    pub commit: Option<&'static str>,

    /// Build date
    pub build_date: Option<&'static str>,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            name: ENGINE,
            version: ENGINE_VERSION,
            commit: option_env!("GIT_SHA"),
            build_date: option_env!("BUILD_DATE"),
        }
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.version)?;
        if let Some(commit) = self.commit {
            write!(f, " ({})", commit)?;
        }
        Ok(())
    }
}
