//! Error types for brokkr-core

use thiserror::Error;

/// Result type alias using brokkr-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for brokkr
#[derive(Error, Debug)]
pub enum Error {
    /// The package archive or its embedded schemas could not be trusted.
    /// Archive corruption, malformed JSON/YAML and schema mismatches all
    /// collapse into this one operator-visible kind; the root cause is
    /// logged, not surfaced.
    #[error("invalid package: {message}")]
    InvalidPackage { message: String },

    /// Package file does not exist
    #[error("file does not exist: {path}")]
    FileNotFound { path: String },

    /// Package file has the wrong extension
    #[error("invalid file type, file must end in .package: {path}")]
    WrongFileType { path: String },

    /// Addon is already installed and the operation was not forced
    #[error("addon already installed, upgrade instead: {id}")]
    AlreadyInstalled { id: String },

    /// Addon is not installed
    #[error("addon is not installed: {id}")]
    NotInstalled { id: String },

    /// Package requires a newer engine
    #[error("engine version requirement not met: requires {required}, running {current}")]
    RequirementNotMet { required: String, current: String },

    /// Addon identifier does not match [a-zA-Z0-9_-]+
    #[error("invalid addon identifier: {id}")]
    InvalidIdentifier { id: String },

    /// Invalid semver version
    #[error("invalid version format: {version}")]
    InvalidVersion { version: String },

    /// Operator declined a manual step; the operation can be resumed by
    /// rerunning the same command
    #[error("cancelled, rerun the command to resume")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid package error
    pub fn invalid_package(message: impl Into<String>) -> Self {
        Self::InvalidPackage {
            message: message.into(),
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a wrong file type error
    pub fn wrong_file_type(path: impl Into<String>) -> Self {
        Self::WrongFileType { path: path.into() }
    }

    /// Create an already installed error
    pub fn already_installed(id: impl Into<String>) -> Self {
        Self::AlreadyInstalled { id: id.into() }
    }

    /// Create a not installed error
    pub fn not_installed(id: impl Into<String>) -> Self {
        Self::NotInstalled { id: id.into() }
    }

    /// Create a requirement not met error
    pub fn requirement_not_met(required: impl Into<String>, current: impl Into<String>) -> Self {
        Self::RequirementNotMet {
            required: required.into(),
            current: current.into(),
        }
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(id: impl Into<String>) -> Self {
        Self::InvalidIdentifier { id: id.into() }
    }

    /// Create an invalid version error
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
        }
    }

    /// True for failures that are detected before any filesystem mutation
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::InvalidPackage { .. }
                | Self::FileNotFound { .. }
                | Self::WrongFileType { .. }
                | Self::AlreadyInstalled { .. }
                | Self::NotInstalled { .. }
                | Self::RequirementNotMet { .. }
                | Self::InvalidIdentifier { .. }
                | Self::InvalidVersion { .. }
        )
    }
}
