//! Framework config (conf.yml) parsing
//!
//! The config is the addon's declarative capability manifest: which views,
//! routes, controllers, assets and migrations it contributes. It is parsed
//! fresh on every install/remove/upgrade invocation and never mutated.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Behavior flags carried in `info.flags` as a comma-separated string.
/// Unknown tokens are silently dropped, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    IgnorePlaceholders,
    ForceLegacyPlaceholders,
    HasInstallScript,
    HasRemovalScript,
}

impl Flag {
    /// Parse one flag token; `None` for unknown tokens
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "ignorePlaceholders" => Some(Self::IgnorePlaceholders),
            "forceLegacyPlaceholders" => Some(Self::ForceLegacyPlaceholders),
            "hasInstallScript" => Some(Self::HasInstallScript),
            "hasRemovalScript" => Some(Self::HasRemovalScript),
            _ => None,
        }
    }

    /// Canonical token for this flag
    pub fn token(&self) -> &'static str {
        match self {
            Self::IgnorePlaceholders => "ignorePlaceholders",
            Self::ForceLegacyPlaceholders => "forceLegacyPlaceholders",
            Self::HasInstallScript => "hasInstallScript",
            Self::HasRemovalScript => "hasRemovalScript",
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Which placeholder grammar applies, resolved once at config-parse time
/// and carried as data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceholderGrammar {
    /// Substitution is the identity function
    Ignore,

    /// `^#name#^` / `__name__` tokens against the fixed legacy table
    Legacy,

    /// `{name}` tokens with case variants and the `!{...}` escape
    #[default]
    Current,
}

/// The pre-release marker selecting the legacy grammar when present in the
/// free-form `info.target` field
const LEGACY_TARGET_MARKER: &str = "indev";

/// Addon identity and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddonInfo {
    pub identifier: String,
    pub name: String,
    pub description: String,
    pub version: String,

    /// Declared target framework version, a free-form string
    pub target: String,

    #[serde(default)]
    pub icon: Option<String>,

    /// Raw comma-separated flag string; the parsed set lives on
    /// [`AddonConfig::flags`]
    #[serde(default)]
    pub flags: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub website: Option<String>,
}

/// Admin panel surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub view: String,

    #[serde(default)]
    pub controller: Option<String>,

    #[serde(default)]
    pub css: Option<String>,

    #[serde(default)]
    pub wrapper: Option<String>,
}

/// Dashboard surface
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub css: Option<String>,

    #[serde(default)]
    pub wrapper: Option<String>,
}

/// Request-handling contributions (views, controllers, routers)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestsConfig {
    #[serde(default)]
    pub views: Option<String>,

    #[serde(default)]
    pub controllers: Option<String>,

    /// App class tree; defaults to `controllers` when absent
    #[serde(default)]
    pub app: Option<String>,

    #[serde(default)]
    pub routers: Option<RoutersConfig>,
}

/// Router file contributions, one per route table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutersConfig {
    #[serde(default)]
    pub client: Option<String>,

    #[serde(default)]
    pub application: Option<String>,

    #[serde(default)]
    pub web: Option<String>,
}

/// Data contributions (public assets, private directory, console commands)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub public: Option<String>,

    #[serde(default)]
    pub directory: Option<String>,

    #[serde(default)]
    pub console: Option<String>,
}

/// Database contributions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub migrations: Option<String>,
}

/// The addon's capability declaration from conf.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddonConfig {
    pub info: AddonInfo,
    pub admin: AdminConfig,

    #[serde(default)]
    pub dashboard: Option<DashboardConfig>,

    #[serde(default)]
    pub requests: Option<RequestsConfig>,

    #[serde(default)]
    pub data: Option<DataConfig>,

    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Parsed flag set, filled during [`parse_config`]
    #[serde(skip)]
    pub flags: Vec<Flag>,

    /// Active placeholder grammar, resolved during [`parse_config`]
    #[serde(skip)]
    pub grammar: PlaceholderGrammar,
}

impl AddonConfig {
    /// Whether a flag survived parsing and exclusion
    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }
}

/// Parse and validate a framework config.
///
/// `excluded_flags` filters the parsed flag set post-validation, letting an
/// operator suppress a behavior without repackaging the addon.
pub fn parse_config(yaml: &str, excluded_flags: &[String]) -> Result<AddonConfig> {
    let mut config: AddonConfig = serde_yaml_ng::from_str(yaml).map_err(|err| {
        debug!("config parse failed: {}", err);
        Error::invalid_package("malformed conf.yml")
    })?;

    config.flags = config
        .info
        .flags
        .as_deref()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter_map(Flag::parse)
                .filter(|flag| !excluded_flags.iter().any(|ex| ex == flag.token()))
                .collect()
        })
        .unwrap_or_default();

    if let Some(requests) = &mut config.requests {
        if requests.app.is_none() {
            requests.app = requests.controllers.clone();
        }
    }

    config.grammar = if config.has_flag(Flag::IgnorePlaceholders) {
        PlaceholderGrammar::Ignore
    } else if config.has_flag(Flag::ForceLegacyPlaceholders)
        || config.info.target.contains(LEGACY_TARGET_MARKER)
    {
        PlaceholderGrammar::Legacy
    } else {
        PlaceholderGrammar::Current
    };

    Ok(config)
}
