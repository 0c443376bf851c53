//! Console command declarations (console.yml)
//!
//! Addons shipping a `data.console` directory describe their artisan-style
//! commands in a console.yml at its root.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One console command contributed by an addon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleEntry {
    #[serde(rename = "Signature")]
    pub signature: String,

    #[serde(rename = "Description")]
    pub description: String,

    #[serde(rename = "Path")]
    pub path: String,

    /// Optional schedule interval
    #[serde(rename = "Interval", default)]
    pub interval: Option<String>,
}

/// Parse a console.yml command list
pub fn parse_console_config(yaml: &str) -> Result<Vec<ConsoleEntry>> {
    serde_yaml_ng::from_str(yaml).map_err(|err| {
        debug!("console config parse failed: {}", err);
        Error::invalid_package("malformed console.yml")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_console_entries() {
        let yaml = r#"
- Signature: "demo:prune"
  Description: "Prune stale demo rows"
  Path: "PruneCommand.php"
  Interval: "daily"
- Signature: "demo:sync"
  Description: "Sync demo state"
  Path: "SyncCommand.php"
"#;
        let entries = parse_console_config(yaml).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].signature, "demo:prune");
        assert_eq!(entries[0].interval.as_deref(), Some("daily"));
        assert!(entries[1].interval.is_none());
    }

    #[test]
    fn test_malformed_console_config() {
        let err = parse_console_config("{{").unwrap_err();
        assert!(matches!(err, Error::InvalidPackage { .. }));
    }
}
