//! Placeholder substitution
//!
//! Pure text substitution over addon content, in two mutually exclusive
//! grammars selected at config-parse time:
//!
//! - Current: `{name}` tokens with case variants (`{identifier^}`,
//!   `{identifier!}`) and an escape form `!{...}` that unescapes to the
//!   literal token.
//! - Legacy: `^#name#^` and `__name__` tokens against a fixed table.
//!
//! Unmatched tokens of the active grammar pass through verbatim; addon
//! content that merely resembles template syntax must not error. Each pass
//! is a single regex sweep, so substituted values are never re-expanded.

use crate::record::InstallRoot;
use brokkr_core::types::{AddonConfig, PlaceholderGrammar};
use brokkr_core::{engine_target, Result};
use rand::Rng;
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;
use walkdir::WalkDir;

fn current_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"!?\{[^{}]+\}").expect("static pattern"))
}

fn legacy_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\^#[a-z]+#\^|__[a-z]+__").expect("static pattern"))
}

/// Process-start timestamp, captured once
fn start_timestamp() -> i64 {
    static STAMP: OnceLock<i64> = OnceLock::new();
    *STAMP.get_or_init(|| chrono::Utc::now().timestamp())
}

pub(crate) fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Resolve one current-grammar token name, `{` and `}` stripped
fn current_value(config: &AddonConfig, root: &InstallRoot, name: &str) -> Option<String> {
    let info = &config.info;
    let id = &info.identifier;

    let value = match name {
        "identifier" => id.clone(),
        "identifier^" => capitalize(id),
        "identifier!" => id.to_uppercase(),
        "name" => info.name.clone(),
        "name!" => info.name.to_uppercase(),
        "author" => info.author.clone().unwrap_or_else(|| "null".to_string()),
        "version" => info.version.clone(),

        "random" => rand::rng().random_range(0..100_000).to_string(),
        "timestamp" => start_timestamp().to_string(),
        "mode" => "local".to_string(),
        "target" => engine_target(),
        "is_target" => "false".to_string(),

        "root" => root.path().to_string_lossy().into_owned(),
        "root/public" => root.record_public_dir(id).to_string_lossy().into_owned(),
        "root/data" => root.record_private_dir(id).to_string_lossy().into_owned(),
        "root/fs" => root.record_fs_dir(id).to_string_lossy().into_owned(),

        "webroot" => "/".to_string(),
        "webroot/public" => format!("/addons/{}", id),
        "webroot/fs" => format!("/fs/addons/{}", id),

        _ => return None,
    };

    Some(value)
}

/// Resolve one legacy-grammar key, delimiters stripped
fn legacy_value(config: &AddonConfig, root: &InstallRoot, key: &str) -> Option<String> {
    let info = &config.info;

    let value = match key {
        "version" => info.version.clone(),
        "author" => info.author.clone().unwrap_or_else(|| "null".to_string()),
        "name" => info.name.clone(),
        "identifier" => info.identifier.clone(),
        "path" => root.path().to_string_lossy().into_owned(),
        "datapath" => root
            .record_private_dir(&info.identifier)
            .to_string_lossy()
            .into_owned(),
        "installmode" => "local".to_string(),
        "engineversion" => engine_target(),
        "timestamp" => start_timestamp().to_string(),
        _ => return None,
    };

    Some(value)
}

/// Substitute placeholders in `text` per the config's active grammar.
///
/// Pure and total: unmatched tokens are left verbatim.
pub fn substitute(config: &AddonConfig, root: &InstallRoot, text: &str) -> String {
    match config.grammar {
        PlaceholderGrammar::Ignore => text.to_string(),
        PlaceholderGrammar::Legacy => legacy_pattern()
            .replace_all(text, |caps: &Captures| {
                let token = &caps[0];
                let key = token.trim_matches(|c| c == '^' || c == '#' || c == '_');
                legacy_value(config, root, key).unwrap_or_else(|| token.to_string())
            })
            .into_owned(),
        PlaceholderGrammar::Current => current_pattern()
            .replace_all(text, |caps: &Captures| {
                let token = &caps[0];
                if let Some(escaped) = token.strip_prefix('!') {
                    // !{...} unescapes to the literal token
                    return escaped.to_string();
                }
                let name = &token[1..token.len() - 1];
                current_value(config, root, name).unwrap_or_else(|| token.to_string())
            })
            .into_owned(),
    }
}

/// Whether file content must be treated as binary. A NUL byte anywhere is
/// the only binary/text discriminator in the system.
fn is_binary(content: &[u8]) -> bool {
    content.contains(&0)
}

/// Recursively substitute placeholders in every text file under `dir`.
///
/// Depth-first; binary files are skipped byte-for-byte while the walk
/// continues through their siblings.
pub fn substitute_file_tree(config: &AddonConfig, root: &InstallRoot, dir: &Path) -> Result<()> {
    if config.grammar == PlaceholderGrammar::Ignore {
        return Ok(());
    }

    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }

        let content = std::fs::read(entry.path())?;
        if is_binary(&content) {
            debug!("skipping binary file: {:?}", entry.path());
            continue;
        }

        let text = String::from_utf8_lossy(&content);
        let substituted = substitute(config, root, &text);

        if substituted != text {
            std::fs::write(entry.path(), substituted)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokkr_core::types::parse_config;
    use tempfile::TempDir;

    fn config(extra: &str) -> AddonConfig {
        let yaml = format!(
            r#"
info:
  identifier: demo
  name: Demo
  description: d
  version: "2.0.0"
  target: "panel@1.11"
  author: Jo
{}
admin:
  view: admin/view.blade.php
"#,
            extra
        );
        parse_config(&yaml, &[]).unwrap()
    }

    fn root() -> InstallRoot {
        InstallRoot::new("/srv/panel")
    }

    #[test]
    fn test_identity_on_non_matching_input() {
        let text = "no tokens here, just text with } and { apart";
        assert_eq!(substitute(&config(""), &root(), text), text);
    }

    #[test]
    fn test_unmatched_tokens_pass_through() {
        let text = "keep {unknownToken} as-is";
        assert_eq!(substitute(&config(""), &root(), text), text);
    }

    #[test]
    fn test_current_grammar_table() {
        let cfg = config("");
        let out = substitute(
            &cfg,
            &root(),
            "{identifier} {identifier^} {identifier!} {name!} {author} {version} {webroot/public}",
        );
        assert_eq!(out, "demo Demo DEMO DEMO Jo 2.0.0 /addons/demo");
    }

    #[test]
    fn test_root_paths() {
        let cfg = config("");
        let out = substitute(&cfg, &root(), "{root}|{root/public}|{root/data}");
        assert_eq!(
            out,
            "/srv/panel|/srv/panel/.framework/extensions/demo/public|/srv/panel/.framework/extensions/demo/private"
        );
    }

    #[test]
    fn test_escape_form_unescapes() {
        let cfg = config("");
        assert_eq!(substitute(&cfg, &root(), "use !{name} here"), "use {name} here");
    }

    #[test]
    fn test_ignore_flag_is_identity() {
        let cfg = config("  flags: \"ignorePlaceholders\"");
        assert_eq!(substitute(&cfg, &root(), "{name}"), "{name}");
    }

    #[test]
    fn test_legacy_grammar() {
        let cfg = config("  flags: \"forceLegacyPlaceholders\"");
        let out = substitute(&cfg, &root(), "^#name#^ __version__ __unknown__");
        assert_eq!(out, "Demo 2.0.0 __unknown__");
    }

    #[test]
    fn test_substitution_is_idempotent() {
        let cfg = config("");
        let text = "Hello {name}, by {author}";
        let once = substitute(&cfg, &root(), text);
        let twice = substitute(&cfg, &root(), &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_file_tree_skips_binary_substitutes_siblings() {
        let cfg = config("");
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let binary = [0x7fu8, b'E', b'L', b'F', 0x00, b'{', b'n', b'a', b'm', b'e', b'}'];
        std::fs::write(dir.path().join("bin.dat"), binary).unwrap();
        std::fs::write(dir.path().join("index.html"), "Hello {name}").unwrap();
        std::fs::write(nested.join("deep.txt"), "v{version}").unwrap();

        substitute_file_tree(&cfg, &root(), dir.path()).unwrap();

        assert_eq!(
            std::fs::read(dir.path().join("bin.dat")).unwrap(),
            binary.to_vec()
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("index.html")).unwrap(),
            "Hello Demo"
        );
        assert_eq!(
            std::fs::read_to_string(nested.join("deep.txt")).unwrap(),
            "v2.0.0"
        );
    }
}
