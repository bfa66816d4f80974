//! Config discovery (SPEC_FULL.md §2 A3): CLI overrides > config file >
//! built-in defaults, the file found by walking up from the current
//! directory, grounded on `xchecker-config`'s `Config::discover_from`
//! precedence but simplified to the JSON-only schema of spec.md §6.2.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use sdd_utils::error::IssueSeverity;
use sdd_utils::{SddError, SddResult};
use serde::{Deserialize, Serialize};

use crate::model::Config;
use crate::validation::{validate_raw, ConfigIssue};

pub const CONFIG_RELATIVE_PATH: &str = ".claude/sdd_config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Cli,
}

/// CLI-supplied overrides; each field present here wins over the file
/// and the built-in default for that key.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub specs_root: Option<Utf8PathBuf>,
    pub config_path: Option<Utf8PathBuf>,
    pub json: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Discovered {
    pub config: Config,
    pub config_path: Option<Utf8PathBuf>,
    pub source_attribution: BTreeMap<String, ConfigSource>,
    /// Non-fatal issues surfaced from the config file (unknown keys,
    /// etc.); fatal (`error`-severity) issues fail discovery instead of
    /// appearing here.
    pub issues: Vec<ConfigIssue>,
}

/// Discover and load configuration starting from `start_dir`, the
/// path-driven variant so tests avoid depending on the real CWD.
pub fn discover_from(start_dir: &Utf8Path, overrides: &ConfigOverrides) -> SddResult<Discovered> {
    let mut config = Config::default();
    let mut attribution = BTreeMap::new();
    attribution.insert("specs_root".to_string(), ConfigSource::Default);
    attribution.insert("output".to_string(), ConfigSource::Default);
    attribution.insert("cache".to_string(), ConfigSource::Default);
    attribution.insert("providers".to_string(), ConfigSource::Default);
    attribution.insert("skills".to_string(), ConfigSource::Default);

    let config_path = overrides
        .config_path
        .clone()
        .or_else(|| find_upward(start_dir));

    let mut issues = Vec::new();

    if let Some(path) = &config_path {
        let raw = std::fs::read_to_string(path.as_std_path())
            .map_err(|source| SddError::IoError { path: Some(path.as_std_path().to_path_buf()), source })?;
        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| SddError::UserError(format!("malformed config at {path}: {e}")))?;

        issues = validate_raw(&value);
        if issues.iter().any(|i| i.severity == IssueSeverity::Error) {
            let details = issues
                .iter()
                .filter(|i| i.severity == IssueSeverity::Error)
                .map(|i| format!("{}: {}", i.location, i.message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(SddError::UserError(format!("config file {path} failed validation: {details}")));
        }

        let file_config: Config = serde_json::from_value(value.clone())
            .map_err(|e| SddError::UserError(format!("malformed config at {path}: {e}")))?;

        if let Some(object) = value.as_object() {
            for key in object.keys() {
                attribution.insert(key.clone(), ConfigSource::File);
            }
        }
        config = file_config;
    }

    if let Some(root) = &overrides.specs_root {
        config.specs_root = root.clone();
        attribution.insert("specs_root".to_string(), ConfigSource::Cli);
    }
    if let Some(json) = overrides.json {
        config.output.json = json;
        attribution.insert("output.json".to_string(), ConfigSource::Cli);
    }

    Ok(Discovered { config, config_path, source_attribution: attribution, issues })
}

fn find_upward(start_dir: &Utf8Path) -> Option<Utf8PathBuf> {
    sdd_utils::paths::find_upward(start_dir, CONFIG_RELATIVE_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn isolated_dir() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    #[test]
    fn discovers_defaults_when_no_config_file_exists() {
        let (_dir, root) = isolated_dir();
        let discovered = discover_from(&root, &ConfigOverrides::default()).unwrap();
        assert_eq!(discovered.config, Config::default());
        assert_eq!(discovered.source_attribution["specs_root"], ConfigSource::Default);
    }

    #[test]
    fn loads_and_merges_a_config_file_found_upward() {
        let (_dir, root) = isolated_dir();
        std::fs::create_dir_all(root.join(".claude")).unwrap();
        std::fs::write(
            root.join(".claude/sdd_config.json"),
            r#"{"output": {"json": true, "default_format": "json"}}"#,
        )
        .unwrap();
        let nested = root.join("a/b/c");
        std::fs::create_dir_all(nested.as_std_path()).unwrap();

        let discovered = discover_from(&nested, &ConfigOverrides::default()).unwrap();
        assert!(discovered.config.output.json);
        assert_eq!(discovered.source_attribution["output"], ConfigSource::File);
    }

    #[test]
    fn cli_override_wins_over_file_and_default() {
        let (_dir, root) = isolated_dir();
        let overrides = ConfigOverrides { json: Some(true), ..ConfigOverrides::default() };
        let discovered = discover_from(&root, &overrides).unwrap();
        assert!(discovered.config.output.json);
        assert_eq!(discovered.source_attribution["output.json"], ConfigSource::Cli);
    }

    #[test]
    fn a_malformed_config_file_fails_discovery() {
        let (_dir, root) = isolated_dir();
        std::fs::create_dir_all(root.join(".claude")).unwrap();
        std::fs::write(
            root.join(".claude/sdd_config.json"),
            r#"{"output": {"default_format": "yaml"}}"#,
        )
        .unwrap();
        let err = discover_from(&root, &ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, SddError::UserError(_)));
    }
}
