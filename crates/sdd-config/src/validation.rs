//! Config-file validation (SPEC_FULL.md §6, "supplemented"): malformed
//! fields are reported `Issue`-style rather than silently defaulted,
//! mirroring C2's validator shape without taking a dependency on
//! `sdd-validate` (a spec document and a config file are different
//! things validated for different reasons).

use sdd_utils::error::IssueSeverity;
use serde_json::Value;

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["specs_root", "output", "cache", "providers", "skills"];
const KNOWN_OUTPUT_KEYS: &[&str] = &["json", "compact", "default_format"];
const KNOWN_FORMATS: &[&str] = &["text", "json", "markdown"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: IssueSeverity,
    pub location: String,
    pub message: String,
}

impl ConfigIssue {
    fn error(location: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigIssue { severity: IssueSeverity::Error, location: location.into(), message: message.into() }
    }

    fn info(location: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigIssue { severity: IssueSeverity::Info, location: location.into(), message: message.into() }
    }
}

#[must_use]
pub fn validate_raw(value: &Value) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    let Some(root) = value.as_object() else {
        issues.push(ConfigIssue::error("$", "config file must be a JSON object"));
        return issues;
    };

    for key in root.keys() {
        if !KNOWN_TOP_LEVEL_KEYS.contains(&key.as_str()) {
            issues.push(ConfigIssue::info(key, "unrecognized top-level config key, ignored"));
        }
    }

    if let Some(output) = root.get("output") {
        match output.as_object() {
            Some(output) => {
                for key in output.keys() {
                    if !KNOWN_OUTPUT_KEYS.contains(&key.as_str()) {
                        issues.push(ConfigIssue::info(format!("output.{key}"), "unrecognized key, ignored"));
                    }
                }
                if let Some(format) = output.get("default_format") {
                    let valid = format.as_str().is_some_and(|f| KNOWN_FORMATS.contains(&f));
                    if !valid {
                        issues.push(ConfigIssue::error(
                            "output.default_format",
                            format!("must be one of {KNOWN_FORMATS:?}, got {format}"),
                        ));
                    }
                }
            }
            None => issues.push(ConfigIssue::error("output", "must be an object")),
        }
    }

    if let Some(cache) = root.get("cache") {
        if !cache.is_object() {
            issues.push(ConfigIssue::error("cache", "must be an object"));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flags_unknown_output_format_as_error() {
        let issues = validate_raw(&json!({"output": {"default_format": "yaml"}}));
        assert!(issues.iter().any(|i| i.severity == IssueSeverity::Error && i.location == "output.default_format"));
    }

    #[test]
    fn flags_unknown_top_level_key_as_info_only() {
        let issues = validate_raw(&json!({"unknown_feature": true}));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, IssueSeverity::Info);
    }

    #[test]
    fn accepts_a_well_formed_config() {
        let issues = validate_raw(&json!({
            "output": {"json": true, "compact": false, "default_format": "json"},
            "cache": {"enabled": true, "dir": "/tmp/cache", "ttl_hours": 24, "max_size_mb": 512},
        }));
        assert!(issues.is_empty());
    }
}
