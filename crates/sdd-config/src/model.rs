//! The config file schema (spec.md §6.2) plus the provider/skill tables
//! C8 needs for model resolution (spec.md §4.8). The spec only names
//! `output` and `cache`; `specs_root`, `providers`, and `skills` are
//! ambient additions every command needs to locate specs and resolve a
//! model deterministically.

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub json: bool,
    pub compact: bool,
    pub default_format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            json: false,
            compact: false,
            default_format: OutputFormat::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub dir: Utf8PathBuf,
    pub ttl_hours: u64,
    pub max_size_mb: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            enabled: true,
            dir: Utf8PathBuf::from(".claude/cache/sdd"),
            ttl_hours: 24,
            max_size_mb: 512,
        }
    }
}

/// One external provider's invocation shape (spec.md §4.8): `{tool,
/// command, default_model, flags, timeout_seconds, enabled}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub tool: String,
    pub command: String,
    pub default_model: String,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_timeout_seconds() -> u64 {
    90
}

fn default_true() -> bool {
    true
}

/// Per-skill model priority lists, keyed by tool (spec.md §4.8
/// `resolve_model`'s step 2: `skills.<skill>.models.<tool>.priority[0]`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillConfig {
    #[serde(default)]
    pub models: BTreeMap<String, ModelPriority>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelPriority {
    #[serde(default)]
    pub priority: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub specs_root: Utf8PathBuf,
    pub output: OutputConfig,
    pub cache: CacheConfig,
    pub providers: BTreeMap<String, ProviderConfig>,
    pub skills: BTreeMap<String, SkillConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            specs_root: Utf8PathBuf::from("./specs"),
            output: OutputConfig::default(),
            cache: CacheConfig::default(),
            providers: default_providers(),
            skills: BTreeMap::new(),
        }
    }
}

fn default_providers() -> BTreeMap<String, ProviderConfig> {
    let mut providers = BTreeMap::new();
    providers.insert(
        "claude".to_string(),
        ProviderConfig {
            tool: "claude".to_string(),
            command: "claude".to_string(),
            default_model: "sonnet".to_string(),
            flags: vec!["--print".to_string()],
            timeout_seconds: default_timeout_seconds(),
            enabled: true,
        },
    );
    providers.insert(
        "gemini".to_string(),
        ProviderConfig {
            tool: "gemini".to_string(),
            command: "gemini".to_string(),
            default_model: "gemini-2.5-pro".to_string(),
            flags: Vec::new(),
            timeout_seconds: default_timeout_seconds(),
            enabled: true,
        },
    );
    providers
}

impl Config {
    /// `resolve_model(skill, tool, override?) -> model` (spec.md §4.8):
    /// explicit override, then skill-level priority list, then the
    /// provider's built-in default. Always deterministic.
    #[must_use]
    pub fn resolve_model(&self, skill: &str, tool: &str, override_model: Option<&str>) -> String {
        if let Some(model) = override_model {
            return model.to_string();
        }
        if let Some(model) = self
            .skills
            .get(skill)
            .and_then(|s| s.models.get(tool))
            .and_then(|p| p.priority.first())
        {
            return model.clone();
        }
        self.providers
            .get(tool)
            .map(|p| p.default_model.clone())
            .unwrap_or_else(|| "default".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_model_prefers_explicit_override() {
        let config = Config::default();
        assert_eq!(config.resolve_model("planning", "claude", Some("opus")), "opus");
    }

    #[test]
    fn resolve_model_falls_back_to_skill_priority_then_provider_default() {
        let mut config = Config::default();
        let mut skill = SkillConfig::default();
        skill.models.insert("claude".to_string(), ModelPriority { priority: vec!["haiku".to_string()] });
        config.skills.insert("quick-fix".to_string(), skill);

        assert_eq!(config.resolve_model("quick-fix", "claude", None), "haiku");
        assert_eq!(config.resolve_model("unconfigured-skill", "claude", None), "sonnet");
    }
}
