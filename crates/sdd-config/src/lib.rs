//! Ambient configuration layer (SPEC_FULL.md §2 A3, spec.md §6.2):
//! `.claude/sdd_config.json` discovery, the `output`/`cache` schema, and
//! the provider/skill tables C8 uses for model resolution.
//!
//! Grounded on `xchecker-config`'s discovery/model split, simplified to
//! a single JSON source (no TOML/YAML, no glob-based file selectors —
//! those concerns have no counterpart in the Spec State Engine).

mod discovery;
mod model;
mod validation;

pub use discovery::{discover_from, ConfigOverrides, ConfigSource, Discovered, CONFIG_RELATIVE_PATH};
pub use model::{CacheConfig, Config, ModelPriority, OutputConfig, OutputFormat, ProviderConfig, SkillConfig};
pub use validation::{validate_raw, ConfigIssue};
