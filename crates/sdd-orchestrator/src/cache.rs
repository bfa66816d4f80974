//! On-disk response cache (spec.md §4.8): keyed by
//! `hash(tool, model, normalized_prompt, system_prompt, skill_name,
//! structured_context_hash)`, TTL-expired, size-capped with LRU
//! eviction. Grounded on `xchecker-utils/src/cache.rs`'s
//! memory-plus-disk `InsightCache` layering, simplified to disk-only
//! (a provider round-trip already dominates any in-memory lookup cost)
//! and re-keyed for consultation requests instead of file insights.

use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sdd_config::CacheConfig;
use sdd_llm::ToolResponse;
use sdd_utils::{SddError, SddResult};

/// The inputs a cache key is derived from (spec.md §4.8).
#[derive(Debug, Clone)]
pub struct CacheKeyInput<'a> {
    pub tool: &'a str,
    pub model: &'a str,
    pub prompt: &'a str,
    pub system_prompt: Option<&'a str>,
    pub skill_name: &'a str,
    pub structured_context_hash: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
struct CacheKeyParts<'a> {
    tool: &'a str,
    model: &'a str,
    normalized_prompt: String,
    system_prompt: Option<&'a str>,
    skill_name: &'a str,
    structured_context_hash: Option<&'a str>,
}

fn normalize_prompt(prompt: &str) -> String {
    prompt.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[must_use]
pub fn cache_key(input: &CacheKeyInput<'_>) -> String {
    let parts = CacheKeyParts {
        tool: input.tool,
        model: input.model,
        normalized_prompt: normalize_prompt(input.prompt),
        system_prompt: input.system_prompt,
        skill_name: input.skill_name,
        structured_context_hash: input.structured_context_hash,
    };
    sdd_utils::canonical::content_hash(&parts)
}

/// Non-key metadata stashed alongside a cached response purely so
/// `cache-clear --spec-id`/`--review-type` (spec.md §6.1) can target a
/// subset of entries; never part of the lookup key itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheTags {
    pub skill: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    response: ToolResponse,
    cached_at: DateTime<Utc>,
    #[serde(default)]
    tags: Option<CacheTags>,
}

/// One entry's metadata for `cache-info` (spec.md §6.1), without
/// deserializing the full cached response text.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryInfo {
    pub key: String,
    pub tool: String,
    pub skill: Option<String>,
    pub spec_id: Option<String>,
    pub cached_at: DateTime<Utc>,
    pub size_bytes: u64,
}

/// A TTL-and-size-bounded disk cache of [`ToolResponse`]s.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: Utf8PathBuf,
    ttl: chrono::Duration,
    max_size_bytes: u64,
}

impl ResponseCache {
    /// Build a cache from a loaded [`CacheConfig`], creating its
    /// directory if needed. Returns `None` when the config disables
    /// caching.
    pub fn from_config(config: &CacheConfig) -> SddResult<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        std::fs::create_dir_all(config.dir.as_std_path())
            .map_err(|source| SddError::IoError { path: Some(config.dir.as_std_path().to_path_buf()), source })?;
        Ok(Some(ResponseCache {
            dir: config.dir.clone(),
            ttl: chrono::Duration::hours(i64::from(config.ttl_hours)),
            max_size_bytes: u64::from(config.max_size_mb) * 1024 * 1024,
        }))
    }

    fn entry_path(&self, key: &str) -> Utf8PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Look up a cached response. Expired or unreadable entries are
    /// treated as a miss and removed.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<ToolResponse> {
        let path = self.entry_path(key);
        let raw = std::fs::read_to_string(path.as_std_path()).ok()?;
        let entry: CacheEntry = serde_json::from_str(&raw).ok()?;
        if Utc::now() - entry.cached_at > self.ttl {
            let _ = std::fs::remove_file(path.as_std_path());
            return None;
        }
        Some(entry.response.cached())
    }

    /// Store a response under `key`, then evict the least-recently-used
    /// entries until the cache directory is back under its size cap.
    pub fn put(&self, key: &str, response: &ToolResponse) -> SddResult<()> {
        self.put_tagged(key, response, None)
    }

    /// Same as [`ResponseCache::put`], additionally stashing `tags` so
    /// `cache-clear` can later select this entry by spec or skill.
    pub fn put_tagged(&self, key: &str, response: &ToolResponse, tags: Option<CacheTags>) -> SddResult<()> {
        let entry = CacheEntry { response: response.clone(), cached_at: Utc::now(), tags };
        let path = self.entry_path(key);
        let json = serde_json::to_string(&entry)
            .map_err(|e| SddError::Internal(format!("failed to serialize cache entry: {e}")))?;
        // Write-temp-then-rename (spec.md §5), same discipline `sdd-store`
        // uses for the spec file itself, so a concurrent `get`/`list` never
        // observes a half-written entry.
        sdd_utils::atomic_write::write_file_atomic(&path, &json)?;
        self.evict_to_fit()
    }

    /// Every live (non-expired) entry's metadata, for `cache-info`.
    pub fn list(&self) -> SddResult<Vec<CacheEntryInfo>> {
        let mut out = Vec::new();
        for (path, _modified, size) in self.entries_by_age()? {
            let Ok(raw) = std::fs::read_to_string(path.as_std_path()) else { continue };
            let Ok(entry) = serde_json::from_str::<CacheEntry>(&raw) else { continue };
            if Utc::now() - entry.cached_at > self.ttl {
                continue;
            }
            let key = path
                .file_stem()
                .map(str::to_string)
                .unwrap_or_default();
            out.push(CacheEntryInfo {
                key,
                tool: entry.response.tool.clone(),
                skill: entry.tags.as_ref().map(|t| t.skill.clone()),
                spec_id: entry.tags.as_ref().and_then(|t| t.spec_id.clone()),
                cached_at: entry.cached_at,
                size_bytes: size,
            });
        }
        Ok(out)
    }

    /// Remove every entry matching `spec_id`/`review_type` (an entry's
    /// tagged skill), or every entry when both are `None`. Returns the
    /// number of files removed.
    pub fn clear(&self, spec_id: Option<&str>, review_type: Option<&str>) -> SddResult<usize> {
        let mut removed = 0;
        let read_dir = std::fs::read_dir(self.dir.as_std_path())
            .map_err(|source| SddError::IoError { path: Some(self.dir.as_std_path().to_path_buf()), source })?;
        for entry in read_dir.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let matches = if spec_id.is_none() && review_type.is_none() {
                true
            } else {
                let Ok(raw) = std::fs::read_to_string(&path) else { continue };
                let Ok(cache_entry) = serde_json::from_str::<CacheEntry>(&raw) else { continue };
                let tag_spec = cache_entry.tags.as_ref().and_then(|t| t.spec_id.as_deref());
                let tag_skill = cache_entry.tags.as_ref().map(|t| t.skill.as_str());
                spec_id.is_none_or(|want| tag_spec == Some(want))
                    && review_type.is_none_or(|want| tag_skill == Some(want))
            };
            if matches && std::fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn evict_to_fit(&self) -> SddResult<()> {
        let mut entries = self.entries_by_age()?;
        let mut total: u64 = entries.iter().map(|(_, _, size)| size).sum();
        while total > self.max_size_bytes {
            let Some((path, _, size)) = entries.first().cloned() else { break };
            let _ = std::fs::remove_file(path.as_std_path());
            total = total.saturating_sub(size);
            entries.remove(0);
        }
        Ok(())
    }

    /// `(path, modified, size)` tuples for every entry, oldest first.
    fn entries_by_age(&self) -> SddResult<Vec<(Utf8PathBuf, SystemTime, u64)>> {
        let mut entries = Vec::new();
        let read_dir = std::fs::read_dir(self.dir.as_std_path())
            .map_err(|source| SddError::IoError { path: Some(self.dir.as_std_path().to_path_buf()), source })?;
        for entry in read_dir.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(metadata) = entry.metadata() else { continue };
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            let Ok(utf8) = Utf8PathBuf::from_path_buf(path) else { continue };
            entries.push((utf8, modified, metadata.len()));
        }
        entries.sort_by_key(|(_, modified, _)| *modified);
        Ok(entries)
    }

    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }
}
