//! Cache commands: `cache-info`, `cache-clear` (spec.md §6.1, §4.8).

use sdd_orchestrator::{CacheEntryInfo, ResponseCache};
use sdd_utils::{SddError, SddResult};
use serde::Serialize;

use crate::cli::context::Context;
use crate::cli::output;

fn open_cache(ctx: &Context) -> SddResult<ResponseCache> {
    ResponseCache::from_config(&ctx.config.cache)?
        .ok_or_else(|| SddError::UserError("consultation cache is disabled in config".to_string()))
}

#[derive(Debug, Serialize)]
struct CacheInfoResult {
    dir: String,
    entry_count: usize,
    total_size_bytes: u64,
    entries: Vec<CacheEntryInfo>,
}

pub fn cache_info(ctx: &Context) -> SddResult<()> {
    let cache = open_cache(ctx)?;
    let entries = cache.list()?;
    let total_size_bytes = entries.iter().map(|e| e.size_bytes).sum();
    let result = CacheInfoResult {
        dir: cache.dir().to_string(),
        entry_count: entries.len(),
        total_size_bytes,
        entries,
    };
    output::emit(ctx.json, ctx.quiet, &result, || {
        format!(
            "{} — {} entr{} ({} bytes)",
            result.dir,
            result.entry_count,
            if result.entry_count == 1 { "y" } else { "ies" },
            result.total_size_bytes,
        )
    });
    Ok(())
}

#[derive(Debug, Serialize)]
struct CacheClearResult {
    removed: usize,
}

pub fn cache_clear(ctx: &Context, spec_id: Option<String>, review_type: Option<String>) -> SddResult<()> {
    let cache = open_cache(ctx)?;
    let removed = cache.clear(spec_id.as_deref(), review_type.as_deref())?;
    let result = CacheClearResult { removed };
    output::emit(ctx.json, ctx.quiet, &result, || format!("removed {removed} cache entr{}", if removed == 1 { "y" } else { "ies" }));
    Ok(())
}
