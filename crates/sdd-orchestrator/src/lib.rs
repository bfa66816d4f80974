//! C8 parallel fan-out/fallback/cache (spec.md §4.8): turns `sdd-llm`'s
//! single-provider subprocess primitive into the three execution modes
//! a consultation skill needs, with an on-disk response cache and
//! progress events layered on top.
//!
//! Grounded on `xchecker-llm`'s `from_config_with_fallback` for the
//! fallback-on-failure shape and `xchecker-utils/src/cache.rs`'s
//! memory-plus-disk `InsightCache` for the cache layering (here
//! disk-only, keyed per spec.md §4.8 instead of by file content hash).

mod cache;
mod events;
mod modes;
mod request;

pub use cache::{cache_key, CacheEntryInfo, CacheKeyInput, CacheTags, ResponseCache};
pub use events::{noop_sink, ProgressEvent, ProgressSink};
pub use modes::{ConsultRequest, MultiToolResponse, Orchestrator};
