//! Directory-scanning support for `list-specs`/`find-specs` (spec.md
//! §6.1). `sdd-store`'s `SpecStore` only knows how to locate one spec
//! by id; enumerating every spec across all four buckets is an ambient
//! CLI-layer concern, not a C1 responsibility.

use std::collections::BTreeSet;

use camino::Utf8Path;
use sdd_model::{Document, SpecStatus};
use sdd_utils::paths::BUCKET_PRECEDENCE;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecSummary {
    pub spec_id: String,
    pub title: Option<String>,
    pub status: SpecStatus,
    pub percent: u8,
}

fn bucket_to_status(bucket: &str) -> Option<SpecStatus> {
    match bucket {
        "pending" => Some(SpecStatus::Pending),
        "active" => Some(SpecStatus::Active),
        "completed" => Some(SpecStatus::Completed),
        "archived" => Some(SpecStatus::Archived),
        _ => None,
    }
}

/// Every spec document found under `specs_root`'s four lifecycle
/// buckets, in bucket-precedence then spec-id order. Unreadable or
/// malformed files are skipped with a logged warning rather than
/// failing the whole listing.
#[must_use]
pub fn list_all(specs_root: &Utf8Path) -> Vec<SpecSummary> {
    let mut out = Vec::new();
    for bucket in BUCKET_PRECEDENCE {
        let dir = specs_root.join(bucket);
        let Ok(entries) = std::fs::read_dir(dir.as_std_path()) else { continue };
        let mut names: Vec<_> = entries.flatten().collect();
        names.sort_by_key(std::fs::DirEntry::file_name);
        for entry in names {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(raw) = std::fs::read_to_string(&path) else { continue };
            match serde_json::from_str::<Document>(&raw) {
                Ok(doc) => out.push(SpecSummary {
                    spec_id: doc.spec_id,
                    title: doc.metadata.title,
                    status: bucket_to_status(bucket).unwrap_or(doc.metadata.status),
                    percent: doc.counts.percent,
                }),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping malformed spec file"),
            }
        }
    }
    out
}

/// Spec ids already in use across every bucket, for disambiguating a
/// freshly generated id.
#[must_use]
pub fn existing_ids(specs_root: &Utf8Path) -> BTreeSet<String> {
    list_all(specs_root).into_iter().map(|s| s.spec_id).collect()
}

/// Specs whose id or title contains `query` (case-insensitive).
#[must_use]
pub fn find(specs_root: &Utf8Path, query: &str) -> Vec<SpecSummary> {
    let needle = query.to_lowercase();
    list_all(specs_root)
        .into_iter()
        .filter(|s| {
            s.spec_id.to_lowercase().contains(&needle)
                || s.title.as_deref().is_some_and(|t| t.to_lowercase().contains(&needle))
        })
        .collect()
}
