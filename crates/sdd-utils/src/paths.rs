//! Filesystem discovery helpers shared by C1 and `sdd-config`.

use camino::{Utf8Path, Utf8PathBuf};

/// Walk upward from `start` looking for `relative` (e.g. `.claude/sdd_config.json`
/// or `specs`), returning the first ancestor directory containing it.
#[must_use]
pub fn find_upward(start: &Utf8Path, relative: &str) -> Option<Utf8PathBuf> {
    let mut dir = Some(start.to_path_buf());
    while let Some(d) = dir {
        let candidate = d.join(relative);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = d.parent().map(Utf8Path::to_path_buf);
    }
    None
}

/// The four lifecycle buckets, in the precedence order C1's `locate` uses.
pub const BUCKET_PRECEDENCE: [&str; 4] = ["active", "pending", "completed", "archived"];

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn finds_marker_in_an_ancestor() {
        let root = TempDir::new().unwrap();
        let root_path = Utf8Path::from_path(root.path()).unwrap();
        std::fs::create_dir_all(root_path.join("a/b/c")).unwrap();
        std::fs::write(root_path.join("a").join("marker"), "").unwrap();

        let found = find_upward(&root_path.join("a/b/c"), "marker").unwrap();
        assert_eq!(found, root_path.join("a").join("marker"));
    }

    #[test]
    fn returns_none_when_marker_absent() {
        let root = TempDir::new().unwrap();
        let root_path = Utf8Path::from_path(root.path()).unwrap();
        std::fs::create_dir_all(root_path.join("a/b")).unwrap();
        assert!(find_upward(&root_path.join("a/b"), "nonexistent-marker").is_none());
    }
}
