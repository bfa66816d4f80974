//! Spec id generation for `create` (spec.md §6.1): a stable, filesystem-
//! and URL-safe slug derived from the title, disambiguated against
//! whatever already exists across the four lifecycle buckets.

use std::collections::BTreeSet;

use chrono::Utc;

/// Lowercase kebab-case slug: non-alphanumeric runs become a single
/// `-`, leading/trailing dashes are trimmed.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_was_dash = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && !out.is_empty() {
            out.push('-');
            last_was_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        "spec".to_string()
    } else {
        out
    }
}

/// Generate a unique spec id from `title`: `<slug>-<YYYYMMDD>`, with a
/// numeric suffix appended if that id is already taken.
#[must_use]
pub fn generate(title: &str, existing: &BTreeSet<String>) -> String {
    let slug = slugify(title);
    let date = Utc::now().format("%Y%m%d");
    let base = format!("{slug}-{date}");
    if !existing.contains(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !existing.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugifies_punctuation_and_whitespace() {
        assert_eq!(slugify("Add OAuth2 Support!"), "add-oauth2-support");
        assert_eq!(slugify("  leading/trailing  "), "leading-trailing");
    }

    #[test]
    fn empty_title_falls_back_to_a_placeholder_slug() {
        assert_eq!(slugify("!!!"), "spec");
    }

    #[test]
    fn generate_disambiguates_against_existing_ids() {
        let today = Utc::now().format("%Y%m%d");
        let base = format!("demo-{today}");
        let mut existing = BTreeSet::new();
        existing.insert(base.clone());
        let id = generate("Demo", &existing);
        assert_eq!(id, format!("{base}-2"));
    }
}
