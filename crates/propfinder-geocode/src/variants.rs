//! Query-variant construction.
//!
//! Geocoders are tried against an ordered list of rewrites of the user's
//! input rather than retried verbatim — different text, not mere repetition,
//! is what rescues a failed attempt.

use propfinder_core::DISTRICTS;

const REGION_SUFFIX: &str = ", Hong Kong";

/// Build the ordered, deduplicated variant list for one query.
///
/// Order: raw query, normalized query, normalized + region suffix,
/// raw + region suffix, then district-transliteration rewrites (each known
/// Chinese district name present in the raw query replaced by its English
/// name). Blank entries are dropped; the first occurrence of a duplicate
/// wins.
#[must_use]
pub fn build_variants(raw: &str, normalized: &str) -> Vec<String> {
    let mut variants: Vec<String> = Vec::new();

    push_unique(&mut variants, raw.to_string());
    push_unique(&mut variants, normalized.to_string());
    push_unique(&mut variants, format!("{normalized}{REGION_SUFFIX}"));
    push_unique(&mut variants, format!("{raw}{REGION_SUFFIX}"));

    for district in DISTRICTS {
        if raw.contains(district.name_zh) {
            push_unique(&mut variants, raw.replace(district.name_zh, district.name_en));
        }
    }

    variants
}

fn push_unique(variants: &mut Vec<String>, candidate: String) {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return;
    }
    if !variants.iter().any(|v| v == trimmed) {
        variants.push(trimmed.to_string());
    }
}
