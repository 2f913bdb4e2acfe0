//! Address-noise normalization for estate-style queries.
//!
//! Users paste listing lines like `"荃灣 國際企業中心1期 中層 8室"` — the
//! floor/unit tail is noise to a geocoder. Stripping it is best-effort
//! simplification only: callers always keep the original query as a variant,
//! and an empty normalization result never gates resolution.

use std::sync::LazyLock;

use regex::Regex;

static NOISE: LazyLock<Regex> = LazyLock::new(|| {
    // building numbers, block numbers, floor numbers with an optional unit
    // letter, room numbers, floor-level descriptors
    Regex::new(r"\d+號|第?\d+座|\d+樓[A-Za-z]*|\d+室|中層|高層|低層").expect("valid regex")
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strip floor/unit/block-level noise from a raw location query.
///
/// Deterministic and pure. May return an empty string when the query was
/// nothing but noise.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let stripped = NOISE.replace_all(raw, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}
