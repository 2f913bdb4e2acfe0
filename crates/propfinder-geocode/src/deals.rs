//! Read-only adapter over the deal-tracking cache file.
//!
//! An external scraping process maintains `deal_tracking.json`:
//!
//! ```json
//! { "current_deals": ["<building>_<full address>_<unit>_<price>_<date>", ...] }
//! ```
//!
//! The underscore-joined strings are a versionless external format — this
//! module parses just the building-name and full-address fields it needs and
//! keeps the raw string for diagnostics. Coordinates derived here are
//! district centroids, not property positions; this is the last-resort
//! signal when geocoders and the database index have both missed.

use std::path::Path;

use serde::Deserialize;

use propfinder_core::{default_district, district_for_address, GeoCoordinate};

use crate::error::DealCacheError;

/// A deal record that matched a query.
#[derive(Debug, Clone, PartialEq)]
pub struct DealMatch {
    /// The full raw record string, for diagnostics.
    pub record: String,
    /// The building-name field of the matched record.
    pub building: String,
    /// District centroid derived from the record's address.
    pub coordinate: GeoCoordinate,
}

#[derive(Debug)]
struct DealRecord {
    raw: String,
    building: String,
    full_address: String,
}

#[derive(Debug, Deserialize)]
struct DealsFile {
    #[serde(default)]
    current_deals: Vec<String>,
}

/// In-memory view of the deal-tracking cache.
pub struct DealCache {
    records: Vec<DealRecord>,
    default_centroid: GeoCoordinate,
}

impl DealCache {
    /// Load the cache from a `deal_tracking.json` file.
    ///
    /// # Errors
    ///
    /// Returns [`DealCacheError::Io`] if the file cannot be read or
    /// [`DealCacheError::Parse`] if it is not the expected JSON shape.
    pub fn load(path: &Path) -> Result<Self, DealCacheError> {
        let content = std::fs::read_to_string(path).map_err(|e| DealCacheError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let file: DealsFile =
            serde_json::from_str(&content).map_err(|e| DealCacheError::Parse {
                path: path.display().to_string(),
                source: e,
            })?;

        Ok(Self::from_deal_strings(file.current_deals))
    }

    /// Build a cache directly from underscore-joined deal strings.
    ///
    /// Records missing the building-name or full-address field are skipped —
    /// the file is externally maintained and occasionally carries partial
    /// lines.
    #[must_use]
    pub fn from_deal_strings(deals: Vec<String>) -> Self {
        let total = deals.len();
        let records: Vec<DealRecord> = deals
            .into_iter()
            .filter_map(|raw| {
                let mut parts = raw.split('_');
                let building = parts.next().unwrap_or_default().to_string();
                let full_address = parts.next().unwrap_or_default().to_string();
                if building.is_empty() || full_address.is_empty() {
                    return None;
                }
                Some(DealRecord {
                    raw,
                    building,
                    full_address,
                })
            })
            .collect();

        if records.len() < total {
            tracing::debug!(
                skipped = total - records.len(),
                kept = records.len(),
                "skipped malformed deal records"
            );
        }

        Self {
            records,
            default_centroid: default_district().centroid,
        }
    }

    /// Override the centroid used when a matched record names no recognized
    /// district.
    #[must_use]
    pub fn with_default_centroid(mut self, centroid: GeoCoordinate) -> Self {
        self.default_centroid = centroid;
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First `n` raw record strings, for not-found diagnostics.
    #[must_use]
    pub fn sample(&self, n: usize) -> Vec<String> {
        self.records.iter().take(n).map(|r| r.raw.clone()).collect()
    }

    /// Find the first record matching `query`.
    ///
    /// Records are checked in stored order — the file carries no semantic
    /// ordering, so this is a heuristic, not a ranked search. A record
    /// matches when any of these holds:
    ///
    /// 1. the query equals the building name;
    /// 2. either of query/building contains the other;
    /// 3. the full address contains the query;
    /// 4. any whitespace token of the query longer than two characters
    ///    appears in the full address.
    ///
    /// The coordinate is the centroid of the first recognized district named
    /// in the record's address, or the default centroid when none is.
    #[must_use]
    pub fn find(&self, query: &str) -> Option<DealMatch> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        for record in &self.records {
            if !Self::matches(query, record) {
                continue;
            }

            let coordinate = district_for_address(&record.full_address)
                .map_or(self.default_centroid, |d| d.centroid);

            tracing::debug!(
                query,
                record = %record.raw,
                lat = coordinate.lat,
                lng = coordinate.lng,
                "deal cache match"
            );

            return Some(DealMatch {
                record: record.raw.clone(),
                building: record.building.clone(),
                coordinate,
            });
        }

        None
    }

    fn matches(query: &str, record: &DealRecord) -> bool {
        if query == record.building
            || query.contains(&record.building)
            || record.building.contains(query)
            || record.full_address.contains(query)
        {
            return true;
        }

        query
            .split_whitespace()
            .any(|token| token.chars().count() > 2 && record.full_address.contains(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> DealCache {
        DealCache::from_deal_strings(vec![
            "國際企業中心1期_荃灣國際企業中心1期_8室_500萬_2024-03-01".to_string(),
            "環宇海灣_荃灣環宇海灣第2座_12樓B_980萬_2024-02-11".to_string(),
            "無極大廈_九龍塘無極大廈_3樓_700萬_2024-01-20".to_string(),
        ])
    }

    #[test]
    fn exact_building_name_matches() {
        let m = cache().find("國際企業中心1期").expect("should match");
        assert_eq!(m.building, "國際企業中心1期");
    }

    #[test]
    fn query_containing_building_matches() {
        let m = cache().find("荃灣環宇海灣附近").expect("should match");
        assert_eq!(m.building, "環宇海灣");
    }

    #[test]
    fn building_containing_query_matches() {
        let m = cache().find("企業中心1期").expect("should match");
        assert_eq!(m.building, "國際企業中心1期");
    }

    #[test]
    fn token_overlap_matches_despite_extra_district_token() {
        // The building field alone gives no containment either way, and the
        // stored address has no spaces, so whole-query containment fails too.
        // "荃灣" is only two characters and cannot carry the match; the long
        // token "國際企業中心1期" appearing in the address is what matches.
        let c = DealCache::from_deal_strings(vec![
            "IEC一期_荃灣德士古道國際企業中心1期_8室_500萬_2024-03-01".to_string(),
        ]);
        let m = c.find("荃灣 國際企業中心1期").expect("should match");
        assert_eq!(m.building, "IEC一期");
    }

    #[test]
    fn short_tokens_do_not_match_on_their_own() {
        // No token longer than two characters, and the whole query is not
        // contained in any building or address field.
        assert!(cache().find("荃灣 XY").is_none());
    }

    #[test]
    fn district_centroid_derived_from_address() {
        let m = cache().find("環宇海灣").expect("should match");
        assert!((m.coordinate.lat - 22.3686).abs() < 1e-9);
        assert!((m.coordinate.lng - 114.1048).abs() < 1e-9);
    }

    #[test]
    fn unrecognized_district_falls_back_to_default_centroid() {
        // 九龍塘 is not in the district table.
        let m = cache().find("無極大廈").expect("should match");
        let d = default_district();
        assert!((m.coordinate.lat - d.centroid.lat).abs() < 1e-9);
        assert!((m.coordinate.lng - d.centroid.lng).abs() < 1e-9);
    }

    #[test]
    fn default_centroid_override_applies() {
        let custom = GeoCoordinate {
            lat: 22.3193,
            lng: 114.1694,
        };
        let m = cache()
            .with_default_centroid(custom)
            .find("無極大廈")
            .expect("should match");
        assert!((m.coordinate.lat - custom.lat).abs() < 1e-9);
    }

    #[test]
    fn first_match_in_stored_order_wins() {
        let c = DealCache::from_deal_strings(vec![
            "海濱花園_荃灣海濱花園_1樓_400萬_2024-01-01".to_string(),
            "海濱花園_中環海濱花園_2樓_900萬_2024-01-02".to_string(),
        ]);
        let m = c.find("海濱花園").expect("should match");
        assert!(m.record.contains("荃灣"), "first stored record should win");
    }

    #[test]
    fn malformed_records_are_skipped() {
        let c = DealCache::from_deal_strings(vec![
            "只有大廈名".to_string(),
            String::new(),
            "環宇海灣_荃灣環宇海灣_1樓_500萬_2024-01-01".to_string(),
        ]);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn no_match_returns_none() {
        assert!(cache().find("某個不存在的地方").is_none());
    }

    #[test]
    fn blank_query_returns_none() {
        assert!(cache().find("   ").is_none());
    }

    #[test]
    fn sample_returns_leading_records() {
        let s = cache().sample(2);
        assert_eq!(s.len(), 2);
        assert!(s[0].starts_with("國際企業中心1期_"));
    }
}
