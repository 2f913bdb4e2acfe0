//! District keyword → centroid lookup.
//!
//! A small fixed table mapping recognized Hong Kong district names (Chinese
//! and English) to approximate WGS84 centroids. Used by the deal-cache
//! fallback when no better coordinate signal exists — it locates the
//! district, not the property.

use crate::GeoCoordinate;

/// One recognized district and its approximate centroid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct District {
    pub name_zh: &'static str,
    pub name_en: &'static str,
    pub centroid: GeoCoordinate,
}

/// Recognized districts, scanned in declaration order.
pub const DISTRICTS: &[District] = &[
    District {
        name_zh: "荃灣",
        name_en: "Tsuen Wan",
        centroid: GeoCoordinate {
            lat: 22.3686,
            lng: 114.1048,
        },
    },
    District {
        name_zh: "中環",
        name_en: "Central",
        centroid: GeoCoordinate {
            lat: 22.2819,
            lng: 114.1588,
        },
    },
    District {
        name_zh: "尖沙咀",
        name_en: "Tsim Sha Tsui",
        centroid: GeoCoordinate {
            lat: 22.2969,
            lng: 114.1722,
        },
    },
    District {
        name_zh: "上環",
        name_en: "Sheung Wan",
        centroid: GeoCoordinate {
            lat: 22.2867,
            lng: 114.1491,
        },
    },
    District {
        name_zh: "元朗",
        name_en: "Yuen Long",
        centroid: GeoCoordinate {
            lat: 22.4414,
            lng: 114.0222,
        },
    },
];

/// The district assumed when an address names no recognized district.
#[must_use]
pub fn default_district() -> &'static District {
    &DISTRICTS[0]
}

/// Scan `address` for the first recognized district keyword (Chinese or
/// English name) and return its table entry.
#[must_use]
pub fn district_for_address(address: &str) -> Option<&'static District> {
    DISTRICTS
        .iter()
        .find(|d| address.contains(d.name_zh) || address.contains(d.name_en))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_district_by_chinese_name() {
        let d = district_for_address("荃灣榮豐工業大厦").expect("should match");
        assert_eq!(d.name_en, "Tsuen Wan");
    }

    #[test]
    fn finds_district_by_english_name() {
        let d = district_for_address("8 Queen's Road, Central").expect("should match");
        assert_eq!(d.name_zh, "中環");
    }

    #[test]
    fn scan_order_prefers_earlier_table_entries() {
        // An address naming two districts resolves to the one declared first.
        let d = district_for_address("荃灣至中環巴士總站").expect("should match");
        assert_eq!(d.name_en, "Tsuen Wan");
    }

    #[test]
    fn unknown_address_yields_none() {
        assert!(district_for_address("九龍塘某處").is_none());
    }

    #[test]
    fn default_district_is_tsuen_wan() {
        let d = default_district();
        assert_eq!(d.name_en, "Tsuen Wan");
        assert!((d.centroid.lat - 22.3686).abs() < 1e-9);
        assert!((d.centroid.lng - 114.1048).abs() < 1e-9);
    }
}
