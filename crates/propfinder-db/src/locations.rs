//! Text-based location lookup over stored property records.
//!
//! The authoritative local fallback behind the external geocoders: when no
//! provider can place a query, the building/estate names already recorded in
//! the database often can. Lookup escalates — exact name equality first,
//! wildcard substring second — and each stage runs only when the previous
//! one found nothing.

use sqlx::PgPool;

use propfinder_core::GeoCoordinate;
use propfinder_geocode::{LocalIndex, LocalIndexError, LocalMatch};

/// A coordinate found by name lookup, with the stored name that matched.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LocationMatchRow {
    pub matched_name: Option<String>,
    pub lat: f64,
    pub lng: f64,
}

const MATCH_COLUMNS: &str = "COALESCE(NULLIF(l.building_name_zh, ''), NULLIF(l.name, ''), \
         NULLIF(b.building_name_zh, ''), NULLIF(h.building_name_zh, ''), \
         NULLIF(h.estate_name_zh, '')) AS matched_name, \
     l.lat::DOUBLE PRECISION AS lat, \
     l.lng::DOUBLE PRECISION AS lng";

/// Find a location whose stored name equals the query (case-insensitive).
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn find_location_exact(
    pool: &PgPool,
    query: &str,
) -> Result<Option<LocationMatchRow>, sqlx::Error> {
    let sql = format!(
        "SELECT DISTINCT {MATCH_COLUMNS} \
         FROM location_info l \
         LEFT JOIN business b ON b.location_id = l.id \
         LEFT JOIN house h ON h.location_id = l.id \
         WHERE LOWER(l.building_name_zh) = LOWER($1) \
            OR LOWER(l.name) = LOWER($1) \
            OR LOWER(b.building_name_zh) = LOWER($1) \
            OR LOWER(h.building_name_zh) = LOWER($1) \
            OR LOWER(h.estate_name_zh) = LOWER($1) \
         LIMIT 1"
    );

    sqlx::query_as::<_, LocationMatchRow>(&sql)
        .bind(query)
        .fetch_optional(pool)
        .await
}

/// Find a location whose stored name contains the query as a substring.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn find_location_wildcard(
    pool: &PgPool,
    query: &str,
) -> Result<Option<LocationMatchRow>, sqlx::Error> {
    let sql = format!(
        "SELECT DISTINCT {MATCH_COLUMNS} \
         FROM location_info l \
         LEFT JOIN business b ON b.location_id = l.id \
         LEFT JOIN house h ON h.location_id = l.id \
         WHERE l.building_name_zh ILIKE $1 \
            OR l.name ILIKE $1 \
            OR b.building_name_zh ILIKE $1 \
            OR h.building_name_zh ILIKE $1 \
            OR h.estate_name_zh ILIKE $1 \
         LIMIT 1"
    );

    sqlx::query_as::<_, LocationMatchRow>(&sql)
        .bind(like_pattern(query))
        .fetch_optional(pool)
        .await
}

/// Escalating lookup: exact name equality, then wildcard substring.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if either query fails.
pub async fn find_location_by_text(
    pool: &PgPool,
    query: &str,
) -> Result<Option<LocationMatchRow>, sqlx::Error> {
    if let Some(row) = find_location_exact(pool, query).await? {
        tracing::debug!(query, matched = ?row.matched_name, "exact location match");
        return Ok(Some(row));
    }

    if let Some(row) = find_location_wildcard(pool, query).await? {
        tracing::debug!(query, matched = ?row.matched_name, "wildcard location match");
        return Ok(Some(row));
    }

    Ok(None)
}

/// Wrap `query` for a substring `ILIKE`, escaping pattern metacharacters so
/// user text cannot change the match semantics.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// The database-backed location index handed to the resolver.
#[derive(Clone)]
pub struct PgLocationIndex {
    pool: PgPool,
}

impl PgLocationIndex {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl LocalIndex for PgLocationIndex {
    async fn find_by_text(&self, query: &str) -> Result<Option<LocalMatch>, LocalIndexError> {
        let row = find_location_by_text(&self.pool, query)
            .await
            .map_err(|e| LocalIndexError::Unavailable(e.to_string()))?;

        Ok(row.map(|r| LocalMatch {
            coordinate: GeoCoordinate {
                lat: r.lat,
                lng: r.lng,
            },
            matched: r.matched_name,
        }))
    }
}
