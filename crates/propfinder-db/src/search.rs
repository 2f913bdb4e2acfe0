//! Radius search over recorded property deals.
//!
//! Consumes a resolved coordinate and returns business and house deals
//! within the radius, nearest first. The two deal tables share most columns;
//! a `UNION ALL` with NULL padding presents them as one result shape.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;

use propfinder_core::GeoCoordinate;

const RESULT_LIMIT: u32 = 50;

/// Optional filters for a radius search.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Restrict to one deal subtype (the stored `type` column).
    pub deal_type: Option<String>,
    /// Only deals on or after this date.
    pub since: Option<NaiveDate>,
}

/// One deal row from the radius search.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DealRow {
    /// `"business"` or `"house"` — which table the row came from.
    pub deal_type: String,
    pub id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub building_name_zh: Option<String>,
    pub estate_name_zh: Option<String>,
    pub flat: Option<String>,
    pub floor: Option<String>,
    pub unit: Option<String>,
    pub area: Option<String>,
    pub deal_price: Option<f64>,
    pub deal_date: Option<NaiveDate>,
    pub developer: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub town: Option<String>,
    pub street: Option<String>,
    pub road: Option<String>,
    /// Metres from the search centre.
    pub distance_m: f64,
}

/// Find deals within `radius_m` metres of `center`, nearest first.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn search_deals_near(
    pool: &PgPool,
    center: GeoCoordinate,
    radius_m: u32,
    filter: &SearchFilter,
) -> Result<Vec<DealRow>, sqlx::Error> {
    let sql = build_search_sql(filter.deal_type.is_some(), filter.since.is_some());

    let mut query = sqlx::query_as::<_, DealRow>(&sql)
        .bind(center.lng)
        .bind(center.lat)
        .bind(f64::from(radius_m));
    if let Some(deal_type) = &filter.deal_type {
        query = query.bind(deal_type);
    }
    if let Some(since) = filter.since {
        query = query.bind(since);
    }

    query.fetch_all(pool).await
}

/// Build the `UNION ALL` radius SQL. `$1` = lng, `$2` = lat, `$3` = radius
/// in metres; `$4`/`$5` are appended for the type and date filters when
/// present.
fn build_search_sql(has_type: bool, has_since: bool) -> String {
    let business_filters = filter_clause("b", has_type, has_since);
    let house_filters = filter_clause("h", has_type, has_since);

    format!(
        "SELECT 'business' AS deal_type, \
                b.id::BIGINT AS id, b.type, b.building_name_zh, \
                NULL AS estate_name_zh, NULL AS flat, \
                b.floor, b.unit, b.area::TEXT AS area, \
                b.deal_price::DOUBLE PRECISION AS deal_price, b.deal_date, b.developer, \
                l.province, l.city, l.country, l.town, l.street, l.road, \
                ST_Distance(l.geom::geography, \
                            ST_SetSRID(ST_Point($1, $2), 4326)::geography) AS distance_m \
         FROM business b \
         JOIN location_info l ON b.location_id = l.id \
         WHERE ST_DWithin(l.geom::geography, \
                          ST_SetSRID(ST_Point($1, $2), 4326)::geography, $3)\
         {business_filters} \
         UNION ALL \
         SELECT 'house' AS deal_type, \
                h.id::BIGINT AS id, h.type, h.building_name_zh, \
                h.estate_name_zh, h.flat, \
                h.floor, h.unit, h.area::TEXT AS area, \
                h.deal_price::DOUBLE PRECISION AS deal_price, h.deal_date, h.developer, \
                l.province, l.city, l.country, l.town, l.street, l.road, \
                ST_Distance(l.geom::geography, \
                            ST_SetSRID(ST_Point($1, $2), 4326)::geography) AS distance_m \
         FROM house h \
         JOIN location_info l ON h.location_id = l.id \
         WHERE ST_DWithin(l.geom::geography, \
                          ST_SetSRID(ST_Point($1, $2), 4326)::geography, $3)\
         {house_filters} \
         ORDER BY distance_m \
         LIMIT {RESULT_LIMIT}"
    )
}

fn filter_clause(alias: &str, has_type: bool, has_since: bool) -> String {
    let mut clause = String::new();
    let mut idx = 4;
    if has_type {
        clause.push_str(&format!(" AND {alias}.type = ${idx}"));
        idx += 1;
    }
    if has_since {
        clause.push_str(&format!(" AND {alias}.deal_date >= ${idx}"));
    }
    clause
}
