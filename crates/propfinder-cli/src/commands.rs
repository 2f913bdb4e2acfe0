//! Command handlers for the CLI.
//!
//! These are called from `main` after config is loaded. Each handler
//! connects its own pool; a missing deal-tracking file degrades to a warning
//! rather than aborting, matching how the search pipeline treats that file
//! as best-effort data.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;

use propfinder_core::{AppConfig, GeoCoordinate};
use propfinder_db::{PgLocationIndex, SearchFilter};
use propfinder_geocode::{
    DealCache, GeocodeCache, GoogleMapsClient, NominatimClient, ResolveError, Resolver,
};

pub(crate) struct SearchArgs {
    pub query: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: u32,
    pub deal_type: Option<String>,
    pub days: Option<u32>,
    pub json: bool,
}

type CliResolver = Resolver<NominatimClient, GoogleMapsClient, PgLocationIndex>;

/// Assemble the full resolver from config: Nominatim always, Google Maps
/// only when a key is configured, the database index, the deal cache when
/// its file loads, and the TTL result cache.
fn build_resolver(config: &AppConfig, pool: &PgPool) -> anyhow::Result<CliResolver> {
    let primary = NominatimClient::new(config.geocode_timeout_secs, &config.geocode_user_agent)?;

    let secondary = match config.geocoding_api_key.as_deref() {
        Some(key) => Some(GoogleMapsClient::new(key, config.geocode_timeout_secs)?),
        None => {
            tracing::info!("GEOCODING_API_KEY not set; secondary geocoder disabled");
            None
        }
    };

    let deal_cache = match DealCache::load(&config.deals_path) {
        Ok(cache) => {
            tracing::debug!(
                path = %config.deals_path.display(),
                records = cache.len(),
                "loaded deal-tracking cache"
            );
            Some(cache)
        }
        Err(err) => {
            tracing::warn!(error = %err, "deal-tracking cache unavailable; continuing without");
            None
        }
    };

    let cache = GeocodeCache::new(
        Duration::from_secs(config.geocode_cache_ttl_secs),
        config.geocode_cache_max_entries,
    );

    Ok(Resolver::new(
        primary,
        secondary,
        Some(PgLocationIndex::new(pool.clone())),
        deal_cache,
        Some(cache),
    ))
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool = propfinder_db::connect_pool(
        &config.database_url,
        propfinder_db::PoolConfig {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        },
    )
    .await?;
    Ok(pool)
}

/// Resolve a free-text query and print the coordinate.
pub(crate) async fn run_resolve(
    config: &AppConfig,
    query: &str,
    json: bool,
) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    let resolver = build_resolver(config, &pool)?;

    match resolver.resolve(query).await {
        Ok(resolution) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&resolution)?);
            } else {
                println!(
                    "{:.6}, {:.6}  source={}",
                    resolution.coordinate.lat, resolution.coordinate.lng, resolution.source
                );
                if let Some(record) = &resolution.matched_record {
                    println!("matched: {record}");
                }
            }
            Ok(())
        }
        Err(ResolveError::NotFound { query, sample }) => {
            if !sample.is_empty() {
                eprintln!("known deals include:");
                for record in &sample {
                    eprintln!("  {record}");
                }
            }
            anyhow::bail!("could not find location \"{query}\"")
        }
        Err(err) => Err(err.into()),
    }
}

/// Resolve (or accept) a search centre and print nearby deals.
pub(crate) async fn run_search(config: &AppConfig, args: SearchArgs) -> anyhow::Result<()> {
    let pool = connect(config).await?;

    let center = match (&args.query, args.lat, args.lng) {
        (Some(query), _, _) => {
            let resolver = build_resolver(config, &pool)?;
            let resolution = resolver.resolve(query).await?;
            tracing::debug!(
                lat = resolution.coordinate.lat,
                lng = resolution.coordinate.lng,
                source = %resolution.source,
                "resolved search centre"
            );
            resolution.coordinate
        }
        (None, Some(lat), Some(lng)) => GeoCoordinate { lat, lng },
        _ => anyhow::bail!("provide a location query or both --lat and --lng"),
    };

    let filter = SearchFilter {
        deal_type: args.deal_type,
        since: args.days.map(since_date),
    };

    let rows = propfinder_db::search_deals_near(&pool, center, args.radius, &filter).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("{} deals within {}m", rows.len(), args.radius);
        for row in &rows {
            let name = row
                .building_name_zh
                .as_deref()
                .or(row.estate_name_zh.as_deref())
                .unwrap_or("(unnamed)");
            let price = row
                .deal_price
                .map_or_else(|| "-".to_string(), |p| format!("{p:.0}"));
            let date = row
                .deal_date
                .map_or_else(|| "-".to_string(), |d| d.to_string());
            println!(
                "{:>8.0}m  {}  {}  {}  {}",
                row.distance_m, row.deal_type, name, price, date
            );
        }
    }

    Ok(())
}

/// Ping the database and report.
pub(crate) async fn run_health(config: &AppConfig) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    propfinder_db::health_check(&pool).await?;
    println!("database ok");
    Ok(())
}

/// The cutoff date `days` days before today (UTC).
fn since_date(days: u32) -> chrono::NaiveDate {
    Utc::now().date_naive() - chrono::Duration::days(i64::from(days))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_date_goes_backwards() {
        let today = Utc::now().date_naive();
        let cutoff = since_date(30);
        assert_eq!((today - cutoff).num_days(), 30);
    }

    #[test]
    fn since_date_zero_is_today() {
        assert_eq!(since_date(0), Utc::now().date_naive());
    }
}
