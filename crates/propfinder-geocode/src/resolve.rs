//! The resolution orchestrator.
//!
//! Sequences the pipeline stages against one query: normalize, primary
//! geocoder over all variants, secondary geocoder over all variants,
//! database index, deal-tracking cache. Stage failures fall through; only
//! full exhaustion or an unavailable database index surface to the caller.

use serde::Serialize;

use propfinder_core::GeoCoordinate;

use crate::cache::GeocodeCache;
use crate::deals::DealCache;
use crate::error::{LocalIndexError, ResolveError};
use crate::geocoder::Geocoder;
use crate::local::LocalIndex;
use crate::normalize::normalize;
use crate::variants::build_variants;

/// How many deal records to attach to a not-found error.
const NOT_FOUND_SAMPLE_SIZE: usize = 5;

/// Which pipeline stage produced a resolution.
///
/// Diagnostic only — callers must not branch search behavior on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    PrimaryGeocoder,
    SecondaryGeocoder,
    DatabaseFallback,
    DealCache,
}

impl std::fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionSource::PrimaryGeocoder => write!(f, "primary_geocoder"),
            ResolutionSource::SecondaryGeocoder => write!(f, "secondary_geocoder"),
            ResolutionSource::DatabaseFallback => write!(f, "database_fallback"),
            ResolutionSource::DealCache => write!(f, "deal_cache"),
        }
    }
}

/// A resolved location.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub coordinate: GeoCoordinate,
    pub source: ResolutionSource,
    /// The local record or stored name that matched, when a fallback
    /// produced the coordinate. Diagnostic only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_record: Option<String>,
}

/// Resolves free-text location queries to coordinates.
///
/// Immutable after construction and safe to share across concurrent
/// requests. Every collaborator is injected: geocoder clients, the
/// database-backed index, the deal cache, and the optional result cache.
pub struct Resolver<P, S, L> {
    primary: P,
    secondary: Option<S>,
    local_index: Option<L>,
    deal_cache: Option<DealCache>,
    cache: Option<GeocodeCache>,
}

impl<P, S, L> Resolver<P, S, L>
where
    P: Geocoder + Sync,
    S: Geocoder + Sync,
    L: LocalIndex + Sync,
{
    #[must_use]
    pub fn new(
        primary: P,
        secondary: Option<S>,
        local_index: Option<L>,
        deal_cache: Option<DealCache>,
        cache: Option<GeocodeCache>,
    ) -> Self {
        Self {
            primary,
            secondary,
            local_index,
            deal_cache,
            cache,
        }
    }

    /// Resolve `query` to a coordinate.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::EmptyQuery`] if the query is blank; no I/O happens.
    /// - [`ResolveError::Unavailable`] if the database index could not run.
    /// - [`ResolveError::NotFound`] once every stage is exhausted.
    pub async fn resolve(&self, query: &str) -> Result<Resolution, ResolveError> {
        let raw = query.trim();
        if raw.is_empty() {
            return Err(ResolveError::EmptyQuery);
        }

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(raw) {
                tracing::debug!(query = raw, "geocode cache hit");
                return Ok(hit);
            }
        }

        let normalized = normalize(raw);
        let variants = build_variants(raw, &normalized);

        if let Some(coordinate) = try_variants(&self.primary, &variants).await {
            return Ok(self.cache_and_return(raw, coordinate, ResolutionSource::PrimaryGeocoder));
        }

        if let Some(secondary) = &self.secondary {
            if let Some(coordinate) = try_variants(secondary, &variants).await {
                return Ok(self.cache_and_return(
                    raw,
                    coordinate,
                    ResolutionSource::SecondaryGeocoder,
                ));
            }
        } else {
            tracing::debug!(query = raw, "secondary geocoder not configured; skipping");
        }

        // Local fallbacks: raw query first, then the normalized form when it
        // differs. Database index before deal cache at each step — the
        // database is authoritative over the static file.
        for local_query in local_queries(raw, &normalized) {
            if let Some(resolution) = self.try_local(local_query).await? {
                return Ok(resolution);
            }
        }

        tracing::debug!(query = raw, "all resolution stages exhausted");
        Err(ResolveError::NotFound {
            query: raw.to_string(),
            sample: self
                .deal_cache
                .as_ref()
                .map(|d| d.sample(NOT_FOUND_SAMPLE_SIZE))
                .unwrap_or_default(),
        })
    }

    async fn try_local(&self, query: &str) -> Result<Option<Resolution>, ResolveError> {
        if let Some(index) = &self.local_index {
            match index.find_by_text(query).await {
                Ok(Some(found)) => {
                    tracing::debug!(query, matched = ?found.matched, "database index match");
                    return Ok(Some(Resolution {
                        coordinate: found.coordinate,
                        source: ResolutionSource::DatabaseFallback,
                        matched_record: found.matched,
                    }));
                }
                Ok(None) => {}
                Err(LocalIndexError::Unavailable(reason)) => {
                    return Err(ResolveError::Unavailable(reason));
                }
            }
        }

        if let Some(deals) = &self.deal_cache {
            if let Some(found) = deals.find(query) {
                return Ok(Some(Resolution {
                    coordinate: found.coordinate,
                    source: ResolutionSource::DealCache,
                    matched_record: Some(found.record),
                }));
            }
        }

        Ok(None)
    }

    fn cache_and_return(
        &self,
        raw: &str,
        coordinate: GeoCoordinate,
        source: ResolutionSource,
    ) -> Resolution {
        let resolution = Resolution {
            coordinate,
            source,
            matched_record: None,
        };
        // Only geocoder results are cached — they cost rate-limited network
        // calls. Local fallbacks are cheap recomputations.
        if let Some(cache) = &self.cache {
            cache.insert(raw, &resolution);
        }
        resolution
    }
}

/// The query forms the local fallback stage runs over, in order.
fn local_queries<'a>(raw: &'a str, normalized: &'a str) -> Vec<&'a str> {
    let mut queries = vec![raw];
    if !normalized.is_empty() && normalized != raw {
        queries.push(normalized);
    }
    queries
}

/// Try every variant against one provider, stopping at the first match.
///
/// A provider error on one variant is logged and treated as a miss for that
/// variant only — the loop keeps going. Different query text, not blind
/// repetition, is the retry policy here.
async fn try_variants<G: Geocoder>(provider: &G, variants: &[String]) -> Option<GeoCoordinate> {
    for variant in variants {
        match provider.geocode(variant).await {
            Ok(Some(coordinate)) => {
                tracing::debug!(
                    provider = provider.name(),
                    variant = variant.as_str(),
                    lat = coordinate.lat,
                    lng = coordinate.lng,
                    "geocoder match"
                );
                return Some(coordinate);
            }
            Ok(None) => {
                tracing::debug!(
                    provider = provider.name(),
                    variant = variant.as_str(),
                    "no geocoder match"
                );
            }
            Err(err) => {
                tracing::warn!(
                    provider = provider.name(),
                    variant = variant.as_str(),
                    error = %err,
                    "geocoder attempt failed; continuing"
                );
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::error::ProviderError;
    use crate::local::LocalMatch;

    const TSUEN_WAN: GeoCoordinate = GeoCoordinate {
        lat: 22.3686,
        lng: 114.1048,
    };

    /// Geocoder stub: answers `Some` on the configured variant index,
    /// `None` otherwise, counting every call.
    struct StubGeocoder {
        name: &'static str,
        answer_on_call: Option<usize>,
        calls: Arc<AtomicUsize>,
    }

    impl StubGeocoder {
        fn never(name: &'static str, calls: Arc<AtomicUsize>) -> Self {
            Self {
                name,
                answer_on_call: None,
                calls,
            }
        }

        fn on_call(name: &'static str, n: usize, calls: Arc<AtomicUsize>) -> Self {
            Self {
                name,
                answer_on_call: Some(n),
                calls,
            }
        }
    }

    impl Geocoder for StubGeocoder {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn geocode(&self, _query: &str) -> Result<Option<GeoCoordinate>, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.answer_on_call == Some(call) {
                Ok(Some(TSUEN_WAN))
            } else {
                Ok(None)
            }
        }
    }

    /// Geocoder stub that always errors, to prove errors demote to misses.
    struct FailingGeocoder;

    impl Geocoder for FailingGeocoder {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn geocode(&self, _query: &str) -> Result<Option<GeoCoordinate>, ProviderError> {
            Err(ProviderError::Api("boom".to_string()))
        }
    }

    enum StubIndexBehavior {
        Miss,
        MatchOn(String),
        Unavailable,
    }

    struct StubIndex {
        behavior: StubIndexBehavior,
        calls: Arc<AtomicUsize>,
    }

    impl LocalIndex for StubIndex {
        async fn find_by_text(&self, query: &str) -> Result<Option<LocalMatch>, LocalIndexError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                StubIndexBehavior::Miss => Ok(None),
                StubIndexBehavior::MatchOn(expected) => {
                    if query == expected {
                        Ok(Some(LocalMatch {
                            coordinate: TSUEN_WAN,
                            matched: Some("海濱花園".to_string()),
                        }))
                    } else {
                        Ok(None)
                    }
                }
                StubIndexBehavior::Unavailable => Err(LocalIndexError::Unavailable(
                    "pool timed out".to_string(),
                )),
            }
        }
    }

    fn counters() -> (Arc<AtomicUsize>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        (
            Arc::new(AtomicUsize::new(0)),
            Arc::new(AtomicUsize::new(0)),
            Arc::new(AtomicUsize::new(0)),
        )
    }

    fn deal_cache() -> DealCache {
        DealCache::from_deal_strings(vec![
            "國際企業中心1期_荃灣國際企業中心1期_8室_500萬_2024-03-01".to_string(),
        ])
    }

    #[tokio::test]
    async fn empty_query_fails_without_any_calls() {
        let (p, s, l) = counters();
        let resolver = Resolver::new(
            StubGeocoder::never("primary", Arc::clone(&p)),
            Some(StubGeocoder::never("secondary", Arc::clone(&s))),
            Some(StubIndex {
                behavior: StubIndexBehavior::Miss,
                calls: Arc::clone(&l),
            }),
            Some(deal_cache()),
            None,
        );

        let err = resolver.resolve("   ").await.unwrap_err();
        assert!(matches!(err, ResolveError::EmptyQuery));
        assert_eq!(p.load(Ordering::SeqCst), 0);
        assert_eq!(s.load(Ordering::SeqCst), 0);
        assert_eq!(l.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn third_variant_success_never_touches_secondary() {
        let (p, s, _) = counters();
        let resolver: Resolver<_, _, StubIndex> = Resolver::new(
            StubGeocoder::on_call("primary", 2, Arc::clone(&p)),
            Some(StubGeocoder::never("secondary", Arc::clone(&s))),
            None,
            None,
            None,
        );

        let resolution = resolver
            .resolve("荃灣 海濱花園 12樓B")
            .await
            .expect("third variant should match");
        assert_eq!(resolution.source, ResolutionSource::PrimaryGeocoder);
        assert_eq!(p.load(Ordering::SeqCst), 3, "stopped at the third variant");
        assert_eq!(s.load(Ordering::SeqCst), 0, "secondary must not be called");
    }

    #[tokio::test]
    async fn secondary_runs_after_primary_exhausts() {
        let (p, s, _) = counters();
        let resolver: Resolver<_, _, StubIndex> = Resolver::new(
            StubGeocoder::never("primary", Arc::clone(&p)),
            Some(StubGeocoder::on_call("secondary", 0, Arc::clone(&s))),
            None,
            None,
            None,
        );

        let resolution = resolver.resolve("海濱花園").await.expect("should match");
        assert_eq!(resolution.source, ResolutionSource::SecondaryGeocoder);
        assert!(p.load(Ordering::SeqCst) > 0);
        assert_eq!(s.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exact_deal_match_resolves_when_both_geocoders_miss() {
        let (p, s, _) = counters();
        let resolver: Resolver<_, _, StubIndex> = Resolver::new(
            StubGeocoder::never("primary", Arc::clone(&p)),
            Some(StubGeocoder::never("secondary", Arc::clone(&s))),
            None,
            Some(deal_cache()),
            None,
        );

        let resolution = resolver
            .resolve("國際企業中心1期")
            .await
            .expect("deal cache should match");
        assert_eq!(resolution.source, ResolutionSource::DealCache);
        assert!(resolution
            .matched_record
            .as_deref()
            .is_some_and(|r| r.contains("國際企業中心1期")));
    }

    #[tokio::test]
    async fn database_index_takes_precedence_over_deal_cache() {
        let (_, _, l) = counters();
        let resolver = Resolver::new(
            StubGeocoder::never("primary", Arc::new(AtomicUsize::new(0))),
            None::<StubGeocoder>,
            Some(StubIndex {
                behavior: StubIndexBehavior::MatchOn("國際企業中心1期".to_string()),
                calls: Arc::clone(&l),
            }),
            Some(deal_cache()),
            None,
        );

        let resolution = resolver
            .resolve("國際企業中心1期")
            .await
            .expect("index should match");
        assert_eq!(resolution.source, ResolutionSource::DatabaseFallback);
        assert_eq!(resolution.matched_record.as_deref(), Some("海濱花園"));
    }

    #[tokio::test]
    async fn normalized_query_tried_against_local_fallback_when_raw_misses() {
        let (_, _, l) = counters();
        // The index only knows the noise-free form.
        let resolver = Resolver::new(
            StubGeocoder::never("primary", Arc::new(AtomicUsize::new(0))),
            None::<StubGeocoder>,
            Some(StubIndex {
                behavior: StubIndexBehavior::MatchOn("海濱花園".to_string()),
                calls: Arc::clone(&l),
            }),
            None,
            None,
        );

        let resolution = resolver
            .resolve("海濱花園 12樓B")
            .await
            .expect("normalized form should match");
        assert_eq!(resolution.source, ResolutionSource::DatabaseFallback);
        assert_eq!(l.load(Ordering::SeqCst), 2, "raw then normalized");
    }

    #[tokio::test]
    async fn provider_errors_fall_through_to_fallbacks() {
        let resolver: Resolver<_, FailingGeocoder, StubIndex> = Resolver::new(
            FailingGeocoder,
            Some(FailingGeocoder),
            None,
            Some(deal_cache()),
            None,
        );

        let resolution = resolver
            .resolve("國際企業中心1期")
            .await
            .expect("deal cache should still match");
        assert_eq!(resolution.source, ResolutionSource::DealCache);
    }

    #[tokio::test]
    async fn full_exhaustion_reports_not_found_with_query_and_sample() {
        let resolver: Resolver<_, StubGeocoder, StubIndex> = Resolver::new(
            StubGeocoder::never("primary", Arc::new(AtomicUsize::new(0))),
            None,
            None,
            Some(deal_cache()),
            None,
        );

        let err = resolver.resolve("某個不存在的地方").await.unwrap_err();
        match err {
            ResolveError::NotFound { query, sample } => {
                assert_eq!(query, "某個不存在的地方");
                assert_eq!(sample.len(), 1);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn database_unavailable_surfaces_instead_of_not_found() {
        let resolver = Resolver::new(
            StubGeocoder::never("primary", Arc::new(AtomicUsize::new(0))),
            None::<StubGeocoder>,
            Some(StubIndex {
                behavior: StubIndexBehavior::Unavailable,
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            Some(deal_cache()),
            None,
        );

        let err = resolver.resolve("海濱花園").await.unwrap_err();
        assert!(
            matches!(err, ResolveError::Unavailable(ref reason) if reason.contains("pool")),
            "expected Unavailable, got {err:?}"
        );
    }

    #[tokio::test]
    async fn second_resolve_hits_cache_without_new_calls() {
        let (p, _, _) = counters();
        let resolver: Resolver<_, StubGeocoder, StubIndex> = Resolver::new(
            StubGeocoder::on_call("primary", 0, Arc::clone(&p)),
            None,
            None,
            None,
            Some(GeocodeCache::new(Duration::from_secs(60), 16)),
        );

        let first = resolver.resolve("海濱花園").await.expect("should match");
        let calls_after_first = p.load(Ordering::SeqCst);
        let second = resolver.resolve("海濱花園").await.expect("cache hit");
        assert_eq!(p.load(Ordering::SeqCst), calls_after_first);
        assert_eq!(first.coordinate, second.coordinate);
        assert_eq!(second.source, ResolutionSource::PrimaryGeocoder);
    }

    #[test]
    fn local_queries_deduplicates_identical_forms() {
        assert_eq!(local_queries("海濱花園", "海濱花園"), vec!["海濱花園"]);
        assert_eq!(
            local_queries("海濱花園 12樓B", "海濱花園"),
            vec!["海濱花園 12樓B", "海濱花園"]
        );
        assert_eq!(local_queries("中層 8室", ""), vec!["中層 8室"]);
    }
}
