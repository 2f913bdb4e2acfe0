use thiserror::Error;

/// Errors from a single geocoding-provider attempt.
///
/// These never mean "no match" — a provider that completes without error but
/// finds nothing returns `Ok(None)`. The resolver logs provider errors and
/// demotes them to a no-match for that attempt only.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network or TLS failure, timeout, or non-2xx HTTP status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned an application-level error status.
    #[error("geocoder API error: {0}")]
    Api(String),

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors loading the deal-tracking cache file.
#[derive(Debug, Error)]
pub enum DealCacheError {
    #[error("failed to read deal cache {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse deal cache {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from a local location index lookup.
///
/// An index that finds nothing returns `Ok(None)`; `Unavailable` means the
/// lookup could not run at all (pool exhaustion, query failure) and must not
/// be confused with a miss.
#[derive(Debug, Error)]
pub enum LocalIndexError {
    #[error("location index unavailable: {0}")]
    Unavailable(String),
}

/// Terminal errors from [`crate::Resolver::resolve`].
///
/// Everything else (per-attempt provider failures, stage misses) stays inside
/// the resolver and drives fallthrough to the next stage.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The query was blank after trimming; rejected before any I/O.
    #[error("location query is empty")]
    EmptyQuery,

    /// Every stage was exhausted without a match. Carries the original query
    /// and a sample of known deal records for diagnostics.
    #[error("could not find location \"{query}\"")]
    NotFound { query: String, sample: Vec<String> },

    /// The database-backed fallback could not run. Surfaced distinctly so
    /// callers can retry rather than treat it as a definitive not-found.
    #[error("location index unavailable: {0}")]
    Unavailable(String),
}
