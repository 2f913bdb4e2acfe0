//! Interface for local (non-network) location fallbacks.

use std::future::Future;

use propfinder_core::GeoCoordinate;

use crate::error::LocalIndexError;

/// A location found by a local index.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMatch {
    pub coordinate: GeoCoordinate,
    /// The stored name or record that matched, for diagnostics only.
    pub matched: Option<String>,
}

/// A locally-queryable index of known locations, consulted when every
/// external geocoder has missed.
///
/// Implementations must return `Ok(None)` for "nothing matched" and reserve
/// [`LocalIndexError::Unavailable`] for lookups that could not run at all.
pub trait LocalIndex {
    fn find_by_text(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Option<LocalMatch>, LocalIndexError>> + Send;
}
