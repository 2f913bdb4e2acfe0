//! Uniform interface over external geocoding providers.

use std::future::Future;

use propfinder_core::GeoCoordinate;

use crate::error::ProviderError;

/// One external geocoding backend.
///
/// `Ok(None)` means the provider completed and found nothing for this query;
/// `Err` is reserved for transport/auth/malformed-response failures. The
/// resolver treats both the same way for a single attempt (move on to the
/// next variant) but logs them differently.
pub trait Geocoder {
    /// Provider name for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Geocode a single query string.
    fn geocode(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Option<GeoCoordinate>, ProviderError>> + Send;
}
