//! Free-text location resolution for Hong Kong property queries.
//!
//! Converts a user-supplied location string into WGS84 coordinates through a
//! cascading pipeline: address-noise normalization, query-variant expansion,
//! external geocoders (Nominatim first, Google Maps second), and local
//! fallbacks (database index, then the deal-tracking cache) when both
//! geocoders miss. See [`Resolver`] for the stage ordering.

pub mod cache;
pub mod deals;
pub mod error;
pub mod geocoder;
pub mod google;
pub mod local;
pub mod nominatim;
pub mod normalize;
pub mod resolve;
pub mod variants;

pub use cache::GeocodeCache;
pub use deals::{DealCache, DealMatch};
pub use error::{DealCacheError, LocalIndexError, ProviderError, ResolveError};
pub use geocoder::Geocoder;
pub use google::GoogleMapsClient;
pub use local::{LocalIndex, LocalMatch};
pub use nominatim::NominatimClient;
pub use normalize::normalize;
pub use resolve::{Resolution, ResolutionSource, Resolver};
pub use variants::build_variants;
