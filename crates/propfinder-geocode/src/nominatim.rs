//! HTTP client for the Nominatim (OpenStreetMap) geocoding service.
//!
//! Wraps `reqwest` with a bounded timeout and typed response
//! deserialization. Nominatim requires an identifying `User-Agent` and
//! enforces informal rate limits; callers should put a result cache in
//! front of this client rather than hammer it.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use propfinder_core::GeoCoordinate;

use crate::error::ProviderError;
use crate::geocoder::Geocoder;

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org/";

/// One entry of a Nominatim `/search` response. Coordinates arrive as
/// strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Client for the Nominatim search API.
///
/// Use [`NominatimClient::new`] for production or
/// [`NominatimClient::with_base_url`] to point at a mock server in tests.
pub struct NominatimClient {
    client: Client,
    search_url: Url,
}

impl NominatimClient {
    /// Creates a new client pointed at the public Nominatim instance.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ProviderError> {
        Self::with_base_url(timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ProviderError::Api`] if `base_url` is not
    /// a valid URL.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/search", base_url.trim_end_matches('/'));
        let search_url = Url::parse(&normalised)
            .map_err(|e| ProviderError::Api(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self { client, search_url })
    }

    async fn search(&self, query: &str) -> Result<Option<GeoCoordinate>, ProviderError> {
        let mut url = self.search_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            pairs.append_pair("format", "json");
            pairs.append_pair("limit", "1");
        }

        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;

        let places: Vec<NominatimPlace> =
            serde_json::from_str(&body).map_err(|e| ProviderError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        let Some(place) = places.first() else {
            return Ok(None);
        };

        let lat = place.lat.parse::<f64>().map_err(|e| {
            ProviderError::Api(format!("non-numeric latitude '{}': {e}", place.lat))
        })?;
        let lng = place.lon.parse::<f64>().map_err(|e| {
            ProviderError::Api(format!("non-numeric longitude '{}': {e}", place.lon))
        })?;

        Ok(Some(GeoCoordinate { lat, lng }))
    }
}

impl Geocoder for NominatimClient {
    fn name(&self) -> &'static str {
        "nominatim"
    }

    async fn geocode(&self, query: &str) -> Result<Option<GeoCoordinate>, ProviderError> {
        self.search(query).await
    }
}
