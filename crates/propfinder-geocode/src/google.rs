//! HTTP client for the Google Maps Geocoding API.
//!
//! The paid fallback behind Nominatim. Requests are biased to Hong Kong via
//! the `components=country:HK` filter, matching the data this system serves.
//! Construction requires an API key — a deployment without one simply never
//! builds this client, and the resolver skips the provider.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use propfinder_core::GeoCoordinate;

use crate::error::ProviderError;
use crate::geocoder::Geocoder;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/";
const COUNTRY_COMPONENT: &str = "country:HK";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

/// Client for the Google Maps Geocoding API.
pub struct GoogleMapsClient {
    client: Client,
    api_key: String,
    geocode_url: Url,
}

impl GoogleMapsClient {
    /// Creates a new client pointed at the production Google Maps API.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ProviderError::Api`] if `base_url` is not
    /// a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!(
            "{}/maps/api/geocode/json",
            base_url.trim_end_matches('/')
        );
        let geocode_url = Url::parse(&normalised)
            .map_err(|e| ProviderError::Api(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            geocode_url,
        })
    }

    async fn lookup(&self, query: &str) -> Result<Option<GeoCoordinate>, ProviderError> {
        let mut url = self.geocode_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("address", query);
            pairs.append_pair("components", COUNTRY_COMPONENT);
            pairs.append_pair("key", &self.api_key);
        }

        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;

        let envelope: GeocodeResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Deserialize {
                context: format!("geocode(address={query})"),
                source: e,
            })?;

        match envelope.status.as_str() {
            "OK" => Ok(envelope.results.first().map(|r| GeoCoordinate {
                lat: r.geometry.location.lat,
                lng: r.geometry.location.lng,
            })),
            "ZERO_RESULTS" => Ok(None),
            status => {
                let detail = envelope
                    .error_message
                    .unwrap_or_else(|| "no detail".to_string());
                Err(ProviderError::Api(format!("{status}: {detail}")))
            }
        }
    }
}

impl Geocoder for GoogleMapsClient {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn geocode(&self, query: &str) -> Result<Option<GeoCoordinate>, ProviderError> {
        self.lookup(query).await
    }
}
