//! Nominatim / OpenStreetMap geocoder client.
//!
//! The public instance allows at most **1 request per second** and
//! requires an identifying `User-Agent`. Lookups here are one-off, driven
//! by a person filling in a report, so no client-side rate limiting is
//! applied.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use std::time::Duration;

use async_trait::async_trait;

use crate::service_registry::{self, GeocodingService};
use crate::{GeocodeError, GeocodeOutcome, GeocodedAddress, Geocoder};

/// Free-form Nominatim search.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    service: GeocodingService,
}

impl NominatimGeocoder {
    /// Builds a client for `service`, applying its timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(service: GeocodingService) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(&service.user_agent)
            .timeout(Duration::from_millis(service.timeout_ms))
            .build()?;

        Ok(Self { client, service })
    }

    /// Builds a client from the embedded configuration and `NOMINATIM_URL`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the configuration is malformed or the
    /// HTTP client cannot be built.
    pub fn from_env() -> Result<Self, GeocodeError> {
        Self::new(service_registry::nominatim_from_env()?)
    }

    /// Service configuration in use.
    #[must_use]
    pub const fn service(&self) -> &GeocodingService {
        &self.service
    }

    /// Geocodes a free-form query, returning the best match.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the HTTP request fails, the service is
    /// rate limiting or the response cannot be parsed.
    pub async fn search(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
        let mut params = vec![("q", query), ("format", "jsonv2"), ("limit", "1")];
        if let Some(codes) = &self.service.country_codes {
            params.push(("countrycodes", codes.as_str()));
        }

        let resp = self
            .client
            .get(&self.service.base_url)
            .query(&params)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }
        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> GeocodeOutcome {
        let query = address.trim();
        if query.is_empty() {
            return GeocodeOutcome::NotFound;
        }

        match self.search(query).await {
            Ok(Some(found)) => {
                log::debug!(
                    "Geocoded '{query}' -> ({}, {})",
                    found.latitude,
                    found.longitude
                );
                GeocodeOutcome::Found(found)
            }
            Ok(None) => {
                log::info!("No geocoding match for '{query}'");
                GeocodeOutcome::NotFound
            }
            Err(e) => {
                log::warn!("Geocoding '{query}' via {} failed: {e}", self.service.id);
                GeocodeOutcome::NotFound
            }
        }
    }
}

/// Parses Nominatim JSON response.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let lat = first["lat"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lat in Nominatim response".to_string(),
        })?;

    let lon = first["lon"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lon in Nominatim response".to_string(),
        })?;

    Ok(Some(GeocodedAddress {
        latitude: lat,
        longitude: lon,
        matched_address: first["display_name"].as_str().map(String::from),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_service() -> GeocodingService {
        GeocodingService {
            id: "test".to_string(),
            name: "Unreachable".to_string(),
            base_url: "http://127.0.0.1:9/search".to_string(),
            user_agent: "nuisance-map-tests".to_string(),
            timeout_ms: 500,
            country_codes: None,
        }
    }

    #[test]
    fn parses_nominatim_result() {
        let body = serde_json::json!([{
            "lat": "43.6588",
            "lon": "6.9233",
            "display_name": "Grasse, Alpes-Maritimes, France"
        }]);
        let result = parse_response(&body).unwrap().unwrap();
        assert!((result.latitude - 43.6588).abs() < 1e-4);
        assert!((result.longitude - 6.9233).abs() < 1e-4);
        assert_eq!(
            result.matched_address.as_deref(),
            Some("Grasse, Alpes-Maritimes, France")
        );
    }

    #[test]
    fn parses_nominatim_empty() {
        let body = serde_json::json!([]);
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn malformed_response_is_parse_error() {
        let not_array = serde_json::json!({"error": "Unable to geocode"});
        assert!(matches!(
            parse_response(&not_array),
            Err(GeocodeError::Parse { .. })
        ));

        let numeric_lat = serde_json::json!([{ "lat": 43.6, "lon": "6.9" }]);
        assert!(matches!(
            parse_response(&numeric_lat),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn connection_failure_is_not_found() {
        let geocoder = NominatimGeocoder::new(unreachable_service()).unwrap();
        assert!(geocoder.search("Grasse").await.is_err());
        assert_eq!(geocoder.geocode("Grasse").await, GeocodeOutcome::NotFound);
    }

    #[tokio::test]
    async fn blank_address_is_not_found_without_request() {
        let geocoder = NominatimGeocoder::new(unreachable_service()).unwrap();
        assert_eq!(geocoder.geocode("   ").await, GeocodeOutcome::NotFound);
    }
}
