#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the nuisance map server.
//!
//! These types are serialized to JSON for the REST API. Report and view
//! payloads reuse the domain types directly; this crate only holds the
//! shapes that exist purely for the HTTP contract.

use nuisance_map_nuisance_models::{Frequency, NuisanceType};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// User-facing message.
    pub error: String,
    /// Stable taxonomy name (e.g. `"MissingLocation"`).
    pub kind: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(kind: &str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            kind: kind.to_string(),
        }
    }
}

/// An enumeration value with its display color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLabel {
    /// Canonical label.
    pub name: String,
    /// Color used by the map or chart.
    pub color: String,
}

impl From<NuisanceType> for ApiLabel {
    fn from(value: NuisanceType) -> Self {
        Self {
            name: value.to_string(),
            color: value.marker_color().to_string(),
        }
    }
}

impl From<Frequency> for ApiLabel {
    fn from(value: Frequency) -> Self {
        Self {
            name: value.to_string(),
            color: value.chart_color().to_string(),
        }
    }
}

/// The fixed taxonomy, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiNuisanceTypes {
    /// Nuisance types with their marker colors.
    pub nuisance_types: Vec<ApiLabel>,
    /// Frequencies with their chart colors.
    pub frequencies: Vec<ApiLabel>,
}

impl ApiNuisanceTypes {
    /// Builds the full taxonomy.
    #[must_use]
    pub fn all() -> Self {
        Self {
            nuisance_types: NuisanceType::all().iter().copied().map(ApiLabel::from).collect(),
            frequencies: Frequency::all().iter().copied().map(ApiLabel::from).collect(),
        }
    }
}

/// Geocoding hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGeocode {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Address as matched by the geocoder.
    pub matched_address: Option<String>,
}

/// Query parameters for `GET /api/geocode`.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeQueryParams {
    /// Free-text address.
    pub address: String,
}

/// Query parameters for `GET /api/view`.
///
/// Each parameter is a comma-separated list of labels. An absent
/// parameter means every value; a present but empty one means none.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewQueryParams {
    /// Allowed nuisance types (e.g. `"Noise,Odor"`).
    pub types: Option<String>,
    /// Allowed frequencies (e.g. `"Daily,Weekly"`).
    pub frequencies: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_lists_every_value_with_colors() {
        let json = serde_json::to_value(ApiNuisanceTypes::all()).unwrap();
        assert_eq!(json["nuisanceTypes"].as_array().unwrap().len(), 4);
        assert_eq!(json["nuisanceTypes"][2]["name"], "Health effect");
        assert_eq!(json["nuisanceTypes"][2]["color"], "orange");
        assert_eq!(json["frequencies"][0]["name"], "Daily");
        assert_eq!(json["frequencies"][3]["color"], "blue");
    }

    #[test]
    fn geocode_serializes_camel_case() {
        let json = serde_json::to_value(ApiGeocode {
            latitude: 43.6,
            longitude: 6.9,
            matched_address: Some("Grasse".to_string()),
        })
        .unwrap();
        assert_eq!(json["matchedAddress"], "Grasse");
    }
}
