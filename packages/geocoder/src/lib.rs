#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address geocoding for nuisance reports.
//!
//! Converts a free-text address into a coordinate. The only provider is
//! Nominatim / OpenStreetMap, configured by the embedded TOML file in
//! `services/` (see [`service_registry`]).
//!
//! [`Geocoder::geocode`] never fails: network errors, rate limiting,
//! timeouts and unparseable responses are logged and reported as
//! [`GeocodeOutcome::NotFound`], so the caller can fall back to placing
//! the location by hand.

pub mod nominatim;
pub mod service_registry;

use async_trait::async_trait;
use thiserror::Error;

pub use nominatim::NominatimGeocoder;

/// A geocoding hit.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// The matched/canonical address returned by the geocoder.
    pub matched_address: Option<String>,
}

/// Outcome of a lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    /// The address resolved to a coordinate.
    Found(GeocodedAddress),
    /// No match, or the lookup failed.
    NotFound,
}

impl GeocodeOutcome {
    /// Returns the hit, if any.
    #[must_use]
    pub fn found(self) -> Option<GeocodedAddress> {
        match self {
            Self::Found(address) => Some(address),
            Self::NotFound => None,
        }
    }
}

/// Resolves free-text addresses to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Looks up `address`. Blank input is [`GeocodeOutcome::NotFound`].
    async fn geocode(&self, address: &str) -> GeocodeOutcome;
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed or timed out.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("HTTP status {status}")]
    Status {
        /// Response status code.
        status: u16,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The embedded service configuration is unusable.
    #[error("Invalid geocoding service config '{name}': {message}")]
    Config {
        /// Service file name.
        name: String,
        /// What went wrong.
        message: String,
    },
}
