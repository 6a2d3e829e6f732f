//! Compile-time embedded geocoding service configuration.
//!
//! The Nominatim provider is defined in `services/nominatim.toml`. The
//! file is embedded at compile time; `NOMINATIM_URL` overrides its base
//! URL at runtime (e.g. to point at a self-hosted instance).

use serde::Deserialize;

use crate::GeocodeError;

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"nominatim"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Search endpoint (e.g., `"https://nominatim.openstreetmap.org/search"`).
    pub base_url: String,
    /// `User-Agent` sent with every request, required by the public
    /// Nominatim usage policy.
    pub user_agent: String,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Comma-separated ISO country codes limiting the search.
    #[serde(default)]
    pub country_codes: Option<String>,
}

const fn default_timeout_ms() -> u64 {
    5000
}

const NOMINATIM_TOML: &str = include_str!("../services/nominatim.toml");

/// Parses a service definition.
///
/// # Errors
///
/// Returns [`GeocodeError::Config`] if the TOML is malformed.
pub fn parse_service(name: &str, toml_str: &str) -> Result<GeocodingService, GeocodeError> {
    toml::de::from_str(toml_str).map_err(|e| GeocodeError::Config {
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// Returns the embedded Nominatim configuration, without overrides.
///
/// # Errors
///
/// Returns [`GeocodeError::Config`] if the embedded TOML is malformed.
pub fn nominatim() -> Result<GeocodingService, GeocodeError> {
    parse_service("nominatim", NOMINATIM_TOML)
}

/// Returns the Nominatim configuration with `NOMINATIM_URL` applied.
///
/// # Errors
///
/// Returns [`GeocodeError::Config`] if the embedded TOML is malformed.
pub fn nominatim_from_env() -> Result<GeocodingService, GeocodeError> {
    let mut service = nominatim()?;
    if let Some(url) = std::env::var("NOMINATIM_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
    {
        log::info!("Using Nominatim at {url} (NOMINATIM_URL)");
        service.base_url = url;
    }
    Ok(service)
}
