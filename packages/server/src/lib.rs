#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the nuisance map.
//!
//! Exposes the submission boundary (`POST /api/reports`), the query
//! boundary (`GET /api/view`), address lookup (`GET /api/geocode`) and the
//! fixed taxonomy (`GET /api/nuisance-types`). Every request reloads the
//! report collection from the configured store; the only state shared
//! between requests is the repository handle and the geocoder.

mod handlers;
pub mod interactive;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use nuisance_map_geocoder::{GeocodeError, Geocoder, NominatimGeocoder};
use nuisance_map_store::ReportRepository;
use nuisance_map_store::config::{ConfigError, StoreConfig};
use thiserror::Error;

/// Default listener address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Default listener port.
pub const DEFAULT_PORT: u16 = 8080;

/// Errors starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Store configuration is invalid.
    #[error("Store configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The geocoder could not be set up.
    #[error("Geocoder error: {0}")]
    Geocoder(#[from] GeocodeError),

    /// Binding or running the HTTP server failed.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared application state.
pub struct AppState {
    /// Report collection handle. Holds no cached reports.
    pub repository: ReportRepository,
    /// Address lookup.
    pub geocoder: Arc<dyn Geocoder>,
}

impl AppState {
    /// Builds the state from the store environment variables and the
    /// embedded Nominatim configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the store configuration is invalid or the
    /// geocoder cannot be built.
    pub fn from_env() -> Result<Self, ServerError> {
        let repository = StoreConfig::from_env()?.repository();
        let geocoder = NominatimGeocoder::from_env()?;
        log::info!("Geocoding with {}", geocoder.service().name);

        Ok(Self {
            repository,
            geocoder: Arc::new(geocoder),
        })
    }
}

/// Reads `BIND_ADDR` and `PORT`, falling back to the defaults.
#[must_use]
pub fn bind_from_env() -> (String, u16) {
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let port = match std::env::var("PORT") {
        Ok(p) => p.parse().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid PORT '{p}', using {DEFAULT_PORT}");
            DEFAULT_PORT
        }),
        Err(_) => DEFAULT_PORT,
    };
    (bind_addr, port)
}

/// Registers the `/api` routes.
///
/// Malformed JSON bodies and query strings are answered with the same
/// `{ error, kind }` body as every other failure.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(handlers::json_error))
            .app_data(web::QueryConfig::default().error_handler(handlers::query_error))
            .route("/health", web::get().to(handlers::health))
            .route("/nuisance-types", web::get().to(handlers::nuisance_types))
            .route("/geocode", web::get().to(handlers::geocode))
            .route("/reports", web::post().to(handlers::submit_report))
            .route("/view", web::get().to(handlers::view)),
    );
}

/// Starts the API server configured from the environment.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the configuration is invalid or the HTTP
/// server fails to bind or run.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> Result<(), ServerError> {
    let (bind_addr, port) = bind_from_env();
    serve(AppState::from_env()?, &bind_addr, port).await
}

/// Serves `state` on `bind_addr:port` until shutdown.
///
/// # Errors
///
/// Returns [`ServerError::Io`] if the HTTP server fails to bind or run.
#[allow(clippy::future_not_send)]
pub async fn serve(state: AppState, bind_addr: &str, port: u16) -> Result<(), ServerError> {
    let state = web::Data::new(state);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}
