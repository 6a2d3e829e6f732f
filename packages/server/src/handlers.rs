//! HTTP handler functions for the nuisance map API.

use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, web};
use nuisance_map_analytics_models::QueryFilter;
use nuisance_map_geocoder::{GeocodeOutcome, Geocoder as _};
use nuisance_map_nuisance_models::ReportSubmission;
use nuisance_map_server_models::{
    ApiError, ApiGeocode, ApiHealth, ApiNuisanceTypes, GeocodeQueryParams, ViewQueryParams,
};
use nuisance_map_store::{RepositoryError, SubmitError};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/nuisance-types`
///
/// Returns the fixed nuisance types and frequencies with their colors.
pub async fn nuisance_types() -> HttpResponse {
    HttpResponse::Ok().json(ApiNuisanceTypes::all())
}

/// `GET /api/geocode?address=...`
pub async fn geocode(
    state: web::Data<AppState>,
    params: web::Query<GeocodeQueryParams>,
) -> HttpResponse {
    match state.geocoder.geocode(&params.address).await {
        GeocodeOutcome::Found(found) => HttpResponse::Ok().json(ApiGeocode {
            latitude: found.latitude,
            longitude: found.longitude,
            matched_address: found.matched_address,
        }),
        GeocodeOutcome::NotFound => HttpResponse::NotFound().json(ApiError::new(
            "GeocodeNotFound",
            "Address not found: place the location on the map instead",
        )),
    }
}

/// `POST /api/reports`
///
/// Validates and persists a submission, returning the stored report.
pub async fn submit_report(
    state: web::Data<AppState>,
    body: web::Json<ReportSubmission>,
) -> HttpResponse {
    match state.repository.submit(body.into_inner()).await {
        Ok(report) => HttpResponse::Created().json(report),
        Err(e) => submit_error_response(&e),
    }
}

/// `GET /api/view?types=...&frequencies=...`
///
/// Returns markers and histogram rows for the reports passing the filter.
pub async fn view(state: web::Data<AppState>, params: web::Query<ViewQueryParams>) -> HttpResponse {
    let query = match QueryFilter::parse(params.types.as_deref(), params.frequencies.as_deref()) {
        Ok(query) => query,
        Err(e) => {
            return HttpResponse::BadRequest().json(ApiError::new("InvalidQuery", e.to_string()));
        }
    };

    match state.repository.load_all().await {
        Ok(reports) => HttpResponse::Ok().json(nuisance_map_analytics::view(&reports, &query)),
        Err(RepositoryError::Storage(e)) => {
            log::warn!("Failed to load reports: {e}");
            HttpResponse::ServiceUnavailable().json(ApiError::new("StorageError", e.to_string()))
        }
        Err(RepositoryError::Schema(e)) => {
            log::error!("Stored reports are corrupt: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new("SchemaError", e.to_string()))
        }
    }
}

/// Rejects a request body that is not a well-formed submission (bad JSON,
/// a missing `frequency`, an unknown label) with `400 InvalidSubmission`.
pub fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected request body: {err}");
    let response =
        HttpResponse::BadRequest().json(ApiError::new("InvalidSubmission", err.to_string()));
    InternalError::from_response(err, response).into()
}

/// Rejects a query string that does not fit the endpoint's parameters with
/// `400 InvalidQuery`.
pub fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected query string: {err}");
    let response = HttpResponse::BadRequest().json(ApiError::new("InvalidQuery", err.to_string()));
    InternalError::from_response(err, response).into()
}

fn submit_error_response(e: &SubmitError) -> HttpResponse {
    let body = ApiError::new(e.kind(), e.to_string());
    match e {
        SubmitError::MissingLocation
        | SubmitError::InvalidLocation { .. }
        | SubmitError::MissingNuisanceType => HttpResponse::UnprocessableEntity().json(body),
        SubmitError::Storage(_) => HttpResponse::ServiceUnavailable().json(body),
        SubmitError::Schema(_) => {
            log::error!("Rejected submission, stored reports are corrupt: {e}");
            HttpResponse::InternalServerError().json(body)
        }
    }
}
