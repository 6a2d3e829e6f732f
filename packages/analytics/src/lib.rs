#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Query engine and aggregation view over a loaded report collection.
//!
//! Everything here is a pure function of its input: the caller loads the
//! collection (see `nuisance_map_store`) and hands it in.
//!
//! * [`query`] filters reports and expands them into one row per
//!   (report, nuisance type).
//! * [`aggregate`] turns reports into map markers and expanded rows into
//!   histogram counts.
//! * [`view`] runs both for one [`QueryFilter`].

pub mod aggregate;
pub mod query;

use nuisance_map_analytics_models::{DEFAULT_MAP_CENTER, QueryFilter, ViewResult};
use nuisance_map_nuisance_models::NuisanceReport;

pub use aggregate::{map_center, to_histogram_rows, to_markers};
pub use query::{expand, filter};

/// Builds the markers and histogram for the reports passing `query`.
///
/// The map center is averaged over `all_reports`, not the filtered subset,
/// so it stays put while filters change.
#[must_use]
pub fn view(all_reports: &[NuisanceReport], query: &QueryFilter) -> ViewResult {
    let matching = filter(all_reports, query);
    let histogram = to_histogram_rows(&expand(&matching));
    let markers = to_markers(matching.iter().copied());

    log::debug!(
        "View: {} of {} reports match, {} histogram rows",
        matching.len(),
        all_reports.len(),
        histogram.len()
    );

    ViewResult {
        center: map_center(all_reports).unwrap_or(DEFAULT_MAP_CENTER),
        total_reports: all_reports.len(),
        matching_reports: matching.len(),
        markers,
        histogram,
    }
}
