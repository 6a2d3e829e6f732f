//! Report filtering and per-type expansion.

use nuisance_map_analytics_models::{ExpandedRow, QueryFilter};
use nuisance_map_nuisance_models::NuisanceReport;

/// Keeps reports whose frequency is allowed and which share at least one
/// nuisance type with the filter, in input order.
///
/// Types are compared element by element, so one label being a substring
/// of another never produces a match.
#[must_use]
pub fn filter<'a>(reports: &'a [NuisanceReport], query: &QueryFilter) -> Vec<&'a NuisanceReport> {
    reports
        .iter()
        .filter(|r| {
            query.frequencies.contains(&r.frequency())
                && r.nuisance_types().iter().any(|t| query.types.contains(t))
        })
        .collect()
}

/// Emits one row per (report, nuisance type), reports in input order and
/// types in each report's declared order.
#[must_use]
pub fn expand<'a>(reports: &[&'a NuisanceReport]) -> Vec<ExpandedRow<'a>> {
    reports
        .iter()
        .flat_map(|&report| {
            report.nuisance_types().iter().map(move |t| ExpandedRow {
                report,
                nuisance_type: *t,
            })
        })
        .collect()
}
