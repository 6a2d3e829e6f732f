//! Map markers, histogram rows and map centering.

use std::collections::BTreeMap;

use nuisance_map_analytics_models::{Coordinate, ExpandedRow, HistogramRow, MapMarker};
use nuisance_map_nuisance_models::{DEFAULT_MARKER_COLOR, NuisanceReport, NuisanceType};

/// Builds one marker per report, colored by its primary nuisance type.
#[must_use]
pub fn to_markers<'a>(reports: impl IntoIterator<Item = &'a NuisanceReport>) -> Vec<MapMarker> {
    reports
        .into_iter()
        .map(|report| MapMarker {
            id: report.id(),
            coordinate: Coordinate {
                latitude: report.latitude(),
                longitude: report.longitude(),
            },
            color: marker_color(report.nuisance_types().as_slice()),
            popup_text: popup_text(report),
        })
        .collect()
}

/// Color of the first type in `types`, or [`DEFAULT_MARKER_COLOR`].
#[must_use]
pub fn marker_color(types: &[NuisanceType]) -> &'static str {
    types
        .first()
        .map_or(DEFAULT_MARKER_COLOR, |t| t.marker_color())
}

/// Popup lines: name, address, types, frequency, comment.
///
/// The comment line is always present (empty when there is no comment).
#[must_use]
pub fn popup_text(report: &NuisanceReport) -> String {
    format!(
        "{}\n{}\n{}\nFrequency: {}\n{}",
        report.submitter_name(),
        report.address(),
        report.nuisance_types(),
        report.frequency(),
        report.comment().unwrap_or_default()
    )
}

/// Counts expanded rows per (type, frequency).
///
/// Types appear in first-appearance order across `rows`; within a type,
/// frequencies follow the enumeration order. Only non-zero counts are
/// emitted.
#[must_use]
pub fn to_histogram_rows(rows: &[ExpandedRow<'_>]) -> Vec<HistogramRow> {
    let mut type_order: Vec<NuisanceType> = Vec::new();
    let mut counts = BTreeMap::new();

    for row in rows {
        let found = type_order.iter().position(|t| *t == row.nuisance_type);
        let position = if let Some(position) = found {
            position
        } else {
            type_order.push(row.nuisance_type);
            type_order.len() - 1
        };
        *counts
            .entry((position, row.report.frequency()))
            .or_insert(0_u64) += 1;
    }

    counts
        .into_iter()
        .map(|((position, frequency), count)| HistogramRow {
            nuisance_type: type_order[position],
            frequency,
            count,
            color: frequency.chart_color(),
        })
        .collect()
}

/// Mean coordinate of `reports`, or `None` if there are none.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn map_center(reports: &[NuisanceReport]) -> Option<Coordinate> {
    if reports.is_empty() {
        return None;
    }

    let n = reports.len() as f64;
    let (lat, lon) = reports.iter().fold((0.0, 0.0), |(lat, lon), r| {
        (lat + r.latitude(), lon + r.longitude())
    });

    Some(Coordinate {
        latitude: lat / n,
        longitude: lon / n,
    })
}
