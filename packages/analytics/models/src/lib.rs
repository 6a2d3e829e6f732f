#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Query and view types for the nuisance map.
//!
//! Defines the filter accepted by the query engine and the marker,
//! histogram and view shapes handed to the map and chart consumers.

use std::collections::BTreeSet;
use std::str::FromStr;

use nuisance_map_nuisance_models::{Frequency, NuisanceReport, NuisanceType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Map center used when there are no reports to average.
pub const DEFAULT_MAP_CENTER: Coordinate = Coordinate {
    latitude: 43.653_88,
    longitude: 6.801_98,
};

/// A label in a comma-separated list is not a known value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown label '{value}'")]
pub struct UnknownLabelError {
    /// The unrecognised label.
    pub value: String,
}

/// Parses a comma-separated label list such as `"Noise, Odor"`, keeping
/// the given order. Blank segments are skipped, so `""` is the empty list.
///
/// # Errors
///
/// Returns [`UnknownLabelError`] for the first label that does not parse.
pub fn parse_label_list<T: FromStr>(value: &str) -> Result<Vec<T>, UnknownLabelError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(|label| {
            T::from_str(label).map_err(|_| UnknownLabelError {
                value: label.to_string(),
            })
        })
        .collect()
}

/// Allowed nuisance types and frequencies for a query.
///
/// An empty set matches nothing; there is no implicit "match all".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    /// Allowed nuisance types.
    pub types: BTreeSet<NuisanceType>,
    /// Allowed frequencies.
    pub frequencies: BTreeSet<Frequency>,
}

impl QueryFilter {
    /// Creates a filter from explicit sets.
    #[must_use]
    pub fn new(
        types: impl IntoIterator<Item = NuisanceType>,
        frequencies: impl IntoIterator<Item = Frequency>,
    ) -> Self {
        Self {
            types: types.into_iter().collect(),
            frequencies: frequencies.into_iter().collect(),
        }
    }

    /// Parses optional comma-separated lists. `None` allows every value;
    /// an empty list allows none.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownLabelError`] if a label is not a known type or
    /// frequency.
    pub fn parse(types: Option<&str>, frequencies: Option<&str>) -> Result<Self, UnknownLabelError> {
        let types = match types {
            Some(value) => parse_label_list(value)?,
            None => NuisanceType::all().to_vec(),
        };
        let frequencies = match frequencies {
            Some(value) => parse_label_list(value)?,
            None => Frequency::all().to_vec(),
        };
        Ok(Self::new(types, frequencies))
    }

    /// Filter allowing every type and every frequency.
    #[must_use]
    pub fn all() -> Self {
        Self::new(
            NuisanceType::all().iter().copied(),
            Frequency::all().iter().copied(),
        )
    }
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self::all()
    }
}

/// One (report, single nuisance type) pair produced by expansion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpandedRow<'a> {
    /// The source report, unchanged.
    pub report: &'a NuisanceReport,
    /// Exactly one of the report's types.
    pub nuisance_type: NuisanceType,
}

/// WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// A map marker for one report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapMarker {
    /// Report id.
    pub id: Uuid,
    /// Marker position.
    pub coordinate: Coordinate,
    /// Color of the report's primary nuisance type.
    pub color: &'static str,
    /// Newline-separated popup: name, address, types, frequency, comment.
    pub popup_text: String,
}

/// Count of expanded rows for one (type, frequency) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramRow {
    /// Nuisance type axis value.
    pub nuisance_type: NuisanceType,
    /// Frequency series value.
    pub frequency: Frequency,
    /// Number of expanded rows with this pair.
    pub count: u64,
    /// Chart color of `frequency`.
    pub color: &'static str,
}

/// Everything the map and chart need for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResult {
    /// Map center, averaged over the whole collection.
    pub center: Coordinate,
    /// Size of the whole collection.
    pub total_reports: usize,
    /// Number of reports passing the filter.
    pub matching_reports: usize,
    /// One marker per matching report.
    pub markers: Vec<MapMarker>,
    /// Histogram over the matching reports.
    pub histogram: Vec<HistogramRow>,
}
