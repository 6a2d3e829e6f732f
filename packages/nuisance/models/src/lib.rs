#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Nuisance report entity model.
//!
//! This crate defines the fixed nuisance taxonomy ([`NuisanceType`]), the
//! fixed [`Frequency`] scale, and the immutable [`NuisanceReport`] entity
//! shared by the store, the analytics engine and the HTTP surface.
//!
//! Reports come into existence in exactly two ways:
//!
//! * [`ReportSubmission::into_report`] validates user input and assigns a
//!   fresh id.
//! * [`NuisanceReport::from_parts`] rebuilds a report decoded from durable
//!   storage, re-checking the same invariants.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Submitter name used when the submitter leaves the name blank.
pub const ANONYMOUS_SUBMITTER: &str = "anonymous";

/// Address recorded when the location was placed by hand on the map rather
/// than resolved from an address.
pub const MANUAL_LOCATION: &str = "Manual location";

/// Marker color used when no nuisance type is available.
pub const DEFAULT_MARKER_COLOR: &str = "gray";

/// Kind of nuisance a report describes.
///
/// Parsing also accepts the French labels written by the first deployment
/// of the application; [`Display`](std::fmt::Display) always produces the
/// canonical English label.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum NuisanceType {
    /// Noise nuisance
    #[strum(to_string = "Noise", serialize = "Bruit")]
    #[serde(rename = "Noise")]
    Noise,
    /// Smell nuisance
    #[strum(to_string = "Odor", serialize = "Odeur")]
    #[serde(rename = "Odor")]
    Odor,
    /// Physical symptoms attributed to the nuisance
    #[strum(to_string = "Health effect", serialize = "Effet sur la santé")]
    #[serde(rename = "Health effect")]
    HealthEffect,
    /// Light pollution
    #[strum(to_string = "Light", serialize = "Lumineuse")]
    #[serde(rename = "Light")]
    Light,
}

impl NuisanceType {
    /// Returns the map marker color for reports whose primary type is
    /// `self`.
    #[must_use]
    pub const fn marker_color(self) -> &'static str {
        match self {
            Self::Noise => "red",
            Self::Odor => "green",
            Self::HealthEffect => "orange",
            Self::Light => "blue",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Noise, Self::Odor, Self::HealthEffect, Self::Light]
    }
}

/// How often the submitter experiences the nuisance.
///
/// Variants are declared (and therefore ordered) from most to least
/// frequent, which is the axis order used by the histogram.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Frequency {
    /// Every day
    #[strum(to_string = "Daily", serialize = "Tous les jours")]
    #[serde(rename = "Daily")]
    Daily,
    /// About once a week
    #[strum(to_string = "Weekly", serialize = "Une fois par semaine")]
    #[serde(rename = "Weekly")]
    Weekly,
    /// About once a month
    #[strum(to_string = "Monthly", serialize = "Une fois par mois")]
    #[serde(rename = "Monthly")]
    Monthly,
    /// About once a year
    #[strum(to_string = "Yearly", serialize = "Une fois par an")]
    #[serde(rename = "Yearly")]
    Yearly,
}

impl Frequency {
    /// Returns the chart color for this frequency.
    #[must_use]
    pub const fn chart_color(self) -> &'static str {
        match self {
            Self::Daily => "red",
            Self::Weekly => "orange",
            Self::Monthly => "yellow",
            Self::Yearly => "blue",
        }
    }

    /// Returns all variants of this enum, most frequent first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Daily, Self::Weekly, Self::Monthly, Self::Yearly]
    }
}

/// Deserializes a label through its `FromStr` impl so JSON accepts the
/// same spellings as query strings and stored rows.
fn deserialize_label<'de, D, T>(deserializer: D, expected: &'static [&'static str]) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: std::str::FromStr,
{
    let label = String::deserialize(deserializer)?;
    label
        .parse()
        .map_err(|_| serde::de::Error::unknown_variant(&label, expected))
}

impl<'de> Deserialize<'de> for NuisanceType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_label(deserializer, &["Noise", "Odor", "Health effect", "Light"])
    }
}

impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_label(deserializer, &["Daily", "Weekly", "Monthly", "Yearly"])
    }
}

/// Errors raised when building a [`NuisanceTypes`] list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NuisanceTypesError {
    /// The list has no members.
    #[error("at least one nuisance type is required")]
    Empty,

    /// The same type appears more than once.
    #[error("nuisance type '{nuisance_type}' is listed more than once")]
    Duplicate {
        /// The repeated type.
        nuisance_type: NuisanceType,
    },
}

/// Ordered, duplicate-free, non-empty list of nuisance types.
///
/// The first member is the report's primary type and drives its marker
/// color, so declaration order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<NuisanceType>", into = "Vec<NuisanceType>")]
pub struct NuisanceTypes(Vec<NuisanceType>);

impl NuisanceTypes {
    /// Builds a list, rejecting empty input and repeated members.
    ///
    /// # Errors
    ///
    /// Returns [`NuisanceTypesError::Empty`] for an empty list and
    /// [`NuisanceTypesError::Duplicate`] for the first repeated member.
    pub fn new(types: Vec<NuisanceType>) -> Result<Self, NuisanceTypesError> {
        if types.is_empty() {
            return Err(NuisanceTypesError::Empty);
        }
        let mut seen = BTreeSet::new();
        for nuisance_type in &types {
            if !seen.insert(*nuisance_type) {
                return Err(NuisanceTypesError::Duplicate {
                    nuisance_type: *nuisance_type,
                });
            }
        }
        Ok(Self(types))
    }

    /// Builds a list, collapsing repeated members onto their first
    /// occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`NuisanceTypesError::Empty`] if `types` yields nothing.
    pub fn collapsing<I>(types: I) -> Result<Self, NuisanceTypesError>
    where
        I: IntoIterator<Item = NuisanceType>,
    {
        let mut seen = BTreeSet::new();
        let deduped: Vec<NuisanceType> = types.into_iter().filter(|t| seen.insert(*t)).collect();
        Self::new(deduped)
    }

    /// Returns the primary (first declared) type.
    #[must_use]
    pub fn primary(&self) -> NuisanceType {
        self.0[0]
    }

    /// Returns the members in declared order.
    #[must_use]
    pub fn as_slice(&self) -> &[NuisanceType] {
        &self.0
    }

    /// Iterates the members in declared order.
    pub fn iter(&self) -> std::slice::Iter<'_, NuisanceType> {
        self.0.iter()
    }

    /// Returns `true` if `nuisance_type` is a member.
    #[must_use]
    pub fn contains(&self, nuisance_type: NuisanceType) -> bool {
        self.0.contains(&nuisance_type)
    }
}

impl TryFrom<Vec<NuisanceType>> for NuisanceTypes {
    type Error = NuisanceTypesError;

    fn try_from(value: Vec<NuisanceType>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NuisanceTypes> for Vec<NuisanceType> {
    fn from(value: NuisanceTypes) -> Self {
        value.0
    }
}

impl<'a> IntoIterator for &'a NuisanceTypes {
    type Item = &'a NuisanceType;
    type IntoIter = std::slice::Iter<'a, NuisanceType>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::fmt::Display for NuisanceTypes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, nuisance_type) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(nuisance_type.as_ref())?;
        }
        Ok(())
    }
}

/// Errors raised when rebuilding a report from stored parts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReportError {
    /// The submitter name is blank.
    #[error("submitter name is empty")]
    EmptySubmitterName,

    /// A coordinate is not finite or outside the WGS84 range.
    #[error("invalid location ({latitude}, {longitude})")]
    InvalidLocation {
        /// Stored latitude.
        latitude: f64,
        /// Stored longitude.
        longitude: f64,
    },
}

/// Errors raised when validating a [`ReportSubmission`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmissionError {
    /// No coordinate was provided.
    #[error("a location is required: enter an address or place a marker on the map")]
    MissingLocation,

    /// The coordinate is not finite or outside the WGS84 range.
    #[error("invalid location ({latitude}, {longitude})")]
    InvalidLocation {
        /// Submitted latitude.
        latitude: f64,
        /// Submitted longitude.
        longitude: f64,
    },

    /// No nuisance type was selected.
    #[error("select at least one nuisance type")]
    MissingNuisanceType,
}

/// Input accepted at the submission boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSubmission {
    /// Display name; blank means anonymous.
    #[serde(default)]
    pub submitter_name: Option<String>,
    /// Latitude (WGS84), if a location has been chosen.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude (WGS84), if a location has been chosen.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Free-text address; blank means the location was placed by hand.
    #[serde(default)]
    pub address: Option<String>,
    /// Selected nuisance types, primary first.
    #[serde(default)]
    pub nuisance_types: Vec<NuisanceType>,
    /// How often the nuisance is experienced.
    pub frequency: Frequency,
    /// Optional free-text comment.
    #[serde(default)]
    pub comment: Option<String>,
}

impl ReportSubmission {
    /// Validates the submission and creates a report with a fresh id.
    ///
    /// # Errors
    ///
    /// See [`Self::into_report_with_id`].
    pub fn into_report(self) -> Result<NuisanceReport, SubmissionError> {
        self.into_report_with_id(Uuid::new_v4())
    }

    /// Validates the submission and creates a report with the given id.
    ///
    /// Blank names become [`ANONYMOUS_SUBMITTER`], blank addresses become
    /// [`MANUAL_LOCATION`], repeated types are collapsed and a blank
    /// comment is dropped.
    ///
    /// # Errors
    ///
    /// * [`SubmissionError::MissingLocation`] if either coordinate is absent.
    /// * [`SubmissionError::InvalidLocation`] if a coordinate is out of range.
    /// * [`SubmissionError::MissingNuisanceType`] if no type is selected.
    pub fn into_report_with_id(self, id: Uuid) -> Result<NuisanceReport, SubmissionError> {
        let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) else {
            return Err(SubmissionError::MissingLocation);
        };
        if !is_valid_location(latitude, longitude) {
            return Err(SubmissionError::InvalidLocation {
                latitude,
                longitude,
            });
        }

        let nuisance_types = NuisanceTypes::collapsing(self.nuisance_types)
            .map_err(|_| SubmissionError::MissingNuisanceType)?;

        let submitter_name = non_blank(self.submitter_name)
            .unwrap_or_else(|| ANONYMOUS_SUBMITTER.to_string());
        let address = non_blank(self.address).unwrap_or_else(|| MANUAL_LOCATION.to_string());

        Ok(NuisanceReport {
            id,
            submitter_name,
            latitude,
            longitude,
            address,
            nuisance_types,
            frequency: self.frequency,
            comment: self.comment.filter(|c| !c.trim().is_empty()),
        })
    }
}

/// Raw fields of a stored report, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportParts {
    /// Stored id.
    pub id: Uuid,
    /// Stored submitter name.
    pub submitter_name: String,
    /// Stored latitude.
    pub latitude: f64,
    /// Stored longitude.
    pub longitude: f64,
    /// Stored address.
    pub address: String,
    /// Stored types, already decoded.
    pub nuisance_types: NuisanceTypes,
    /// Stored frequency.
    pub frequency: Frequency,
    /// Stored comment, `None` or empty when absent.
    pub comment: Option<String>,
}

/// One submitted nuisance observation.
///
/// Immutable once created: fields are only readable through accessors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NuisanceReport {
    id: Uuid,
    submitter_name: String,
    latitude: f64,
    longitude: f64,
    address: String,
    nuisance_types: NuisanceTypes,
    frequency: Frequency,
    comment: Option<String>,
}

impl NuisanceReport {
    /// Rebuilds a report from stored parts.
    ///
    /// An empty comment is normalised to `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if the name is blank or the location is
    /// invalid.
    pub fn from_parts(parts: ReportParts) -> Result<Self, ReportError> {
        if parts.submitter_name.trim().is_empty() {
            return Err(ReportError::EmptySubmitterName);
        }
        if !is_valid_location(parts.latitude, parts.longitude) {
            return Err(ReportError::InvalidLocation {
                latitude: parts.latitude,
                longitude: parts.longitude,
            });
        }

        Ok(Self {
            id: parts.id,
            submitter_name: parts.submitter_name,
            latitude: parts.latitude,
            longitude: parts.longitude,
            address: parts.address,
            nuisance_types: parts.nuisance_types,
            frequency: parts.frequency,
            comment: parts.comment.filter(|c| !c.is_empty()),
        })
    }

    /// Unique id.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Display name of the submitter.
    #[must_use]
    pub fn submitter_name(&self) -> &str {
        &self.submitter_name
    }

    /// Latitude (WGS84).
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude (WGS84).
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Advisory address text.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Nuisance types, primary first.
    #[must_use]
    pub const fn nuisance_types(&self) -> &NuisanceTypes {
        &self.nuisance_types
    }

    /// Frequency.
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Comment, if any.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

fn is_valid_location(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
