//! Report operations shared by the subcommands and the interactive mode.

use std::sync::Arc;

use nuisance_map_analytics_models::{QueryFilter, UnknownLabelError, ViewResult, parse_label_list};
use nuisance_map_cli_utils::{MultiProgress, Spinner};
use nuisance_map_geocoder::{GeocodeError, GeocodeOutcome, GeocodedAddress, Geocoder, NominatimGeocoder};
use nuisance_map_nuisance_models::{Frequency, NuisanceReport, NuisanceType, ReportSubmission};
use nuisance_map_store::config::{ConfigError, StoreConfig};
use nuisance_map_store::{RepositoryError, ReportRepository, SubmitError};
use thiserror::Error;

/// Errors surfaced to the command line.
#[derive(Debug, Error)]
pub enum CliError {
    /// Store configuration is invalid.
    #[error("Store configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The geocoder could not be set up.
    #[error("Geocoder error: {0}")]
    Geocoder(#[from] GeocodeError),

    /// A type or frequency label is unknown.
    #[error(transparent)]
    UnknownLabel(#[from] UnknownLabelError),

    /// The address given in place of a location did not resolve.
    #[error("GeocodeNotFound: no match for '{address}', pass --lat and --lon instead")]
    GeocodeNotFound {
        /// The address that was looked up.
        address: String,
    },

    /// More than one frequency was given for a single report.
    #[error("a report has exactly one frequency, got '{value}'")]
    MultipleFrequencies {
        /// The frequency argument as given.
        value: String,
    },

    /// The submission was rejected or could not be stored.
    #[error("{}: {}", .0.kind(), .0)]
    Submit(#[from] SubmitError),

    /// The collection could not be loaded.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Raw `submit` arguments, before label parsing and geocoding.
#[derive(Debug, Clone, Default)]
pub struct SubmitArgs {
    /// Latitude, if known.
    pub latitude: Option<f64>,
    /// Longitude, if known.
    pub longitude: Option<f64>,
    /// Free-text address, geocoded when no coordinate is given.
    pub address: Option<String>,
    /// Submitter name.
    pub name: Option<String>,
    /// Comma-separated nuisance types, primary first.
    pub types: String,
    /// Frequency label.
    pub frequency: String,
    /// Optional comment.
    pub comment: Option<String>,
}

/// Handles shared by every command.
pub struct Context {
    /// Report collection.
    pub repository: ReportRepository,
    /// Address lookup.
    pub geocoder: Arc<dyn Geocoder>,
    /// Spinner host.
    pub multi: MultiProgress,
}

impl Context {
    /// Builds the context from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] if the store configuration is invalid or the
    /// geocoder cannot be built.
    pub fn from_env(multi: MultiProgress) -> Result<Self, CliError> {
        let repository = StoreConfig::from_env()?.repository();
        log::debug!("Reports stored under '{}'", repository.key());

        Ok(Self {
            repository,
            geocoder: Arc::new(NominatimGeocoder::from_env()?),
            multi,
        })
    }

    /// Looks up `address` behind a spinner.
    pub async fn geocode(&self, address: &str) -> GeocodeOutcome {
        let spinner = Spinner::start(&self.multi, &format!("Looking up '{address}'..."));
        let outcome = self.geocoder.geocode(address).await;
        spinner.finish_and_clear();
        outcome
    }

    /// Validates and stores a submission behind a spinner.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Submit`] if validation or the append fails.
    pub async fn submit(&self, submission: ReportSubmission) -> Result<NuisanceReport, CliError> {
        let spinner = Spinner::start(&self.multi, "Saving report...");
        let result = self.repository.submit(submission).await;
        spinner.finish_and_clear();
        Ok(result?)
    }

    /// Loads the collection and builds the view for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Repository`] if the collection cannot be loaded.
    pub async fn view(&self, query: &QueryFilter) -> Result<ViewResult, CliError> {
        let spinner = Spinner::start(&self.multi, "Loading reports...");
        let result = self.repository.load_all().await;
        spinner.finish_and_clear();
        Ok(nuisance_map_analytics::view(&result?, query))
    }
}

/// Runs the `submit` subcommand.
///
/// # Errors
///
/// Returns [`CliError`] for unknown labels, an address that does not
/// geocode, or a failed submission.
pub async fn submit(ctx: &Context, args: SubmitArgs) -> Result<NuisanceReport, CliError> {
    let nuisance_types = parse_label_list::<NuisanceType>(&args.types)?;
    let frequency = parse_frequency(&args.frequency)?;

    let geocoded = match (&args.latitude, &args.longitude, non_blank(args.address.as_deref())) {
        (Some(_), Some(_), _) | (_, _, None) => None,
        (_, _, Some(address)) => match ctx.geocode(address).await {
            GeocodeOutcome::Found(found) => Some(found),
            GeocodeOutcome::NotFound => {
                return Err(CliError::GeocodeNotFound {
                    address: address.to_string(),
                });
            }
        },
    };

    let submission = build_submission(args, nuisance_types, frequency, geocoded.as_ref());
    ctx.submit(submission).await
}

/// Parses exactly one frequency label.
///
/// # Errors
///
/// Returns [`CliError::UnknownLabel`] for an unknown or blank label and
/// [`CliError::MultipleFrequencies`] when more than one label is given.
pub fn parse_frequency(value: &str) -> Result<Frequency, CliError> {
    match parse_label_list::<Frequency>(value)?.as_slice() {
        [frequency] => Ok(*frequency),
        [] => Err(UnknownLabelError {
            value: value.to_string(),
        }
        .into()),
        _ => Err(CliError::MultipleFrequencies {
            value: value.to_string(),
        }),
    }
}

/// Assembles a submission, taking the coordinate from `geocoded` when
/// present.
#[must_use]
pub fn build_submission(
    args: SubmitArgs,
    nuisance_types: Vec<NuisanceType>,
    frequency: Frequency,
    geocoded: Option<&GeocodedAddress>,
) -> ReportSubmission {
    let (latitude, longitude) = geocoded.map_or((args.latitude, args.longitude), |g| {
        (Some(g.latitude), Some(g.longitude))
    });

    ReportSubmission {
        submitter_name: args.name,
        latitude,
        longitude,
        address: args.address,
        nuisance_types,
        frequency,
        comment: args.comment,
    }
}

/// Prints the marker list and the histogram table.
pub fn print_view(view: &ViewResult) {
    println!(
        "{} of {} reports match (map center {:.5}, {:.5})",
        view.matching_reports, view.total_reports, view.center.latitude, view.center.longitude
    );
    println!();

    println!("{:<10} {:<22} POPUP", "COLOR", "LOCATION");
    println!("{}", "-".repeat(70));
    for marker in &view.markers {
        let location = format!(
            "{:.5}, {:.5}",
            marker.coordinate.latitude, marker.coordinate.longitude
        );
        println!(
            "{:<10} {location:<22} {}",
            marker.color,
            marker.popup_text.replace('\n', " | ")
        );
    }
    println!();

    println!("{:<16} {:<10} COUNT", "TYPE", "FREQUENCY");
    println!("{}", "-".repeat(34));
    for row in &view.histogram {
        println!(
            "{:<16} {:<10} {}",
            row.nuisance_type.as_ref(),
            row.frequency.as_ref(),
            row.count
        );
    }
}

/// Prints a geocoding outcome.
pub fn print_geocode(address: &str, outcome: &GeocodeOutcome) {
    match outcome {
        GeocodeOutcome::Found(found) => println!(
            "{:.6}, {:.6}  {}",
            found.latitude,
            found.longitude,
            found.matched_address.as_deref().unwrap_or(address)
        ),
        GeocodeOutcome::NotFound => println!("'{address}': not found"),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
