#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the nuisance map.
//!
//! Each subcommand drives one boundary of the report store: `submit`
//! validates and appends a report, `view` prints the markers and histogram
//! for a filter, `geocode` looks up an address and `serve` starts the HTTP
//! API. Without a subcommand the user picks a tool interactively.
//!
//! Uses `indicatif-log-bridge` (via [`nuisance_map_cli_utils::init_logger`])
//! so that log lines and spinners never fight for the terminal.

mod commands;
mod interactive;

use clap::{Parser, Subcommand};
use nuisance_map_analytics_models::QueryFilter;
use nuisance_map_geocoder::GeocodeOutcome;

use crate::commands::{Context, SubmitArgs};

#[derive(Parser)]
#[command(name = "nuisance_map", about = "Nuisance report map toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a nuisance report
    Submit {
        /// Latitude of the nuisance
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Longitude of the nuisance
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
        /// Street address. Geocoded when `--lat`/`--lon` are omitted.
        #[arg(long)]
        address: Option<String>,
        /// Submitter name (blank for anonymous)
        #[arg(long)]
        name: Option<String>,
        /// Comma-separated nuisance types, primary first (e.g. "Noise,Odor")
        #[arg(long)]
        types: String,
        /// How often the nuisance occurs (Daily, Weekly, Monthly, Yearly)
        #[arg(long)]
        frequency: String,
        /// Free-text comment
        #[arg(long)]
        comment: Option<String>,
    },
    /// Print map markers and the histogram for a filter
    View {
        /// Comma-separated nuisance types to include (default: all)
        #[arg(long)]
        types: Option<String>,
        /// Comma-separated frequencies to include (default: all)
        #[arg(long)]
        frequencies: Option<String>,
    },
    /// Look up the coordinate of an address
    Geocode {
        /// Free-text address
        address: String,
    },
    /// Start the HTTP API server
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = nuisance_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(multi).await;
    };

    match command {
        Commands::Submit {
            lat,
            lon,
            address,
            name,
            types,
            frequency,
            comment,
        } => {
            let ctx = Context::from_env(multi)?;
            let args = SubmitArgs {
                latitude: lat,
                longitude: lon,
                address,
                name,
                types,
                frequency,
                comment,
            };
            let report = commands::submit(&ctx, args).await?;
            println!("Saved report {}", report.id());
        }
        Commands::View { types, frequencies } => {
            let query = QueryFilter::parse(types.as_deref(), frequencies.as_deref())?;
            let ctx = Context::from_env(multi)?;
            commands::print_view(&ctx.view(&query).await?);
        }
        Commands::Geocode { address } => {
            let ctx = Context::from_env(multi)?;
            let outcome = ctx.geocode(&address).await;
            commands::print_geocode(&address, &outcome);
            if outcome == GeocodeOutcome::NotFound {
                std::process::exit(1);
            }
        }
        Commands::Serve => serve().await?,
    }

    Ok(())
}

/// Runs the API server on its own actix system so it does not nest inside
/// the tokio runtime driving the CLI.
async fn serve() -> Result<(), Box<dyn std::error::Error>> {
    tokio::task::spawn_blocking(|| {
        actix_web::rt::System::new().block_on(nuisance_map_server::run_server())
    })
    .await??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn submit_parses_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "nuisance_map",
            "submit",
            "--lat",
            "43.65",
            "--lon",
            "-1.5",
            "--types",
            "Noise,Odor",
            "--frequency",
            "Weekly",
        ])
        .unwrap();
        let Some(Commands::Submit {
            lat, lon, types, ..
        }) = cli.command
        else {
            panic!("expected submit");
        };
        assert_eq!(lat, Some(43.65));
        assert_eq!(lon, Some(-1.5));
        assert_eq!(types, "Noise,Odor");
    }

    #[test]
    fn submit_requires_types_and_frequency() {
        assert!(Cli::try_parse_from(["nuisance_map", "submit", "--types", "Noise"]).is_err());
    }

    #[test]
    fn no_subcommand_is_interactive() {
        let cli = Cli::try_parse_from(["nuisance_map"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn view_filters_are_optional() {
        let cli = Cli::try_parse_from(["nuisance_map", "view", "--types", ""]).unwrap();
        let Some(Commands::View { types, frequencies }) = cli.command else {
            panic!("expected view");
        };
        assert_eq!(types.as_deref(), Some(""));
        assert!(frequencies.is_none());
    }
}
