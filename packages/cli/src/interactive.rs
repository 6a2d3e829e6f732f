//! Interactive mode: pick a tool, then answer prompts.

use dialoguer::{Confirm, Input, MultiSelect, Select};
use nuisance_map_analytics_models::QueryFilter;
use nuisance_map_cli_utils::MultiProgress;
use nuisance_map_geocoder::GeocodeOutcome;
use nuisance_map_nuisance_models::{Frequency, NuisanceType, ReportSubmission};

use crate::commands::{self, Context};

/// Top-level tool selection.
enum Tool {
    Submit,
    View,
    Geocode,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[Self::Submit, Self::View, Self::Geocode, Self::Server];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Submit => "Submit a report",
            Self::View => "View reports",
            Self::Geocode => "Look up an address",
            Self::Server => "Start server",
        }
    }
}

/// Prompts for a tool and runs it.
///
/// # Errors
///
/// Returns an error if a prompt fails, the environment configuration is
/// invalid, or the chosen operation fails.
pub async fn run(multi: MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Nuisance Map");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Submit => submit(&Context::from_env(multi)?).await?,
        Tool::View => view(&Context::from_env(multi)?).await?,
        Tool::Geocode => {
            let ctx = Context::from_env(multi)?;
            let address: String = Input::new().with_prompt("Address").interact_text()?;
            let outcome = ctx.geocode(&address).await;
            commands::print_geocode(&address, &outcome);
        }
        Tool::Server => {
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(nuisance_map_server::interactive::run())
            })
            .await??;
        }
    }

    Ok(())
}

async fn submit(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let name: String = Input::new()
        .with_prompt("Your name (blank for anonymous)")
        .allow_empty(true)
        .interact_text()?;

    let address: String = Input::new()
        .with_prompt("Address (blank to enter coordinates)")
        .allow_empty(true)
        .interact_text()?;

    let located = if address.trim().is_empty() {
        None
    } else {
        match ctx.geocode(&address).await {
            GeocodeOutcome::Found(found) => {
                println!("Found: {:.6}, {:.6}", found.latitude, found.longitude);
                Some((Some(address), found.latitude, found.longitude))
            }
            GeocodeOutcome::NotFound => {
                println!("Address not found, enter the coordinates instead.");
                None
            }
        }
    };

    let (address, latitude, longitude) = match located {
        Some(located) => located,
        None => {
            let latitude: f64 = Input::new().with_prompt("Latitude").interact_text()?;
            let longitude: f64 = Input::new().with_prompt("Longitude").interact_text()?;
            (None, latitude, longitude)
        }
    };

    let type_labels: Vec<&str> = NuisanceType::all().iter().map(AsRef::as_ref).collect();
    let picked = MultiSelect::new()
        .with_prompt("Nuisance types (space to select; the first selected is primary)")
        .items(&type_labels)
        .interact()?;
    let nuisance_types: Vec<NuisanceType> =
        picked.into_iter().map(|i| NuisanceType::all()[i]).collect();

    let frequency_labels: Vec<&str> = Frequency::all().iter().map(AsRef::as_ref).collect();
    let frequency_idx = Select::new()
        .with_prompt("How often?")
        .items(&frequency_labels)
        .default(0)
        .interact()?;

    let comment: String = Input::new()
        .with_prompt("Comment")
        .allow_empty(true)
        .interact_text()?;

    if !Confirm::new()
        .with_prompt("Submit this report?")
        .default(true)
        .interact()?
    {
        println!("Cancelled.");
        return Ok(());
    }

    let submission = ReportSubmission {
        submitter_name: Some(name),
        latitude: Some(latitude),
        longitude: Some(longitude),
        address,
        nuisance_types,
        frequency: Frequency::all()[frequency_idx],
        comment: Some(comment),
    };

    let report = ctx.submit(submission).await?;
    println!("Saved report {}", report.id());

    Ok(())
}

async fn view(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let type_labels: Vec<&str> = NuisanceType::all().iter().map(AsRef::as_ref).collect();
    let types = MultiSelect::new()
        .with_prompt("Nuisance types")
        .items(&type_labels)
        .defaults(&vec![true; type_labels.len()])
        .interact()?;

    let frequency_labels: Vec<&str> = Frequency::all().iter().map(AsRef::as_ref).collect();
    let frequencies = MultiSelect::new()
        .with_prompt("Frequencies")
        .items(&frequency_labels)
        .defaults(&vec![true; frequency_labels.len()])
        .interact()?;

    let query = QueryFilter::new(
        types.into_iter().map(|i| NuisanceType::all()[i]),
        frequencies.into_iter().map(|i| Frequency::all()[i]),
    );

    commands::print_view(&ctx.view(&query).await?);

    Ok(())
}
