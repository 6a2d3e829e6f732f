//! Interactive mode for the server.
//!
//! Prompts the user for bind address and port before starting the server.

use dialoguer::{Confirm, Input};

use crate::{AppState, DEFAULT_BIND_ADDR, DEFAULT_PORT, ServerError};

/// Runs the server in interactive mode, prompting for configuration.
///
/// Defaults come from `BIND_ADDR` and `PORT`; the store and geocoder are
/// configured from the environment as usual.
///
/// # Errors
///
/// Returns [`ServerError`] if the configuration is invalid or the server
/// fails to start.
#[allow(clippy::future_not_send)]
pub async fn run() -> Result<(), ServerError> {
    println!("Nuisance Map Server");
    println!();

    let (default_addr, default_port) = crate::bind_from_env();

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(default_addr)
        .interact_text()
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(default_port)
        .interact_text()
        .unwrap_or(DEFAULT_PORT);

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    crate::serve(AppState::from_env()?, &bind_addr, port).await
}
