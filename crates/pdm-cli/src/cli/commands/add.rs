//! `pdm add <url>` – register a download, optionally queueing it in the same step.

use anyhow::{Context, Result};
use pdm_core::control::ControlRequest;
use std::path::Path;

use crate::cli::control_socket::request;

pub async fn run_add(
    socket: &Path,
    url: &str,
    profile: Option<&str>,
    option: Option<&str>,
    destination: Option<&str>,
) -> Result<()> {
    let created = request(socket, &ControlRequest::Create { url: url.to_string() }).await?;
    let id = created
        .id
        .context("service did not return an id for the new download")?;
    println!("Added download {id}");

    if let Some(name) = destination {
        request(
            socket,
            &ControlRequest::ChangeDestination {
                id,
                destination: Some(name.to_string()),
            },
        )
        .await?;
        println!("Files will be moved to '{name}'");
    }

    match profile {
        Some(profile) => {
            request(
                socket,
                &ControlRequest::Start {
                    id,
                    profile: profile.to_string(),
                    option: option.map(str::to_string),
                },
            )
            .await?;
            println!("Queued with profile '{profile}'");
        }
        None => println!("Choose a profile with: pdm start {id} --profile <NAME>"),
    }
    Ok(())
}
