//! `pdm destination <id> [NAME]` – set or clear where finished files go.

use anyhow::Result;
use pdm_core::control::ControlRequest;
use pdm_core::JobId;
use std::path::Path;

use crate::cli::control_socket::request;

pub async fn run_destination(socket: &Path, id: JobId, name: Option<&str>) -> Result<()> {
    let response = request(
        socket,
        &ControlRequest::ChangeDestination {
            id,
            destination: name.map(str::to_string),
        },
    )
    .await?;
    if let Some(message) = response.message {
        println!("{message}");
    }
    Ok(())
}
