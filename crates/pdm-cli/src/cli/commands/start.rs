//! `pdm start <id> --profile <name>` – choose a profile and queue a waiting download.

use anyhow::Result;
use pdm_core::control::ControlRequest;
use pdm_core::JobId;
use std::path::Path;

use crate::cli::control_socket::request;

pub async fn run_start(socket: &Path, id: JobId, profile: &str, option: Option<&str>) -> Result<()> {
    let response = request(
        socket,
        &ControlRequest::Start {
            id,
            profile: profile.to_string(),
            option: option.map(str::to_string),
        },
    )
    .await?;
    if let Some(message) = response.message {
        println!("{message}");
    }
    Ok(())
}
