//! `pdm stop <id>` – kill a running download. The service marks it failed.

use anyhow::Result;
use pdm_core::control::ControlRequest;
use pdm_core::JobId;
use std::path::Path;

use crate::cli::control_socket::request;

pub async fn run_stop(socket: &Path, id: JobId) -> Result<()> {
    request(socket, &ControlRequest::Stop { id }).await?;
    println!("Stopping download {id}");
    Ok(())
}
