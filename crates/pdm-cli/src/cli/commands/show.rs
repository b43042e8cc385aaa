//! `pdm show <id>` – details and output log of one download.

use anyhow::{Context, Result};
use pdm_core::control::ControlRequest;
use pdm_core::JobId;
use std::path::Path;

use super::status::progress_column;
use crate::cli::control_socket::request;

pub async fn run_show(socket: &Path, id: JobId) -> Result<()> {
    let response = request(socket, &ControlRequest::Get { id }).await?;
    let job = response.job.context("service returned no download")?;

    println!("Download {}", job.id);
    println!("  url:         {}", job.url);
    println!("  domain:      {}", job.domain);
    println!("  state:       {}", job.display_state);
    match &job.profile {
        Some(p) => println!("  profile:     {} ({} {})", p.name, p.command, p.args.join(" ")),
        None => println!("  profile:     -"),
    }
    match &job.option {
        Some(o) => println!("  option:      {} ({})", o.name, o.args.join(" ")),
        None => println!("  option:      -"),
    }
    match &job.destination {
        Some(d) => println!("  destination: {} ({})", d.name, d.path.display()),
        None => println!("  destination: -"),
    }
    println!("  progress:    {}", progress_column(&job));
    if !job.eta.is_empty() {
        println!("  eta:         {}", job.eta);
    }
    if let Some(code) = job.exit_code {
        println!("  exit code:   {code}");
    }
    if let Some(at) = job.finished_at {
        println!("  finished:    {}", at.to_rfc3339());
    }
    if job.running && response.can_stop == Some(true) {
        println!("  (running; stop with: pdm stop {})", job.id);
    }
    if !job.files.is_empty() {
        println!("Files:");
        for file in &job.files {
            println!("  {file}");
        }
    }
    println!("Log:");
    for line in &job.log {
        println!("  {line}");
    }
    Ok(())
}
