//! `pdm status` – list all downloads.

use anyhow::Result;
use pdm_core::control::ControlRequest;
use pdm_core::JobSnapshot;
use std::path::Path;

use crate::cli::control_socket::request;

pub(crate) fn progress_column(job: &JobSnapshot) -> String {
    let mut out = if job.percent > 0.0 {
        format!("{:.1}%", job.percent)
    } else {
        "-".to_string()
    };
    if job.playlist_total > 0 {
        out.push_str(&format!(" [{}/{}]", job.playlist_current, job.playlist_total));
    }
    out
}

pub async fn run_status(socket: &Path) -> Result<()> {
    let jobs = request(socket, &ControlRequest::List)
        .await?
        .jobs
        .unwrap_or_default();
    if jobs.is_empty() {
        println!("No downloads.");
        return Ok(());
    }
    println!(
        "{:<5} {:<20} {:<14} {:<8} {}",
        "ID", "STATE", "PROGRESS", "ETA", "URL"
    );
    for job in jobs {
        println!(
            "{:<5} {:<20} {:<14} {:<8} {}",
            job.id,
            job.display_state,
            progress_column(&job),
            if job.eta.is_empty() { "-" } else { job.eta.as_str() },
            job.url
        );
    }
    Ok(())
}
