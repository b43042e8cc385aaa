//! `pdm profiles` – list the names accepted by `start`, `add` and `destination`.

use anyhow::Result;
use pdm_core::control::ControlRequest;
use std::path::Path;

use crate::cli::control_socket::request;

fn print_section(title: &str, names: &[String]) {
    println!("{title}:");
    if names.is_empty() {
        println!("  (none)");
    }
    for name in names {
        println!("  {name}");
    }
}

pub async fn run_profiles(socket: &Path) -> Result<()> {
    let catalog = request(socket, &ControlRequest::Profiles)
        .await?
        .catalog
        .unwrap_or_default();
    print_section("Profiles", &catalog.profiles);
    print_section("Download options", &catalog.options);
    print_section("Destinations", &catalog.destinations);
    Ok(())
}
