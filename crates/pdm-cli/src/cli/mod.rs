//! CLI for the PDM download manager.
//!
//! `pdm serve` runs the manager; every other command is a client that talks
//! to it over the control socket.

mod commands;
mod control_socket;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pdm_core::control;
use pdm_core::JobId;
use std::path::PathBuf;

use commands::{
    run_add, run_destination, run_profiles, run_serve, run_show, run_start, run_status, run_stop,
};

/// Top-level CLI for the PDM download manager.
#[derive(Debug, Parser)]
#[command(name = "pdm")]
#[command(about = "PDM: queue and run downloads through an external downloader", long_about = None)]
pub struct Cli {
    /// Control socket of the running service (default: ~/.local/state/pdm/control.sock).
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the download service in the foreground until Ctrl-C.
    Serve {
        /// Config file to use instead of ~/.config/pdm/config.toml.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Add a download. With --profile it is queued right away.
    Add {
        /// Page or media URL handed to the downloader.
        url: String,
        /// Profile to download with.
        #[arg(long)]
        profile: Option<String>,
        /// Extra download option (requires --profile).
        #[arg(long, requires = "profile")]
        option: Option<String>,
        /// Destination to move finished files to.
        #[arg(long)]
        destination: Option<String>,
    },

    /// Pick a profile for a waiting download and queue it.
    Start {
        /// Download identifier.
        id: JobId,
        #[arg(long)]
        profile: String,
        #[arg(long)]
        option: Option<String>,
    },

    /// List all downloads.
    Status,

    /// Show one download, including its output log.
    Show {
        /// Download identifier.
        id: JobId,
    },

    /// Stop a running download. It is marked failed.
    Stop {
        /// Download identifier.
        id: JobId,
    },

    /// Set where a download's files go when it finishes. Omit NAME to clear.
    Destination {
        /// Download identifier.
        id: JobId,
        /// Destination name from the config.
        name: Option<String>,
    },

    /// List configured profiles, download options and destinations.
    Profiles,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let socket = match cli.socket {
            Some(path) => path,
            None => control::default_control_socket_path()?,
        };
        tracing::debug!(socket = %socket.display(), "dispatching {:?}", cli.command);

        match cli.command {
            CliCommand::Serve { config } => run_serve(config.as_deref(), &socket).await?,
            CliCommand::Add {
                url,
                profile,
                option,
                destination,
            } => {
                run_add(
                    &socket,
                    &url,
                    profile.as_deref(),
                    option.as_deref(),
                    destination.as_deref(),
                )
                .await?
            }
            CliCommand::Start {
                id,
                profile,
                option,
            } => run_start(&socket, id, &profile, option.as_deref()).await?,
            CliCommand::Status => run_status(&socket).await?,
            CliCommand::Show { id } => run_show(&socket, id).await?,
            CliCommand::Stop { id } => run_stop(&socket, id).await?,
            CliCommand::Destination { id, name } => {
                run_destination(&socket, id, name.as_deref()).await?
            }
            CliCommand::Profiles => run_profiles(&socket).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
