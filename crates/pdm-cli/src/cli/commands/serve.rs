//! `pdm serve` – run the manager loop and the control socket until Ctrl-C.

use anyhow::{Context, Result};
use pdm_core::config;
use pdm_core::control::CAN_STOP_DOWNLOAD;
use pdm_core::pipeline::PathResolver;
use pdm_core::Manager;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

use crate::cli::control_socket;

pub async fn run_serve(config_path: Option<&Path>, socket: &Path) -> Result<()> {
    let cfg = match config_path {
        Some(path) => config::load_from_path(path)?,
        None => config::load_or_init()?,
    };
    let download_path = &cfg.server.download_path;
    std::fs::create_dir_all(download_path)
        .with_context(|| format!("create download path {}", download_path.display()))?;
    cfg.validate(&PathResolver::new())
        .context("invalid configuration")?;
    tracing::debug!("loaded config: {:?}", cfg);
    if !CAN_STOP_DOWNLOAD {
        tracing::warn!("this platform cannot stop running downloads");
    }

    let manager = Arc::new(Manager::new(Arc::new(cfg)));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runner = tokio::spawn(Arc::clone(&manager).run(shutdown_rx));
    let listener = control_socket::spawn_control_listener(Arc::clone(&manager), socket)?;

    println!("pdm serving on {}", socket.display());
    tokio::signal::ctrl_c()
        .await
        .context("wait for Ctrl-C")?;

    tracing::info!("shutdown requested");
    listener.abort();
    let _ = shutdown_tx.send(true);
    runner.await.context("manager task")?;
    let _ = std::fs::remove_file(socket);
    print!("{}", manager.summary());
    Ok(())
}
