//! Control socket: server (during `pdm serve`) and client (every other command).
//! Protocol: one JSON request per line, answered by one JSON response line.

use anyhow::{anyhow, bail, Context, Result};
use pdm_core::control::{self, ControlRequest, ControlResponse};
use pdm_core::Manager;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;

/// Binds `path` (replacing a stale socket) and serves requests against `manager`
/// until the returned task is aborted.
pub fn spawn_control_listener(manager: Arc<Manager>, path: impl AsRef<Path>) -> Result<JoinHandle<()>> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create socket dir {}", dir.display()))?;
    }
    let _ = std::fs::remove_file(path);
    let listener = UnixListener::bind(path)
        .with_context(|| format!("bind control socket {}", path.display()))?;
    tracing::info!(path = %path.display(), "control socket listening");

    Ok(tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    tokio::spawn(serve_connection(Arc::clone(&manager), stream));
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    }))
}

async fn serve_connection(manager: Arc<Manager>, stream: UnixStream) {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut reply = control::handle_line(&manager, line);
        reply.push('\n');
        if let Err(e) = write.write_all(reply.as_bytes()).await {
            tracing::debug!("control socket write: {}", e);
            break;
        }
    }
}

/// Sends one request and waits for its response.
pub async fn send_request(socket_path: &Path, request: &ControlRequest) -> Result<ControlResponse> {
    let stream = UnixStream::connect(socket_path).await.with_context(|| {
        format!(
            "connect to {} (is `pdm serve` running?)",
            socket_path.display()
        )
    })?;
    let (read, mut write) = stream.into_split();

    let mut line = serde_json::to_string(request)?;
    line.push('\n');
    write.write_all(line.as_bytes()).await?;

    let reply = BufReader::new(read)
        .lines()
        .next_line()
        .await?
        .ok_or_else(|| anyhow!("service closed the connection without replying"))?;
    Ok(serde_json::from_str(&reply)?)
}

/// Like [`send_request`], but a failed response becomes an error.
pub async fn request(socket_path: &Path, request: &ControlRequest) -> Result<ControlResponse> {
    let response = send_request(socket_path, request).await?;
    if !response.success {
        bail!(
            "{}",
            response
                .error
                .unwrap_or_else(|| "request failed".to_string())
        );
    }
    Ok(response)
}
