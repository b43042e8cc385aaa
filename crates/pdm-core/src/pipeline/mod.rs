//! Runs one job's downloader process to completion.
//!
//! Flow: resolve the command and build args, spawn with piped output, pump
//! stdout and stderr through the extractor on two tasks, wait for exit (or a
//! stop request), then record the result on the job.

mod args;
mod resolve;

pub use args::{
    build_args, is_sentinel_domain, sanitize_component, Substitutions, HOST_PLACEHOLDER,
    PATH_PLACEHOLDER, SENTINEL_DOMAIN,
};
pub use resolve::{ExecutableResolver, PathResolver, ResolveError};

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::Notify;

use crate::extract::{self, LineSplitter};
use crate::job::{Job, JobState, ProcessHandle, ABORTED_LINE};

const READ_CHUNK: usize = 1024;

/// Why a job never got a running process. The message lands in the job log.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("download has no profile")]
    NoProfile,
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("error starting command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("error setting up {0} pipe")]
    Pipe(&'static str),
    #[error("job is {0}, not ready to start")]
    NotPrepared(JobState),
}

struct Running {
    child: Child,
    stdout: ChildStdout,
    stderr: ChildStderr,
    kill: Arc<Notify>,
}

/// Drive `job` from Preparing to Complete or Failed.
pub async fn run(job: Arc<Job>, download_dir: &Path, resolver: &dyn ExecutableResolver) {
    let Running {
        mut child,
        stdout,
        stderr,
        kill,
    } = match spawn(&job, download_dir, resolver) {
        Ok(running) => running,
        Err(e) => {
            tracing::warn!(job_id = job.id(), "download did not start: {e}");
            let mut data = job.lock();
            data.append_log(e.to_string());
            data.finish(JobState::Failed);
            return;
        }
    };

    let out_task = tokio::spawn(pump(Arc::clone(&job), stdout, "stdout"));
    let err_task = tokio::spawn(pump(Arc::clone(&job), stderr, "stderr"));

    let (status, killed) = wait_or_kill(&job, &mut child, &kill).await;
    for task in [out_task, err_task] {
        if let Err(e) = task.await {
            tracing::warn!(job_id = job.id(), "output reader panicked: {e}");
        }
    }

    record_exit(&job, status, killed);
}

fn spawn(
    job: &Job,
    download_dir: &Path,
    resolver: &dyn ExecutableResolver,
) -> Result<Running, PipelineError> {
    let mut data = job.lock();
    if data.state() != JobState::Preparing {
        return Err(PipelineError::NotPrepared(data.state()));
    }
    let profile = data.profile.clone().ok_or(PipelineError::NoProfile)?;
    let program = resolver.resolve(&profile.command)?;
    let args = build_args(&profile, data.option.as_ref(), job.url(), job.domain());

    tracing::info!(
        job_id = job.id(),
        program = %program.display(),
        ?args,
        dir = %download_dir.display(),
        "starting download"
    );

    let mut child = Command::new(&program)
        .args(&args)
        .current_dir(download_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| PipelineError::Spawn {
            command: profile.command.clone(),
            source,
        })?;

    let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
        (Some(out), Some(err)) => (out, err),
        (out, _) => {
            let _ = child.start_kill();
            return Err(PipelineError::Pipe(if out.is_none() { "stdout" } else { "stderr" }));
        }
    };

    let kill = Arc::new(Notify::new());
    data.process = Some(ProcessHandle::new(child.id(), Arc::clone(&kill)));
    data.mark_downloading();

    Ok(Running {
        child,
        stdout,
        stderr,
        kill,
    })
}

async fn pump<R>(job: Arc<Job>, mut reader: R, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_CHUNK];
    let mut splitter = LineSplitter::new();
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                for line in splitter.push(&buf[..n]) {
                    extract::ingest_line(&mut job.lock(), &line);
                }
            }
            Err(e) => {
                tracing::warn!(job_id = job.id(), stream, "read failed: {e}");
                break;
            }
        }
    }
    if let Some(line) = splitter.finish() {
        extract::ingest_line(&mut job.lock(), &line);
    }
}

/// Wait for the child to exit. The flag is true when a stop request killed it.
async fn wait_or_kill(
    job: &Job,
    child: &mut Child,
    kill: &Notify,
) -> (std::io::Result<ExitStatus>, bool) {
    tokio::select! {
        status = child.wait() => return (status, false),
        _ = kill.notified() => {}
    }
    tracing::info!(job_id = job.id(), "killing downloader");
    if let Err(e) = child.start_kill() {
        tracing::debug!(job_id = job.id(), "kill: {e}");
    }
    (child.wait().await, true)
}

fn record_exit(job: &Job, status: std::io::Result<ExitStatus>, killed: bool) {
    let mut data = job.lock();
    data.process = None;
    if killed {
        data.append_log(ABORTED_LINE);
    }
    match status {
        Ok(status) => {
            let code = status.code().unwrap_or(-1);
            data.exit_code = Some(code);
            let outcome = if code == 0 {
                JobState::Complete
            } else {
                JobState::Failed
            };
            data.finish(outcome);
            tracing::info!(job_id = job.id(), code, "download finished: {outcome}");
        }
        Err(e) => {
            data.append_log(format!("error waiting for command: {e}"));
            data.finish(JobState::Failed);
            tracing::warn!(job_id = job.id(), "wait failed: {e}");
        }
    }
}

#[cfg(all(test, unix))]
mod tests;
