//! A single download job: identity, lifecycle state and everything learned
//! from the downloader's output.
//!
//! The mutable part of a job lives behind one mutex ([`Job::lock`]). The
//! guard is never held across an `.await`, and no code path holds two jobs'
//! guards at once.

mod domain;
mod id;
mod state;

#[cfg(test)]
mod tests;

pub use domain::{domain_of, UNKNOWN_DOMAIN};
pub use id::IdSequence;
pub use state::JobState;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;

use crate::config::{Destination, DownloadOption, DownloadProfile};
use crate::control::CAN_STOP_DOWNLOAD;
use crate::error::JobError;

pub type JobId = u64;

/// Line appended to a job's log when a stop request kills its process.
pub const ABORTED_LINE: &str = "aborted by user";

/// Handle on a running downloader process. Present only while it runs.
#[derive(Debug, Clone)]
pub(crate) struct ProcessHandle {
    pub pid: Option<u32>,
    kill: Arc<Notify>,
}

impl ProcessHandle {
    pub fn new(pid: Option<u32>, kill: Arc<Notify>) -> Self {
        Self { pid, kill }
    }

    fn request_kill(&self) {
        self.kill.notify_one();
    }
}

/// Mutable job fields. Obtain through [`Job::lock`].
#[derive(Debug, Default)]
pub struct JobData {
    pub profile: Option<DownloadProfile>,
    pub option: Option<DownloadOption>,
    pub destination: Option<Destination>,
    state: JobState,
    /// Short note shown instead of the state label while set.
    pub activity: Option<String>,
    pub(crate) process: Option<ProcessHandle>,
    pub exit_code: Option<i32>,
    pub finished: bool,
    pub finished_at: Option<DateTime<Utc>>,
    /// Output files in the order the downloader reported them.
    pub files: Vec<String>,
    pub playlist_current: u32,
    pub playlist_total: u32,
    pub eta: String,
    pub percent: f32,
    pub log: Vec<String>,
}

impl JobData {
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Take one lifecycle edge. On a disallowed edge the state is unchanged
    /// and the current state is returned.
    pub(crate) fn advance(&mut self, to: JobState) -> Result<(), JobState> {
        if !self.state.can_transition_to(to) {
            return Err(self.state);
        }
        self.state = to;
        Ok(())
    }

    /// Enter a terminal state and stamp the finish time.
    pub(crate) fn finish(&mut self, to: JobState) {
        if let Err(from) = self.advance(to) {
            tracing::warn!("ignoring finish from {from} to {to}");
            return;
        }
        self.activity = None;
        self.finished = true;
        self.finished_at = Some(Utc::now());
    }

    pub(crate) fn mark_downloading(&mut self) {
        if self.state == JobState::Preparing {
            let _ = self.advance(JobState::Downloading);
        }
        self.activity = None;
    }

    pub fn append_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    /// Drop the first recorded file equal to `name`.
    pub(crate) fn remove_file(&mut self, name: &str) {
        if let Some(pos) = self.files.iter().position(|f| f == name) {
            self.files.remove(pos);
        }
    }

    pub fn is_running(&self) -> bool {
        self.process.is_some()
    }

    /// Label for listings: the activity note if any, else the state label.
    pub fn display_state(&self) -> String {
        match &self.activity {
            Some(activity) => activity.clone(),
            None => self.state.label().to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn in_state(state: JobState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
pub struct Job {
    id: JobId,
    url: String,
    domain: String,
    data: Mutex<JobData>,
}

impl Job {
    pub fn new(id: JobId, url: impl Into<String>) -> Self {
        let url = url.into();
        let domain = domain_of(&url);
        Self {
            id,
            url,
            domain,
            data: Mutex::new(JobData::default()),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn lock(&self) -> MutexGuard<'_, JobData> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> JobState {
        self.lock().state
    }

    pub(crate) fn transition(&self, data: &mut JobData, to: JobState) -> Result<(), JobError> {
        data.advance(to).map_err(|from| JobError::InvalidTransition {
            id: self.id,
            from,
            to,
        })
    }

    /// Ask the running downloader process to terminate. The pipeline then
    /// logs the abort and records the job as failed. A request that lands
    /// after the process already exited has no effect on the outcome.
    pub fn stop(&self) -> Result<(), JobError> {
        self.stop_if_supported(CAN_STOP_DOWNLOAD)
    }

    pub(crate) fn stop_if_supported(&self, supported: bool) -> Result<(), JobError> {
        if !supported {
            return Err(JobError::StopUnsupported);
        }
        let handle = self
            .lock()
            .process
            .clone()
            .ok_or(JobError::NotRunning(self.id))?;
        handle.request_kill();
        tracing::info!(job_id = self.id, pid = ?handle.pid, "stop requested");
        Ok(())
    }

    /// Finished long enough ago to be dropped from the registry.
    pub(crate) fn expired(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        let data = self.lock();
        match data.finished_at {
            Some(at) if data.finished => now
                .signed_duration_since(at)
                .to_std()
                .map(|age| age > retention)
                .unwrap_or(false),
            _ => false,
        }
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let data = self.lock();
        JobSnapshot {
            id: self.id,
            url: self.url.clone(),
            domain: self.domain.clone(),
            state: data.state,
            display_state: data.display_state(),
            profile: data.profile.clone(),
            option: data.option.clone(),
            destination: data.destination.clone(),
            running: data.is_running(),
            exit_code: data.exit_code,
            finished: data.finished,
            finished_at: data.finished_at,
            files: data.files.clone(),
            playlist_current: data.playlist_current,
            playlist_total: data.playlist_total,
            eta: data.eta.clone(),
            percent: data.percent,
            log: data.log.clone(),
        }
    }
}

/// Point-in-time copy of a job for display and the control protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub url: String,
    pub domain: String,
    pub state: JobState,
    pub display_state: String,
    pub profile: Option<DownloadProfile>,
    pub option: Option<DownloadOption>,
    pub destination: Option<Destination>,
    pub running: bool,
    pub exit_code: Option<i32>,
    pub finished: bool,
    pub finished_at: Option<DateTime<Utc>>,
    pub files: Vec<String>,
    pub playlist_current: u32,
    pub playlist_total: u32,
    pub eta: String,
    pub percent: f32,
    pub log: Vec<String>,
}
