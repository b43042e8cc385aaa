//! Job registry and scheduler.
//!
//! The manager owns every job. A pass (triggered by a one-second tick or a
//! wake-up) holds the registry lock while it admits queued jobs within the
//! per-domain limit, moves completed jobs to their destination, and drops
//! expired finished jobs. Admitted jobs run on a [`JoinSet`] owned by
//! [`Manager::run`].

mod admission;
mod mover;


pub use admission::DomainBudget;

use chrono::Utc;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use crate::config::PdmConfig;
use crate::error::JobError;
use crate::job::{IdSequence, Job, JobId, JobSnapshot, JobState};
use crate::pipeline::{self, ExecutableResolver, PathResolver};

/// Interval between scheduler passes when nothing wakes the loop earlier.
pub const PASS_INTERVAL: Duration = Duration::from_secs(1);

pub struct Manager {
    jobs: Mutex<Vec<Arc<Job>>>,
    config: Arc<PdmConfig>,
    ids: IdSequence,
    resolver: Arc<dyn ExecutableResolver>,
    wake: Arc<Notify>,
}

impl Manager {
    pub fn new(config: Arc<PdmConfig>) -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            config,
            ids: IdSequence::default(),
            resolver: Arc::new(PathResolver::new()),
            wake: Arc::new(Notify::new()),
        }
    }

    pub fn with_id_sequence(mut self, ids: IdSequence) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ExecutableResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &PdmConfig {
        &self.config
    }

    pub fn max_per_domain(&self) -> usize {
        self.config.server.maximum_active_downloads_per_domain
    }

    fn registry(&self) -> MutexGuard<'_, Vec<Arc<Job>>> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn retention(&self) -> Option<Duration> {
        self.config
            .server
            .finished_retention_secs
            .map(Duration::from_secs)
    }

    /// Register a new job for `url`. It waits for a profile before it can be queued.
    pub fn create(&self, url: &str) -> JobId {
        let job = Arc::new(Job::new(self.ids.next_id(), url));
        let id = job.id();
        tracing::info!(job_id = id, url, domain = job.domain(), "download created");
        self.registry().push(job);
        id
    }

    pub fn get(&self, id: JobId) -> Result<Arc<Job>, JobError> {
        self.registry()
            .iter()
            .find(|job| job.id() == id)
            .cloned()
            .ok_or(JobError::NotFound(id))
    }

    /// Choose how a job will be downloaded. Only allowed before it is queued.
    pub fn set_profile_and_option(
        &self,
        id: JobId,
        profile: &str,
        option: Option<&str>,
    ) -> Result<(), JobError> {
        let profile = self
            .config
            .profile_called(profile)
            .cloned()
            .ok_or_else(|| JobError::UnknownProfile(profile.to_string()))?;
        let option = match option {
            Some(name) => Some(
                self.config
                    .option_called(name)
                    .cloned()
                    .ok_or_else(|| JobError::UnknownOption(name.to_string()))?,
            ),
            None => None,
        };

        let job = self.get(id)?;
        let mut data = job.lock();
        if data.state() != JobState::AwaitingProfile {
            return Err(JobError::ProfileLocked {
                id,
                state: data.state(),
            });
        }
        tracing::debug!(job_id = id, profile = %profile.name, "profile set");
        data.profile = Some(profile);
        data.option = option;
        Ok(())
    }

    /// Hand a job to the scheduler. It starts on a later pass once its domain has room.
    pub fn queue(&self, id: JobId) -> Result<(), JobError> {
        let job = self.get(id)?;
        {
            let mut data = job.lock();
            if data.profile.is_none() {
                return Err(JobError::MissingProfile(id));
            }
            job.transition(&mut data, JobState::Queued)?;
        }
        tracing::info!(job_id = id, "download queued");
        self.wake.notify_one();
        Ok(())
    }

    /// Set profile and option, then queue.
    pub fn start(&self, id: JobId, profile: &str, option: Option<&str>) -> Result<(), JobError> {
        self.set_profile_and_option(id, profile, option)?;
        self.queue(id)
    }

    pub fn stop(&self, id: JobId) -> Result<(), JobError> {
        self.get(id)?.stop()
    }

    /// Set (or with `None`, clear) where a job's files go once complete.
    pub fn change_destination(&self, id: JobId, name: Option<&str>) -> Result<(), JobError> {
        let destination = match name {
            Some(name) => Some(
                self.config
                    .destination_called(name)
                    .cloned()
                    .ok_or_else(|| JobError::UnknownDestination(name.to_string()))?,
            ),
            None => None,
        };
        let job = self.get(id)?;
        {
            let mut data = job.lock();
            if matches!(data.state(), JobState::Failed | JobState::Moved) {
                return Err(JobError::DestinationLocked {
                    id,
                    state: data.state(),
                });
            }
            data.destination = destination;
        }
        self.wake.notify_one();
        Ok(())
    }

    pub fn snapshot(&self) -> Vec<JobSnapshot> {
        self.registry().iter().map(|job| job.snapshot()).collect()
    }

    pub fn snapshot_job(&self, id: JobId) -> Result<JobSnapshot, JobError> {
        Ok(self.get(id)?.snapshot())
    }

    /// Move queued jobs to Preparing while their domain has room, in
    /// registry order, without launching them. Returns the admitted jobs.
    #[cfg(test)]
    pub(crate) fn admit_queued(&self) -> Vec<Arc<Job>> {
        admit(&self.registry(), self.max_per_domain())
    }

    /// One scheduler pass under a single registry lock. Returns jobs to start.
    fn pass(&self) -> Vec<Arc<Job>> {
        let mut jobs = self.registry();
        let admitted = admit(&jobs, self.max_per_domain());
        mover::move_completed(&jobs, &self.config.server.download_path);
        if let Some(retention) = self.retention() {
            prune(&mut jobs, retention);
        }
        admitted
    }

    fn launch(&self, job: Arc<Job>, tasks: &mut JoinSet<()>) {
        let dir = self.config.server.download_path.clone();
        let resolver = Arc::clone(&self.resolver);
        let wake = Arc::clone(&self.wake);
        tasks.spawn(async move {
            pipeline::run(job, &dir, resolver.as_ref()).await;
            wake.notify_one();
        });
    }

    /// Scheduler loop. Returns once `shutdown` flips to true or its sender is dropped;
    /// running downloads are aborted and their processes killed.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut tick = tokio::time::interval(PASS_INTERVAL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tasks = JoinSet::new();
        tracing::info!(
            max_per_domain = self.max_per_domain(),
            download_path = %self.config.server.download_path.display(),
            "manager running"
        );

        loop {
            tokio::select! {
                _ = tick.tick() => {}
                _ = self.wake.notified() => {}
                Some(res) = tasks.join_next() => {
                    if let Err(e) = res {
                        tracing::warn!("download task ended abnormally: {e}");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
            for job in self.pass() {
                self.launch(job, &mut tasks);
            }
        }

        tracing::info!(running = tasks.len(), "manager stopping");
        tasks.shutdown().await;
    }

    /// Short human-readable dump of the registry.
    pub fn summary(&self) -> String {
        let jobs = self.registry();
        let mut out = format!(
            "Max per domain: {}, downloads: {}\n",
            self.max_per_domain(),
            jobs.len()
        );
        for job in jobs.iter() {
            let _ = writeln!(out, "{:3}: ({:>10}) {:>30}", job.id(), job.state().label(), job.url());
        }
        out
    }
}

fn admit(jobs: &[Arc<Job>], limit: usize) -> Vec<Arc<Job>> {
    let mut budget = DomainBudget::new(limit);
    for job in jobs {
        if job.state().is_active() {
            budget.occupy(job.domain());
        }
    }

    let mut admitted = Vec::new();
    for job in jobs {
        let mut data = job.lock();
        if data.state() != JobState::Queued || !budget.try_admit(job.domain()) {
            continue;
        }
        if let Err(e) = job.transition(&mut data, JobState::Preparing) {
            tracing::warn!("{e}");
            continue;
        }
        tracing::info!(job_id = job.id(), domain = job.domain(), "download admitted");
        admitted.push(Arc::clone(job));
    }
    admitted
}

fn prune(jobs: &mut Vec<Arc<Job>>, retention: Duration) {
    let now = Utc::now();
    jobs.retain(|job| {
        let expired = job.expired(now, retention);
        if expired {
            tracing::debug!(job_id = job.id(), "dropping finished download");
        }
        !expired
    });
}
