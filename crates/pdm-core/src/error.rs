use thiserror::Error;

use crate::job::{JobId, JobState};

/// Failures of manager operations. Nothing here is fatal to the service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("no download with id {0}")]
    NotFound(JobId),
    #[error("no profile called '{0}'")]
    UnknownProfile(String),
    #[error("no download option called '{0}'")]
    UnknownOption(String),
    #[error("no destination called '{0}'")]
    UnknownDestination(String),
    #[error("download {0} has no profile set")]
    MissingProfile(JobId),
    #[error("download {id} cannot go from {from} to {to}")]
    InvalidTransition {
        id: JobId,
        from: JobState,
        to: JobState,
    },
    #[error("download {id} is {state}; its profile can no longer change")]
    ProfileLocked { id: JobId, state: JobState },
    #[error("download {id} is {state}; its destination can no longer change")]
    DestinationLocked { id: JobId, state: JobState },
    #[error("download {0} has no running process")]
    NotRunning(JobId),
    #[error("stopping downloads is not supported on this platform")]
    StopUnsupported,
}
