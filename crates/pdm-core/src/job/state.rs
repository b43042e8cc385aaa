use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a download job.
///
/// ```text
/// AwaitingProfile -> Queued -> Preparing -> Downloading -> Complete -> Moved
///                                   |            |
///                                   +-> Failed <-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    AwaitingProfile,
    Queued,
    Preparing,
    Downloading,
    Complete,
    Failed,
    Moved,
}

impl JobState {
    pub const ALL: [JobState; 7] = [
        JobState::AwaitingProfile,
        JobState::Queued,
        JobState::Preparing,
        JobState::Downloading,
        JobState::Complete,
        JobState::Failed,
        JobState::Moved,
    ];

    /// The only edges a job may take. Everything else is rejected.
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (AwaitingProfile, Queued)
                | (Queued, Preparing)
                | (Preparing, Downloading)
                | (Preparing, Failed)
                | (Downloading, Failed)
                | (Downloading, Complete)
                | (Complete, Moved)
        )
    }

    /// Counts against the per-domain limit.
    pub fn is_active(self) -> bool {
        matches!(self, JobState::Preparing | JobState::Downloading)
    }

    pub fn is_finished(self) -> bool {
        matches!(
            self,
            JobState::Complete | JobState::Failed | JobState::Moved
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::AwaitingProfile => "awaiting_profile",
            JobState::Queued => "queued",
            JobState::Preparing => "preparing",
            JobState::Downloading => "downloading",
            JobState::Complete => "complete",
            JobState::Failed => "failed",
            JobState::Moved => "moved",
        }
    }

    /// Human label shown in listings.
    pub fn label(self) -> &'static str {
        match self {
            JobState::AwaitingProfile => "Choose Profile",
            JobState::Queued => "Queued",
            JobState::Preparing => "Preparing to start",
            JobState::Downloading => "Downloading",
            JobState::Complete => "Complete",
            JobState::Failed => "Failed",
            JobState::Moved => "Moved",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
