pub mod config;
pub mod logging;

pub mod control;
pub mod error;
pub mod extract;
pub mod job;
pub mod manager;
pub mod pipeline;

pub use error::JobError;
pub use job::{Job, JobId, JobSnapshot, JobState};
pub use manager::Manager;
