//! Relocates the files of completed jobs to their destination directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::job::{Job, JobState};

/// Move every Complete job that has a destination. Returns how many jobs moved.
pub(crate) fn move_completed(jobs: &[Arc<Job>], download_dir: &Path) -> usize {
    jobs.iter()
        .filter(|job| move_job(job, download_dir))
        .count()
}

/// The job is marked Moved before any file is touched, so a failed rename is
/// never retried. The first failure is logged and the rest are left in place.
pub(crate) fn move_job(job: &Job, download_dir: &Path) -> bool {
    let mut data = job.lock();
    if data.state() != JobState::Complete {
        return false;
    }
    let Some(dest) = data.destination.clone() else {
        return false;
    };
    if let Err(e) = job.transition(&mut data, JobState::Moved) {
        tracing::warn!("{e}");
        return false;
    }

    for name in data.files.clone() {
        let from = download_dir.join(&name);
        let to = dest.path.join(&name);
        match fs::rename(&from, &to) {
            Ok(()) => {
                tracing::info!(job_id = job.id(), from = %from.display(), to = %to.display(), "moved");
                data.append_log(format!("Moved {name} to {}", dest.path.display()));
            }
            Err(e) => {
                tracing::warn!(job_id = job.id(), from = %from.display(), "move failed: {e}");
                data.append_log(format!(
                    "Could not move {name} to {} - {e}",
                    dest.path.display()
                ));
                break;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Destination;

    fn completed_job(dest: &Path, files: &[&str]) -> Arc<Job> {
        let job = Arc::new(Job::new(1, "https://example.org/v"));
        {
            let mut data = job.lock();
            for step in [
                JobState::Queued,
                JobState::Preparing,
                JobState::Downloading,
            ] {
                data.advance(step).unwrap();
            }
            data.finish(JobState::Complete);
            data.files = files.iter().map(|s| s.to_string()).collect();
            data.destination = Some(Destination {
                name: "archive".into(),
                path: dest.to_path_buf(),
            });
        }
        job
    }

    #[test]
    fn moves_all_files() {
        let dl = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        fs::write(dl.path().join("a.mp4"), b"a").unwrap();
        fs::write(dl.path().join("a.info.json"), b"{}").unwrap();
        let job = completed_job(dest.path(), &["a.mp4", "a.info.json"]);

        assert_eq!(move_completed(&[Arc::clone(&job)], dl.path()), 1);
        assert_eq!(job.state(), JobState::Moved);
        assert!(dest.path().join("a.mp4").exists());
        assert!(dest.path().join("a.info.json").exists());
        assert!(!dl.path().join("a.mp4").exists());
        let log = job.lock().log.clone();
        assert_eq!(log.len(), 2);
        assert!(log[0].starts_with("Moved a.mp4 to "), "{}", log[0]);
    }

    #[test]
    fn first_failure_stops_and_still_moved() {
        let dl = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        fs::write(dl.path().join("c.mp4"), b"c").unwrap();
        let job = completed_job(dest.path(), &["missing.mp4", "c.mp4"]);

        assert_eq!(move_completed(&[Arc::clone(&job)], dl.path()), 1);
        assert_eq!(job.state(), JobState::Moved);
        assert!(dl.path().join("c.mp4").exists());
        let log = job.lock().log.clone();
        assert_eq!(log.len(), 1);
        assert!(log[0].starts_with("Could not move missing.mp4 to "), "{}", log[0]);

        // A Moved job is never picked up again.
        assert_eq!(move_completed(&[job], dl.path()), 0);
    }

    #[test]
    fn keeps_relative_subdirectories() {
        let dl = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        for (host, body) in [("a.example", b"A"), ("b.example", b"B")] {
            fs::create_dir(dl.path().join(host)).unwrap();
            fs::create_dir(dest.path().join(host)).unwrap();
            fs::write(dl.path().join(host).join("clip.mp4"), body).unwrap();
        }
        let job = completed_job(dest.path(), &["a.example/clip.mp4", "b.example/clip.mp4"]);

        assert_eq!(move_completed(&[Arc::clone(&job)], dl.path()), 1);
        assert_eq!(fs::read(dest.path().join("a.example/clip.mp4")).unwrap(), b"A");
        assert_eq!(fs::read(dest.path().join("b.example/clip.mp4")).unwrap(), b"B");
        assert!(!dest.path().join("clip.mp4").exists());
    }

    #[test]
    fn missing_destination_subdirectory_is_logged() {
        let dl = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        fs::create_dir(dl.path().join("a.example")).unwrap();
        fs::write(dl.path().join("a.example/clip.mp4"), b"A").unwrap();
        let job = completed_job(dest.path(), &["a.example/clip.mp4"]);

        move_completed(&[Arc::clone(&job)], dl.path());
        assert!(dl.path().join("a.example/clip.mp4").exists());
        let log = job.lock().log.clone();
        assert!(log[0].starts_with("Could not move a.example/clip.mp4 to "), "{}", log[0]);
    }

    #[test]
    fn skips_jobs_without_destination_or_not_complete() {
        let dl = tempfile::tempdir().unwrap();
        let job = completed_job(dl.path(), &[]);
        job.lock().destination = None;
        let running = Arc::new(Job::new(2, "https://example.org/w"));
        assert_eq!(move_completed(&[Arc::clone(&job), running], dl.path()), 0);
        assert_eq!(job.state(), JobState::Complete);
    }
}
