use super::*;
use crate::config::DownloadProfile;
use std::time::Duration;

fn prepared_job(url: &str, command: &str, args: &[&str]) -> Arc<Job> {
    let job = Arc::new(Job::new(1, url));
    {
        let mut data = job.lock();
        data.profile = Some(DownloadProfile {
            name: "test".into(),
            command: command.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
        });
        data.advance(JobState::Queued).unwrap();
        data.advance(JobState::Preparing).unwrap();
    }
    job
}

fn shell_job(url: &str, script: &str) -> Arc<Job> {
    prepared_job(url, "sh", &["-c", script])
}

#[tokio::test]
async fn successful_run_completes_with_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let job = shell_job(
        "https://example.org/v",
        "echo '[download] Destination: a.mp4'; \
         echo '[download]  50.0% of 1.00MiB at 1.00MiB/s ETA 00:03'; \
         printf 'tail without newline'",
    );
    run(Arc::clone(&job), dir.path(), &PathResolver::new()).await;

    let snap = job.snapshot();
    assert_eq!(snap.state, JobState::Complete);
    assert_eq!(snap.exit_code, Some(0));
    assert!(snap.finished);
    assert!(snap.finished_at.is_some());
    assert!(!snap.running);
    assert_eq!(snap.files, ["a.mp4"]);
    assert_eq!(snap.eta, "00:03");
    assert_eq!(snap.log.last().map(String::as_str), Some("tail without newline"));
}

#[tokio::test]
async fn nonzero_exit_fails_and_keeps_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let job = shell_job("https://example.org/v", "echo oops >&2; exit 3");
    run(Arc::clone(&job), dir.path(), &PathResolver::new()).await;

    let snap = job.snapshot();
    assert_eq!(snap.state, JobState::Failed);
    assert_eq!(snap.exit_code, Some(3));
    assert!(snap.log.iter().any(|l| l == "oops"), "{:?}", snap.log);
}

#[tokio::test]
async fn runs_inside_download_dir() {
    let dir = tempfile::tempdir().unwrap();
    let job = shell_job("https://example.org/v", "touch marker");
    run(Arc::clone(&job), dir.path(), &PathResolver::new()).await;
    assert_eq!(job.state(), JobState::Complete);
    assert!(dir.path().join("marker").exists());
}

#[tokio::test]
async fn url_is_passed_as_last_argument() {
    let dir = tempfile::tempdir().unwrap();
    let job = shell_job("https://videos.invalid/watch", "echo \"url=$0\"");
    run(Arc::clone(&job), dir.path(), &PathResolver::new()).await;
    let snap = job.snapshot();
    assert_eq!(snap.state, JobState::Complete);
    assert_eq!(snap.log, ["url=https://videos.invalid/watch"]);
}

#[tokio::test]
async fn unresolvable_command_fails_with_log_line() {
    let dir = tempfile::tempdir().unwrap();
    let job = prepared_job("https://example.org/v", "pdm-missing-downloader", &[]);
    run(Arc::clone(&job), dir.path(), &PathResolver::new()).await;

    let snap = job.snapshot();
    assert_eq!(snap.state, JobState::Failed);
    assert!(snap.finished);
    assert_eq!(snap.exit_code, None);
    assert_eq!(snap.log.len(), 1);
    assert!(snap.log[0].contains("pdm-missing-downloader"), "{}", snap.log[0]);
}

#[tokio::test]
async fn missing_profile_fails() {
    let dir = tempfile::tempdir().unwrap();
    let job = Arc::new(Job::new(9, "https://example.org/v"));
    {
        let mut data = job.lock();
        data.advance(JobState::Queued).unwrap();
        data.advance(JobState::Preparing).unwrap();
    }
    run(Arc::clone(&job), dir.path(), &PathResolver::new()).await;
    let snap = job.snapshot();
    assert_eq!(snap.state, JobState::Failed);
    assert_eq!(snap.log, ["download has no profile"]);
}

#[tokio::test]
async fn stop_kills_running_process() {
    let dir = tempfile::tempdir().unwrap();
    let job = prepared_job("https://example.org/v", "sleep", &["30"]);
    let path = dir.path().to_path_buf();
    let runner = {
        let job = Arc::clone(&job);
        tokio::spawn(async move { run(job, &path, &PathResolver::new()).await })
    };

    tokio::time::timeout(Duration::from_secs(5), async {
        while !job.lock().is_running() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("process started");
    assert_eq!(job.state(), JobState::Downloading);

    job.stop().unwrap();
    tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .expect("pipeline finished after stop")
        .unwrap();

    let snap = job.snapshot();
    assert_eq!(snap.state, JobState::Failed);
    assert_eq!(snap.exit_code, Some(-1));
    assert!(!snap.running);
    assert!(snap.log.iter().any(|l| l == "aborted by user"));
}

#[tokio::test]
async fn finished_job_drops_activity_note() {
    let dir = tempfile::tempdir().unwrap();
    let job = shell_job(
        "https://videos.invalid/v",
        "echo '[download] 100% of 1.00MiB in 00:01'; \
         echo '[FixupM3u8] Fixing MPEG-TS in MP4 container of \"a.mp4\"'",
    );
    run(Arc::clone(&job), dir.path(), &PathResolver::new()).await;

    let snap = job.snapshot();
    assert_eq!(snap.state, JobState::Complete);
    assert_eq!(snap.display_state, JobState::Complete.label());
}

#[test]
fn stop_after_exit_does_not_mark_abort() {
    use std::os::unix::process::ExitStatusExt;

    let job = prepared_job("https://videos.invalid/v", "true", &[]);
    {
        let mut data = job.lock();
        data.mark_downloading();
        data.process = Some(ProcessHandle::new(Some(7), Arc::new(Notify::new())));
    }
    job.stop().unwrap();
    record_exit(&job, Ok(ExitStatus::from_raw(0)), false);

    let snap = job.snapshot();
    assert_eq!(snap.state, JobState::Complete);
    assert!(snap.log.is_empty(), "{:?}", snap.log);
}
