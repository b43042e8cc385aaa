use super::*;

#[test]
fn allowed_edges_exactly() {
    use JobState::*;
    let allowed = [
        (AwaitingProfile, Queued),
        (Queued, Preparing),
        (Preparing, Downloading),
        (Preparing, Failed),
        (Downloading, Failed),
        (Downloading, Complete),
        (Complete, Moved),
    ];
    for from in JobState::ALL {
        for to in JobState::ALL {
            assert_eq!(
                from.can_transition_to(to),
                allowed.contains(&(from, to)),
                "{from:?} -> {to:?}"
            );
        }
    }
}

#[test]
fn only_preparing_and_downloading_are_active() {
    let active: Vec<_> = JobState::ALL.into_iter().filter(|s| s.is_active()).collect();
    assert_eq!(active, [JobState::Preparing, JobState::Downloading]);
}

#[test]
fn labels_and_serde_names() {
    assert_eq!(JobState::AwaitingProfile.to_string(), "Choose Profile");
    assert_eq!(JobState::Preparing.to_string(), "Preparing to start");
    assert_eq!(
        serde_json::to_string(&JobState::AwaitingProfile).unwrap(),
        "\"awaiting_profile\""
    );
    for state in JobState::ALL {
        let json = format!("\"{}\"", state.as_str());
        assert_eq!(serde_json::from_str::<JobState>(&json).unwrap(), state);
    }
}

#[test]
fn new_job_awaits_profile() {
    let job = Job::new(7, "https://www.youtube.com/watch?v=x");
    assert_eq!(job.id(), 7);
    assert_eq!(job.domain(), "www.youtube.com");
    let snap = job.snapshot();
    assert_eq!(snap.state, JobState::AwaitingProfile);
    assert_eq!(snap.display_state, "Choose Profile");
    assert!(!snap.running);
    assert!(!snap.finished);
    assert!(snap.finished_at.is_none());
}

#[test]
fn rejected_transition_leaves_state() {
    let job = Job::new(1, "https://example.org/a");
    let mut data = job.lock();
    let err = job.transition(&mut data, JobState::Downloading).unwrap_err();
    assert_eq!(
        err,
        JobError::InvalidTransition {
            id: 1,
            from: JobState::AwaitingProfile,
            to: JobState::Downloading,
        }
    );
    assert_eq!(data.state(), JobState::AwaitingProfile);
    job.transition(&mut data, JobState::Queued).unwrap();
    assert_eq!(data.state(), JobState::Queued);
}

#[test]
fn finish_stamps_time_once_terminal() {
    let mut data = JobData::in_state(JobState::Downloading);
    data.finish(JobState::Complete);
    assert!(data.finished);
    assert!(data.finished_at.is_some());
    assert_eq!(data.state(), JobState::Complete);

    let mut data = JobData::in_state(JobState::Queued);
    data.finish(JobState::Complete);
    assert!(!data.finished);
    assert_eq!(data.state(), JobState::Queued);
}

#[test]
fn activity_overrides_label() {
    let mut data = JobData::in_state(JobState::Preparing);
    data.activity = Some("Downloading metadata".into());
    assert_eq!(data.display_state(), "Downloading metadata");
    data.mark_downloading();
    assert_eq!(data.display_state(), "Downloading");
    assert_eq!(data.state(), JobState::Downloading);
}

#[test]
fn stop_without_process_is_not_running() {
    let job = Job::new(3, "https://example.org/a");
    assert_eq!(job.stop_if_supported(true), Err(JobError::NotRunning(3)));
    assert!(job.lock().log.is_empty());
}

#[test]
fn stop_unsupported_platform() {
    let job = Job::new(3, "https://example.org/a");
    assert_eq!(job.stop_if_supported(false), Err(JobError::StopUnsupported));
}

#[tokio::test]
async fn stop_signals_kill() {
    let job = Job::new(4, "https://example.org/a");
    let kill = Arc::new(Notify::new());
    job.lock().process = Some(ProcessHandle::new(Some(42), Arc::clone(&kill)));

    job.stop_if_supported(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), kill.notified())
        .await
        .expect("kill notification");
    assert!(job.lock().log.is_empty());
}

#[test]
fn expiry_needs_finished_and_age() {
    let job = Job::new(5, "https://example.org/a");
    let now = Utc::now();
    let hour = Duration::from_secs(3600);
    assert!(!job.expired(now, hour));
    {
        let mut data = job.lock();
        data.finished = true;
        data.finished_at = Some(now - chrono::Duration::hours(2));
    }
    assert!(job.expired(now, hour));
    assert!(!job.expired(now, Duration::from_secs(3 * 3600)));
}

#[test]
fn id_sequence_is_strictly_increasing() {
    let ids = IdSequence::default();
    assert_eq!(ids.next_id(), 1);
    assert_eq!(ids.next_id(), 2);
    let ids = IdSequence::starting_at(100);
    let drawn: Vec<_> = (0..5).map(|_| ids.next_id()).collect();
    assert_eq!(drawn, [100, 101, 102, 103, 104]);
}
