//! Turns downloader output lines into job metadata.
//!
//! Every line is appended to the job log. The rules below then run in a fixed
//! order and each one that matches updates its field. No rule depends on the
//! result of another for the same line. Unrecognised output is only logged.

mod lines;

pub use lines::LineSplitter;

use regex::Regex;
use std::sync::LazyLock;

use crate::job::JobData;

pub const METADATA_ACTIVITY: &str = "Downloading metadata";
pub const FIXUP_ACTIVITY: &str = "Fixing MPEG-TS in MP4";

static ETA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"download.+ETA +(\d\d:\d\d(?::\d\d)?)").expect("eta regex"));
static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"download.+?([\d.]+)%").expect("percent regex"));
static DESTINATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"download.+?Destination: (.+)$").expect("destination regex")
});
static MERGED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Merging formats into "(.+)"$"#).expect("merge regex"));
static DELETED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Deleting original file (.+) \(pass -k to keep\)$").expect("delete regex")
});
static PLAYLIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Downloading (?:video|item) (\d+) of (\d+)").expect("playlist regex")
});
static METADATA_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Downloading JSON metadata page (\d+)").expect("metadata regex")
});
static FIXUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Fixing MPEG-TS in MP4 container").expect("fixup regex"));

/// Record one complete output line against the job.
pub fn ingest_line(job: &mut JobData, line: &str) {
    job.append_log(line);
    apply_rules(job, line);
}

/// Update job metadata from one line without logging it.
pub fn apply_rules(job: &mut JobData, line: &str) {
    if let Some(caps) = ETA.captures(line) {
        job.eta = caps[1].to_string();
        job.mark_downloading();
    }

    if let Some(caps) = PERCENT.captures(line) {
        match caps[1].parse::<f32>() {
            Ok(pct) => job.percent = pct,
            Err(e) => tracing::warn!("ignoring percentage '{}': {e}", &caps[1]),
        }
    }

    if let Some(caps) = DESTINATION.captures(line) {
        job.files.push(caps[1].to_string());
    }

    if let Some(caps) = MERGED.captures(line) {
        job.files.push(caps[1].to_string());
    }

    if let Some(caps) = DELETED.captures(line) {
        job.remove_file(&caps[1]);
    }

    if let Some(caps) = PLAYLIST.captures(line) {
        match (caps[1].parse::<u32>(), caps[2].parse::<u32>()) {
            (Ok(current), Ok(total)) => {
                job.playlist_current = current;
                job.playlist_total = total;
            }
            _ => tracing::warn!("ignoring playlist position in '{line}'"),
        }
    }

    if METADATA_PAGE.is_match(line) {
        job.activity = Some(METADATA_ACTIVITY.to_string());
    }

    if FIXUP.is_match(line) {
        job.activity = Some(FIXUP_ACTIVITY.to_string());
    }
}
