//! Shell scripts standing in for a real downloader in integration tests.
//!
//! Each script prints output in the shape the extractor understands and
//! creates the files it reports, in the process working directory.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Two-format download that merges into `clip.mp4` and echoes its last argument (the URL) to stderr.
pub const MERGING_VIDEO: &str = r#"
echo "[youtube] abc: Downloading webpage"
echo "[download] Destination: clip.f137.mp4"
printf 'x' > clip.f137.mp4
printf '[download]  50.0%% of 1.00MiB at 1.00MiB/s ETA 00:01\r'
echo "[download] 100% of 1.00MiB in 00:01"
echo "[download] Destination: clip.f140.m4a"
printf 'y' > clip.f140.m4a
echo '[Merger] Merging formats into "clip.mp4"'
cat clip.f137.mp4 clip.f140.m4a > clip.mp4
rm clip.f137.mp4 clip.f140.m4a
echo "Deleting original file clip.f137.mp4 (pass -k to keep)"
echo "Deleting original file clip.f140.m4a (pass -k to keep)"
for last; do :; done
echo "url: $last" >&2
"#;

/// Write `body` as an executable `/bin/sh` script named `name` in `dir`.
pub fn install(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}")).expect("write fake downloader");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake downloader");
    path
}
