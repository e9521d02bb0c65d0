use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

pub(crate) const TMP_MARKER: &str = ".imotmp.";

const STALE_AFTER: Duration = Duration::from_secs(300);

/// Removes temp files left next to `snapshot` by interrupted writes.
pub(crate) fn purge_tmp(snapshot: &Path) {
    let Some(dir) = snapshot.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return;
    };
    let Some(stem) = snapshot.file_name().and_then(|n| n.to_str()) else {
        return;
    };
    let prefix = format!("{stem}{TMP_MARKER}");
    let now = SystemTime::now();

    let mut removed = 0usize;
    let mut failed = 0usize;

    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .flatten()
        .filter(|entry| is_tmp(entry, &prefix) && is_stale(entry, now))
        .for_each(|entry| match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(err) => {
                warn!(path = %entry.path().display(), error = %err, "Stale temp file removal failed");
                failed += 1;
            },
        });

    if removed > 0 || failed > 0 {
        info!(removed, failed, "Cleaned up temporary snapshot files");
    }
}

fn is_tmp(entry: &DirEntry, prefix: &str) -> bool {
    entry.file_type().is_file()
        && entry.file_name().to_str().is_some_and(|name| name.starts_with(prefix))
}

fn is_stale(entry: &DirEntry, now: SystemTime) -> bool {
    entry
        .metadata()
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|modified| now.duration_since(modified).ok())
        .is_none_or(|age| age > STALE_AFTER)
}
