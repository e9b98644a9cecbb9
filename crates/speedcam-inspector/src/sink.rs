//! Writes a completed round's `InspectionSnapshot` to disk as JSON, pruning
//! old files so at most `max_results` accumulate.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use speedcam_core::snapshot::InspectionSnapshot;

use crate::error::Error;

static RESULT_FILE_RE: OnceLock<Regex> = OnceLock::new();

fn result_file_re() -> &'static Regex {
    RESULT_FILE_RE.get_or_init(|| Regex::new(r"^\d{8}_\d{6}\.json$").expect("static regex is valid"))
}

/// Write `snapshot` as `<dir>/<start.format(\"%Y%m%d_%H%M%S\")>.json`, pruning
/// the oldest matching files first if `max_results > 0` and the directory
/// would otherwise hold more than that many.
pub fn write_snapshot(dir: &Path, max_results: i64, snapshot: &InspectionSnapshot) -> Result<PathBuf, Error> {
    std::fs::create_dir_all(dir)?;

    if max_results > 0 {
        prune_oldest(dir, max_results as usize)?;
    }

    let filename = format!("{}.json", snapshot.start.format("%Y%m%d_%H%M%S"));
    let path = dir.join(filename);
    let data = serde_json::to_vec_pretty(snapshot).map_err(|e| Error::BadResponse {
        source: "inspection snapshot".to_string(),
        detail: e.to_string(),
    })?;
    std::fs::write(&path, data)?;
    Ok(path)
}

fn prune_oldest(dir: &Path, max_results: usize) -> Result<(), Error> {
    let mut entries: Vec<(PathBuf, String)> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if result_file_re().is_match(&name) {
                Some((entry.path(), name))
            } else {
                None
            }
        })
        .collect();

    if entries.len() + 1 <= max_results {
        return Ok(());
    }

    // Filenames sort lexicographically in chronological order (YYYYMMDD_HHMMSS).
    entries.sort_by(|a, b| a.1.cmp(&b.1));
    let excess = entries.len() + 1 - max_results;
    for (path, _) in entries.into_iter().take(excess) {
        if let Err(err) = std::fs::remove_file(&path) {
            tracing::warn!(error = %err, path = %path.display(), "failed to prune old result file");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use speedcam_core::config::SpeedCamConfig;
    use speedcam_core::graph::NetworkGraph;
    use speedcam_core::selector::SelectorWeights;
    use speedcam_core::snapshot::build_snapshot;

    fn snapshot_at(start: chrono::DateTime<Utc>) -> InspectionSnapshot {
        let graph = NetworkGraph::new(6);
        let weights = SelectorWeights {
            degree: 1.0,
            capacity: 1.0,
            success: 1.0,
            activity: 1.0,
        };
        build_snapshot(
            &graph,
            Vec::new(),
            start,
            ChronoDuration::seconds(30),
            weights,
            SpeedCamConfig::default(),
        )
    }

    #[test]
    fn writes_a_file_named_by_start_time() {
        let tmp = tempdir();
        let start = Utc.with_ymd_and_hms(2026, 3, 4, 10, 20, 30).unwrap();
        let path = write_snapshot(tmp.path(), -1, &snapshot_at(start)).unwrap();
        assert_eq!(path.file_name().unwrap(), "20260304_102030.json");
        assert!(path.exists());
    }

    #[test]
    fn retains_all_files_when_max_results_is_non_positive() {
        let tmp = tempdir();
        for day in 1..=5 {
            let start = Utc.with_ymd_and_hms(2026, 1, day, 0, 0, 0).unwrap();
            write_snapshot(tmp.path(), 0, &snapshot_at(start)).unwrap();
        }
        let count = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(count, 5);
    }

    #[test]
    fn prunes_oldest_files_first_to_respect_max_results() {
        // only the most recent max_results files should survive pruning
        let tmp = tempdir();
        for day in 1..=5 {
            let start = Utc.with_ymd_and_hms(2026, 1, day, 0, 0, 0).unwrap();
            write_snapshot(tmp.path(), 3, &snapshot_at(start)).unwrap();
        }
        let mut names: Vec<String> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(count_matching(&names), 3);
        // The three most recent days should survive.
        assert!(names.iter().any(|n| n.starts_with("20260105")));
        assert!(names.iter().any(|n| n.starts_with("20260104")));
        assert!(names.iter().any(|n| n.starts_with("20260103")));
    }

    fn count_matching(names: &[String]) -> usize {
        names.iter().filter(|n| result_file_re().is_match(n)).count()
    }

    fn tempdir() -> TempDirGuard {
        let mut path = std::env::temp_dir();
        let unique = format!(
            "speedcam-sink-test-{}-{}",
            std::process::id(),
            ADDR_COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
        );
        path.push(unique);
        std::fs::create_dir_all(&path).unwrap();
        TempDirGuard(path)
    }

    static ADDR_COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

    struct TempDirGuard(PathBuf);

    impl TempDirGuard {
        fn path(&self) -> &Path {
            &self.0
        }
    }

    impl Drop for TempDirGuard {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }
}
