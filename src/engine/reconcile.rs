//! Periodic disk↔index reconciliation.
//!
//! The event stream can miss or misorder events (network filesystems,
//! sleep/wake, watcher bugs). The reconciler is the backstop: it removes
//! index entries whose paths vanished and injects `created` events for files
//! on disk the index does not know, bypassing the debouncer.

use super::Engine;
use crate::config::{STAGING_DIR, is_supported_extension};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Spawn the reconciliation loop. Sweeps are skipped until the startup scan
/// completes so the initial bulk ingest is not raced.
pub fn spawn(engine: Arc<Engine>) {
    tokio::spawn(async move {
        let period = engine.config().reconcile_interval;
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if !engine.startup_complete() {
                continue;
            }
            engine.reconcile_once().await;
        }
    });
}

/// Enumerate every supported file in the three locations the system owns:
/// direct children of the root, each managed `<prefix>*` subtree
/// (recursively), and the staging directory. Sorted for deterministic
/// ingestion order.
pub fn scan_supported_files(root: &Path, prefix: &str) -> Vec<PathBuf> {
    let mut found = Vec::new();

    match std::fs::read_dir(root) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    if is_supported_file(&path) {
                        found.push(path);
                    }
                } else if path.is_dir()
                    && entry
                        .file_name()
                        .to_string_lossy()
                        .starts_with(prefix)
                {
                    collect_recursive(&path, &mut found);
                }
            }
        }
        Err(e) => warn!("Failed to scan root {}: {}", root.display(), e),
    }

    let staging = root.join(STAGING_DIR);
    if let Ok(entries) = std::fs::read_dir(&staging) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && is_supported_file(&path) {
                found.push(path);
            }
        }
    }

    found.sort();
    found
}

fn collect_recursive(dir: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_recursive(&path, found);
        } else if is_supported_file(&path) {
            found.push(path);
        }
    }
}

fn is_supported_file(path: &Path) -> bool {
    let ext = path
        .extension()
        .unwrap_or_default()
        .to_string_lossy()
        .to_lowercase();
    is_supported_extension(&ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_root_managed_and_staging() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        std::fs::write(root.join("loose.txt"), "a").unwrap();
        std::fs::write(root.join("skip.md"), "b").unwrap();

        let managed = root.join("SEFS_Physics").join("nested");
        std::fs::create_dir_all(&managed).unwrap();
        std::fs::write(managed.join("deep.pdf"), "c").unwrap();

        let unmanaged = root.join("keep-out");
        std::fs::create_dir_all(&unmanaged).unwrap();
        std::fs::write(unmanaged.join("hidden.txt"), "d").unwrap();

        let staging = root.join(STAGING_DIR);
        std::fs::create_dir_all(&staging).unwrap();
        std::fs::write(staging.join("upload.txt"), "e").unwrap();

        let found = scan_supported_files(root, "SEFS_");
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert!(names.contains(&"loose.txt".to_string()));
        assert!(names.contains(&"deep.pdf".to_string()));
        assert!(names.contains(&"upload.txt".to_string()));
        assert!(!names.contains(&"skip.md".to_string()));
        assert!(!names.contains(&"hidden.txt".to_string()));
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn scan_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("b.txt"), "x").unwrap();
        std::fs::write(root.join("a.txt"), "x").unwrap();
        std::fs::write(root.join("c.txt"), "x").unwrap();

        let found = scan_supported_files(root, "SEFS_");
        let mut sorted = found.clone();
        sorted.sort();
        assert_eq!(found, sorted);
    }
}
