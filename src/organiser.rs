//! Mirrors cluster assignments to the on-disk folder layout.
//!
//! Managed folders are direct children of the root named
//! `<prefix><cluster_name>`. Files move into their cluster's folder with
//! `_1`, `_2`, … suffixes on basename collisions; emptied managed folders are
//! removed afterwards. Per-file move failures are logged and do not abort
//! the batch.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Invert `file → cluster id` into `cluster name → [files]`.
pub fn build_cluster_map(
    assignments: &std::collections::BTreeMap<PathBuf, usize>,
    cluster_names: &std::collections::BTreeMap<usize, String>,
) -> std::collections::BTreeMap<String, Vec<PathBuf>> {
    let mut map: std::collections::BTreeMap<String, Vec<PathBuf>> =
        std::collections::BTreeMap::new();
    for (path, cluster_id) in assignments {
        let folder = cluster_names
            .get(cluster_id)
            .cloned()
            .unwrap_or_else(|| format!("Cluster_{cluster_id}"));
        map.entry(folder).or_default().push(path.clone());
    }
    map
}

/// Ensure one folder per cluster and move every file into its folder.
/// Returns the `old path → new path` map of moves actually performed.
pub fn sync_folders(
    root: &Path,
    prefix: &str,
    cluster_map: &std::collections::BTreeMap<String, Vec<PathBuf>>,
) -> HashMap<PathBuf, PathBuf> {
    let mut moves = HashMap::new();

    for (folder_name, files) in cluster_map {
        let dest_folder = root.join(format!("{prefix}{folder_name}"));
        if let Err(e) = std::fs::create_dir_all(&dest_folder) {
            warn!("Failed to create {}: {}", dest_folder.display(), e);
            continue;
        }

        for src in files {
            if !src.exists() {
                continue;
            }
            if src.parent() == Some(dest_folder.as_path()) {
                continue;
            }
            let Some(base) = src.file_name() else {
                continue;
            };

            let mut dest = dest_folder.join(base);
            if dest.exists() && dest != *src {
                dest = collision_free(&dest_folder, src);
            }

            match move_file(src, &dest) {
                Ok(()) => {
                    debug!(
                        "Moved: {} → {}/",
                        base.to_string_lossy(),
                        dest_folder.file_name().unwrap_or_default().to_string_lossy()
                    );
                    moves.insert(src.clone(), dest);
                }
                Err(e) => warn!("Failed to move {}: {}", src.display(), e),
            }
        }
    }

    cleanup_empty_managed(root, prefix);

    if !moves.is_empty() {
        info!("Moved {} files", moves.len());
    }
    moves
}

/// Append `_1`, `_2`, … to the stem until the name is free.
fn collision_free(dest_folder: &Path, src: &Path) -> PathBuf {
    let stem = src
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = src
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1;
    loop {
        let candidate = dest_folder.join(format!("{stem}_{counter}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Rename on the same filesystem; copy + delete across devices.
fn move_file(src: &Path, dest: &Path) -> std::io::Result<()> {
    match std::fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if std::fs::copy(src, dest).is_ok() {
                std::fs::remove_file(src)
            } else {
                Err(rename_err)
            }
        }
    }
}

/// Remove managed folders that ended up empty. Not recursive, and never
/// touches non-managed directories.
fn cleanup_empty_managed(root: &Path, prefix: &str) {
    let Ok(entries) = std::fs::read_dir(root) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if !entry.file_name().to_string_lossy().starts_with(prefix) {
            continue;
        }
        let is_empty = std::fs::read_dir(&path)
            .map(|mut contents| contents.next().is_none())
            .unwrap_or(false);
        if is_empty {
            match std::fs::remove_dir(&path) {
                Ok(()) => debug!("Removed empty: {}", path.display()),
                Err(e) => debug!("Could not remove {}: {}", path.display(), e),
            }
        }
    }
}
