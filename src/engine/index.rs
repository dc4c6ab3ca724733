//! In-memory index: file records, cluster table, and the activity log ring.

use chrono::{Local, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};

/// Activity log ring capacity.
const LOG_CAPACITY: usize = 50;

/// One tracked document. Keyed by absolute path in [`CoreState::files`].
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub name: String,
    pub path: PathBuf,
    pub text: String,
    pub embedding: Vec<f32>,
    pub snippet: String,
    pub word_count: usize,
    /// Top frequency keywords, computed once at ingest.
    pub keywords: Vec<String>,
    pub cluster_id: Option<usize>,
    pub position: [f32; 3],
}

/// One active cluster. The whole table is rebuilt on every reclustering.
#[derive(Debug, Clone, Serialize)]
pub struct Cluster {
    pub id: usize,
    pub name: String,
    pub color: String,
    pub file_count: usize,
}

/// The authoritative index. `BTreeMap` keys give a stable, sorted iteration
/// order, which keeps reclustering deterministic for identical inputs.
#[derive(Debug, Default)]
pub struct CoreState {
    pub files: BTreeMap<PathBuf, FileRecord>,
    pub clusters: BTreeMap<usize, Cluster>,
}

impl CoreState {
    /// Remove the record for a deleted path. Lookup order: exact key, then
    /// normalized path, then basename match against any record whose stored
    /// path is no longer on disk (the OS sometimes reports a stale path).
    pub fn remove_deleted(&mut self, path: &Path) -> Option<FileRecord> {
        if let Some(record) = self.files.remove(path) {
            return Some(record);
        }

        let norm = normalize_path(path);
        if let Some(key) = self
            .files
            .keys()
            .find(|k| normalize_path(k) == norm)
            .cloned()
        {
            return self.files.remove(&key);
        }

        let name = path.file_name()?.to_string_lossy().to_string();
        let key = self
            .files
            .iter()
            .find(|(k, r)| r.name == name && !k.exists())
            .map(|(k, _)| k.clone())?;
        self.files.remove(&key)
    }

    /// Absorb a user-initiated move: if some record shares the new path's
    /// basename and its stored path has vanished while the new path exists,
    /// rewrite its key. Returns the basename on success.
    pub fn rekey_moved(&mut self, new_path: &Path) -> Option<String> {
        if !new_path.exists() {
            return None;
        }
        let name = new_path.file_name()?.to_string_lossy().to_string();
        let old_key = self
            .files
            .iter()
            .find(|(k, r)| k.as_path() != new_path && r.name == name && !k.exists())
            .map(|(k, _)| k.clone())?;

        let mut record = self.files.remove(&old_key)?;
        record.path = new_path.to_path_buf();
        self.files.insert(new_path.to_path_buf(), record);
        Some(name)
    }

    /// Rewrite a record's key after an organiser-driven move.
    pub fn rekey(&mut self, old_path: &Path, new_path: &Path) {
        if let Some(mut record) = self.files.remove(old_path) {
            record.path = new_path.to_path_buf();
            self.files.insert(new_path.to_path_buf(), record);
        }
    }
}

/// Normalize a path for identity comparisons: absolute, forward slashes,
/// case-folded. Index keys and ignore-registry keys use the same form so a
/// case-insensitive filesystem cannot split one file into two identities.
pub fn normalize_path(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    absolute.to_string_lossy().replace('\\', "/").to_lowercase()
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub timestamp: f64,
    pub time_str: String,
    pub kind: String,
    pub message: String,
    pub icon: String,
}

/// Bounded ring of recent pipeline events, shared with subscribers.
pub struct ActivityLog {
    entries: Mutex<VecDeque<ActivityEntry>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(LOG_CAPACITY)),
        }
    }

    pub fn add(&self, kind: &str, message: impl Into<String>, icon: &str) -> ActivityEntry {
        let entry = ActivityEntry {
            timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
            time_str: Local::now().format("%H:%M:%S").to_string(),
            kind: kind.to_string(),
            message: message.into(),
            icon: icon.to_string(),
        };
        let mut entries = self.entries.lock();
        if entries.len() == LOG_CAPACITY {
            entries.pop_front();
        }
        entries.push_back(entry.clone());
        entry
    }

    pub fn recent(&self, count: usize) -> Vec<ActivityEntry> {
        let entries = self.entries.lock();
        entries
            .iter()
            .skip(entries.len().saturating_sub(count))
            .cloned()
            .collect()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, path: &Path) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            path: path.to_path_buf(),
            text: String::new(),
            embedding: vec![],
            snippet: String::new(),
            word_count: 0,
            keywords: vec![],
            cluster_id: None,
            position: [0.0; 3],
        }
    }

    #[test]
    fn remove_deleted_exact_match() {
        let mut state = CoreState::default();
        let path = PathBuf::from("/tmp/sefs-idx-test/a.txt");
        state.files.insert(path.clone(), record("a.txt", &path));
        assert!(state.remove_deleted(&path).is_some());
        assert!(state.files.is_empty());
    }

    #[test]
    fn remove_deleted_falls_back_to_basename_for_dead_paths() {
        let mut state = CoreState::default();
        // Stored path does not exist on disk, reported path differs.
        let stored = PathBuf::from("/tmp/sefs-idx-test/gone/doc.txt");
        state.files.insert(stored.clone(), record("doc.txt", &stored));
        let reported = PathBuf::from("/tmp/sefs-idx-test/elsewhere/doc.txt");
        assert!(state.remove_deleted(&reported).is_some());
        assert!(state.files.is_empty());
    }

    #[test]
    fn rekey_moved_requires_new_path_on_disk() {
        let mut state = CoreState::default();
        let stored = PathBuf::from("/tmp/sefs-idx-test/gone/doc.txt");
        state.files.insert(stored.clone(), record("doc.txt", &stored));
        // Destination does not exist either, so no rekey happens.
        let dest = PathBuf::from("/tmp/sefs-idx-test/new/doc.txt");
        assert!(state.rekey_moved(&dest).is_none());
        assert!(state.files.contains_key(&stored));
    }

    #[test]
    fn rekey_moved_rewrites_key() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("doc.txt");
        std::fs::write(&dest, "body").unwrap();

        let mut state = CoreState::default();
        let stored = dir.path().join("old").join("doc.txt");
        state.files.insert(stored.clone(), record("doc.txt", &stored));

        assert_eq!(state.rekey_moved(&dest).as_deref(), Some("doc.txt"));
        assert!(state.files.contains_key(&dest));
        assert!(!state.files.contains_key(&stored));
        assert_eq!(state.files[&dest].path, dest);
    }

    #[test]
    fn normalized_paths_fold_case() {
        assert_eq!(
            normalize_path(Path::new("/Tmp/Docs/A.TXT")),
            "/tmp/docs/a.txt"
        );
    }

    #[test]
    fn activity_log_is_bounded() {
        let log = ActivityLog::new();
        for i in 0..80 {
            log.add("detect", format!("event {i}"), "i");
        }
        let recent = log.recent(100);
        assert_eq!(recent.len(), LOG_CAPACITY);
        assert_eq!(recent.last().unwrap().message, "event 79");
        assert_eq!(recent.first().unwrap().message, "event 30");
    }

    #[test]
    fn recent_returns_latest_entries() {
        let log = ActivityLog::new();
        for i in 0..10 {
            log.add("detect", format!("event {i}"), "i");
        }
        let recent = log.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].message, "event 7");
    }
}
