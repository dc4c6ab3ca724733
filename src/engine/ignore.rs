//! Suppression of watcher events for paths the system itself is about to
//! mutate. The organiser marks both ends of every move before performing it,
//! so the resulting `deleted`/`created` pair from the OS watcher is dropped
//! instead of being treated as user activity.

use super::index::normalize_path;
use dashmap::DashMap;
use std::path::Path;
use std::time::{Duration, Instant};

pub struct IgnoreRegistry {
    entries: DashMap<String, Instant>,
    ttl: Duration,
}

impl IgnoreRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Mark a path as internally mutated for the configured TTL.
    pub fn mark(&self, path: &Path) {
        self.entries
            .insert(normalize_path(path), Instant::now() + self.ttl);
    }

    /// True iff the path is currently marked. Expired entries are swept
    /// lazily here rather than by a background task.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let now = Instant::now();
        self.entries.retain(|_, deadline| *deadline > now);
        self.entries.contains_key(&normalize_path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn marked_paths_are_ignored() {
        let registry = IgnoreRegistry::new(Duration::from_secs(15));
        let path = PathBuf::from("/tmp/sefs-ignore/a.txt");
        assert!(!registry.is_ignored(&path));
        registry.mark(&path);
        assert!(registry.is_ignored(&path));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = IgnoreRegistry::new(Duration::from_secs(15));
        registry.mark(&PathBuf::from("/tmp/sefs-ignore/Doc.TXT"));
        assert!(registry.is_ignored(&PathBuf::from("/tmp/sefs-ignore/doc.txt")));
    }

    #[test]
    fn entries_expire_and_are_swept() {
        let registry = IgnoreRegistry::new(Duration::from_millis(10));
        let path = PathBuf::from("/tmp/sefs-ignore/b.txt");
        registry.mark(&path);
        assert!(registry.is_ignored(&path));
        std::thread::sleep(Duration::from_millis(25));
        assert!(!registry.is_ignored(&path));
        assert!(registry.entries.is_empty());
    }
}
