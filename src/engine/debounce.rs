//! Per-path event debouncing.
//!
//! Every incoming event restarts a timer for its path; when the timer fires,
//! the latest event kind seen for that path is delivered downstream and the
//! entry is cleared. A `deleted` arriving after `created`/`modified` within
//! the window therefore supersedes them. Reconciler-injected events do not
//! pass through here.

use super::FileEventKind;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

struct Pending {
    kind: FileEventKind,
    generation: u64,
}

pub struct Debouncer {
    window: Duration,
    out: mpsc::UnboundedSender<(FileEventKind, PathBuf)>,
    pending: Mutex<HashMap<PathBuf, Pending>>,
    generation: AtomicU64,
}

impl Debouncer {
    pub fn new(
        window: Duration,
        out: mpsc::UnboundedSender<(FileEventKind, PathBuf)>,
    ) -> Arc<Self> {
        Arc::new(Self {
            window,
            out,
            pending: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        })
    }

    /// Record an event and (re)start the timer for its path. Stale timers
    /// from earlier submissions notice the generation mismatch and fizzle.
    pub fn submit(self: &Arc<Self>, kind: FileEventKind, path: PathBuf) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.pending
            .lock()
            .insert(path.clone(), Pending { kind, generation });

        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(this.window).await;
            let fire = {
                let mut pending = this.pending.lock();
                match pending.get(&path) {
                    Some(p) if p.generation == generation => pending.remove(&path).map(|p| p.kind),
                    _ => None,
                }
            };
            if let Some(kind) = fire {
                let _ = this.out.send((kind, path));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    fn debouncer() -> (
        Arc<Debouncer>,
        mpsc::UnboundedReceiver<(FileEventKind, PathBuf)>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Debouncer::new(Duration::from_millis(80), tx), rx)
    }

    #[tokio::test]
    async fn delivers_single_event_after_window() {
        let (deb, mut rx) = debouncer();
        let path = PathBuf::from("/tmp/a.txt");
        deb.submit(FileEventKind::Created, path.clone());

        let (kind, delivered) = timeout(Duration::from_millis(500), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kind, FileEventKind::Created);
        assert_eq!(delivered, path);
    }

    #[tokio::test]
    async fn burst_on_same_path_collapses_to_latest_kind() {
        let (deb, mut rx) = debouncer();
        let path = PathBuf::from("/tmp/b.txt");
        deb.submit(FileEventKind::Created, path.clone());
        deb.submit(FileEventKind::Modified, path.clone());
        deb.submit(FileEventKind::Deleted, path.clone());

        let (kind, _) = timeout(Duration::from_millis(500), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kind, FileEventKind::Deleted);

        // Nothing further: the burst collapsed into one delivery.
        assert!(
            timeout(Duration::from_millis(120), rx.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn distinct_paths_are_debounced_independently() {
        let (deb, mut rx) = debouncer();
        deb.submit(FileEventKind::Created, PathBuf::from("/tmp/c.txt"));
        deb.submit(FileEventKind::Created, PathBuf::from("/tmp/d.txt"));

        let mut seen = Vec::new();
        for _ in 0..2 {
            let (_, path) = timeout(Duration::from_millis(500), rx.recv())
                .await
                .unwrap()
                .unwrap();
            seen.push(path);
        }
        seen.sort();
        assert_eq!(
            seen,
            vec![PathBuf::from("/tmp/c.txt"), PathBuf::from("/tmp/d.txt")]
        );
    }

    #[tokio::test]
    async fn resubmission_restarts_the_window() {
        let (deb, mut rx) = debouncer();
        let path = PathBuf::from("/tmp/e.txt");
        deb.submit(FileEventKind::Created, path.clone());
        tokio::time::sleep(Duration::from_millis(40)).await;
        deb.submit(FileEventKind::Modified, path.clone());

        // The first timer would have fired by now; only the restarted one may.
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(rx.try_recv().is_err());

        let (kind, _) = timeout(Duration::from_millis(500), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kind, FileEventKind::Modified);
    }
}
