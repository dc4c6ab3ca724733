//! Batched recluster scheduling.
//!
//! One resettable timer for the whole engine: every ingest pushes the fire
//! time back by the configured delay, so a burst of arrivals produces exactly
//! one reclustering after the burst goes quiet. `cancel` backs the forced
//! path (batched uploads recluster immediately instead of waiting).

use super::Engine;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

pub struct ReclusterScheduler {
    delay: Duration,
    pending: Mutex<Option<PendingTimer>>,
    generation: AtomicU64,
}

impl ReclusterScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Cancel any pending timer and start a new one.
    pub fn schedule(&self, engine: Arc<Engine>) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let delay = self.delay;

        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            previous.handle.abort();
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Claim the timer slot before starting work: once claimed, a
            // later cancel/schedule cannot abort the running reclustering.
            if !engine.scheduler().claim(generation) {
                return;
            }
            engine.run_recluster().await;
        });

        *pending = Some(PendingTimer { generation, handle });
    }

    /// Drop any pending timer without firing it.
    pub fn cancel(&self) {
        if let Some(previous) = self.pending.lock().take() {
            previous.handle.abort();
        }
    }

    fn claim(&self, generation: u64) -> bool {
        let mut pending = self.pending.lock();
        match pending.as_ref() {
            Some(p) if p.generation == generation => {
                *pending = None;
                true
            }
            _ => false,
        }
    }
}
