//! File-system event source.
//!
//! A recursive notify watcher over the managed root feeds classified events
//! into the per-path debouncer. Moves are decomposed into `deleted(src)` +
//! `created(dst)`. The watcher does not filter managed subfolders: user
//! actions inside them are legitimate events, and internal moves are handled
//! by the ignore registry. It does drop directory events, hidden files,
//! anything under the staging directory, and unsupported extensions.

use crate::config::{STAGING_DIR, is_supported_extension};
use crate::engine::debounce::Debouncer;
use crate::engine::{Engine, FileEventKind};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Start watching the engine's root. The returned watcher must be kept
/// alive for the lifetime of the process.
pub fn spawn(engine: Arc<Engine>) -> notify::Result<RecommendedWatcher> {
    let root = engine.config().root_dir.clone();

    // Raw notify callbacks run on the watcher's own thread; hand events to
    // the async side through a channel.
    let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
    let mut watcher = notify::recommended_watcher(move |result| {
        let _ = raw_tx.send(result);
    })?;
    watcher.watch(&root, RecursiveMode::Recursive)?;

    // Debounced deliveries feed the ingest pipeline.
    let (debounced_tx, mut debounced_rx) = mpsc::unbounded_channel::<(FileEventKind, PathBuf)>();
    let debouncer = Debouncer::new(engine.config().debounce, debounced_tx);

    tokio::spawn(async move {
        while let Some(result) = raw_rx.recv().await {
            match result {
                Ok(event) => dispatch(&debouncer, event),
                Err(e) => warn!("Watcher error: {}", e),
            }
        }
    });

    let pipeline_engine = Arc::clone(&engine);
    tokio::spawn(async move {
        while let Some((kind, path)) = debounced_rx.recv().await {
            pipeline_engine.handle_event(kind, path).await;
        }
    });

    info!("Watching: {}", root.display());
    Ok(watcher)
}

fn dispatch(debouncer: &Arc<Debouncer>, event: Event) {
    match classify(&event.kind) {
        Classified::Single(kind) => {
            for path in event.paths {
                submit_if_relevant(debouncer, kind, path);
            }
        }
        Classified::Rename => {
            // Decompose into deleted(src) + created(dst).
            let mut paths = event.paths.into_iter();
            if let Some(src) = paths.next() {
                submit_if_relevant(debouncer, FileEventKind::Deleted, src);
            }
            if let Some(dst) = paths.next() {
                submit_if_relevant(debouncer, FileEventKind::Created, dst);
            }
        }
        Classified::Skip => {}
    }
}

enum Classified {
    Single(FileEventKind),
    Rename,
    Skip,
}

fn classify(kind: &EventKind) -> Classified {
    match kind {
        EventKind::Create(_) => Classified::Single(FileEventKind::Created),
        EventKind::Remove(_) => Classified::Single(FileEventKind::Deleted),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => Classified::Single(FileEventKind::Deleted),
            RenameMode::To => Classified::Single(FileEventKind::Created),
            _ => Classified::Rename,
        },
        EventKind::Modify(_) => Classified::Single(FileEventKind::Modified),
        _ => Classified::Skip,
    }
}

fn submit_if_relevant(debouncer: &Arc<Debouncer>, kind: FileEventKind, path: PathBuf) {
    if is_relevant(&path) {
        debouncer.submit(kind, path);
    }
}

/// Filter rule: no directories, nothing hidden, nothing under the staging
/// directory, and only supported extensions. Managed subfolders are NOT
/// filtered here; user actions inside them must flow through.
fn is_relevant(path: &Path) -> bool {
    // A directory that still exists is never relevant; for deleted paths the
    // extension check below rejects directories anyway.
    if path.is_dir() {
        return false;
    }

    if path.components().any(|c| c.as_os_str() == STAGING_DIR) {
        return false;
    }

    let Some(name) = path.file_name() else {
        return false;
    };
    if name.to_string_lossy().starts_with('.') {
        return false;
    }

    let ext = path
        .extension()
        .unwrap_or_default()
        .to_string_lossy()
        .to_lowercase();
    is_supported_extension(&ext)
}
