//! The live pipeline engine.
//!
//! One `Engine` aggregate owns every piece of shared state: the in-memory
//! index, the cluster table, the ignore registry, the activity log, the
//! recluster scheduler, and the broadcast channel. The `pipeline` mutex is
//! the outermost lock: single-file ingest, batch ingest, reclustering,
//! reconciliation, and the startup scan all serialize on it.

pub mod debounce;
pub mod ignore;
pub mod index;
pub mod reconcile;
pub mod scheduler;

use crate::cluster::categories::KeywordMatcher;
use crate::cluster::naming::ClusterNamer;
use crate::cluster::{self, FileSnapshot, PartitionOptions};
use crate::config::AppConfig;
use crate::embed::{Embedder, embed_document};
use crate::error::{AppError, AppResult};
use crate::extract;
use crate::organiser;
use crate::state::{FileNode, GraphSnapshot, ServerEvent};
use index::{ActivityLog, Cluster, CoreState, FileRecord, normalize_path};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Classified file-system event kinds flowing through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Created,
    Modified,
    Deleted,
}

pub struct Engine {
    config: AppConfig,
    embedder: Arc<dyn Embedder>,
    /// Outermost lock; serializes ingest, reclustering, reconciliation and
    /// the startup scan. May be held across suspension points.
    pipeline: tokio::sync::Mutex<()>,
    state: Mutex<CoreState>,
    ignore: ignore::IgnoreRegistry,
    activity: ActivityLog,
    scheduler: scheduler::ReclusterScheduler,
    namer: ClusterNamer,
    matcher: Arc<KeywordMatcher>,
    events: broadcast::Sender<ServerEvent>,
    startup_done: AtomicBool,
    /// Back-reference for handing `Arc<Engine>` clones to spawned timers.
    self_ref: OnceLock<Weak<Engine>>,
}

impl Engine {
    /// Create the engine, ensuring the managed root and staging directory
    /// exist and pinning the root to its canonical form.
    pub fn new(mut config: AppConfig, embedder: Arc<dyn Embedder>) -> AppResult<Arc<Self>> {
        std::fs::create_dir_all(&config.root_dir)?;
        std::fs::create_dir_all(config.staging_dir())?;
        config.root_dir = dunce::canonicalize(&config.root_dir)?;

        let (events, _) = broadcast::channel(1024);
        let scheduler = scheduler::ReclusterScheduler::new(config.recluster_delay);
        let ignore = ignore::IgnoreRegistry::new(config.ignore_ttl);
        let namer = ClusterNamer::new(&config);

        let engine = Arc::new(Self {
            config,
            embedder,
            pipeline: tokio::sync::Mutex::new(()),
            state: Mutex::new(CoreState::default()),
            ignore,
            activity: ActivityLog::new(),
            scheduler,
            namer,
            matcher: Arc::new(KeywordMatcher::new()),
            events,
            startup_done: AtomicBool::new(false),
            self_ref: OnceLock::new(),
        });
        let _ = engine.self_ref.set(Arc::downgrade(&engine));
        Ok(engine)
    }

    fn arc(&self) -> Option<Arc<Engine>> {
        self.self_ref.get().and_then(Weak::upgrade)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub(crate) fn scheduler(&self) -> &scheduler::ReclusterScheduler {
        &self.scheduler
    }

    pub fn startup_complete(&self) -> bool {
        self.startup_done.load(Ordering::Acquire)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    pub fn recent_logs(&self, count: usize) -> Vec<index::ActivityEntry> {
        self.activity.recent(count)
    }

    /// Append to the activity ring and push the delta to subscribers.
    pub fn log_and_broadcast(&self, kind: &str, message: impl Into<String>, icon: &str) {
        let entry = self.activity.add(kind, message, icon);
        let _ = self.events.send(ServerEvent::ActivityLogEntry { entry });
    }

    /// Build the current snapshot. Unassigned files render as "Unknown".
    pub fn graph_snapshot(&self) -> GraphSnapshot {
        let state = self.state.lock();
        let files: Vec<FileNode> = state
            .files
            .values()
            .map(|record| {
                let cluster = record.cluster_id.and_then(|id| state.clusters.get(&id));
                FileNode {
                    id: record.path.to_string_lossy().to_string(),
                    path: record.path.to_string_lossy().to_string(),
                    name: record.name.clone(),
                    snippet: record.snippet.clone(),
                    word_count: record.word_count,
                    cluster_id: record.cluster_id,
                    cluster_name: cluster
                        .map(|c| c.name.clone())
                        .unwrap_or_else(|| "Unknown".to_string()),
                    color: cluster
                        .map(|c| c.color.clone())
                        .unwrap_or_else(|| "#888888".to_string()),
                    keywords: record.keywords.clone(),
                    position: record.position,
                }
            })
            .collect();
        let clusters: Vec<Cluster> = state.clusters.values().cloned().collect();
        let total_files = files.len();
        GraphSnapshot {
            files,
            clusters,
            total_files,
        }
    }

    pub fn broadcast_snapshot(&self) {
        let _ = self
            .events
            .send(ServerEvent::GraphUpdate(self.graph_snapshot()));
    }

    /// Entry point for debounced watcher events: ingest one file, then push
    /// the recluster timer back.
    pub async fn handle_event(&self, kind: FileEventKind, path: PathBuf) {
        {
            let _guard = self.pipeline.lock().await;
            self.ingest_one(kind, &path, true).await;
        }
        if let Some(engine) = self.arc() {
            self.scheduler.schedule(engine);
        }
    }

    /// Ingest a batch (uploads), then recluster immediately instead of
    /// waiting out the timer.
    pub async fn ingest_batch(&self, paths: Vec<PathBuf>) {
        {
            let _guard = self.pipeline.lock().await;
            for path in &paths {
                self.ingest_one(FileEventKind::Created, path, true).await;
            }
        }
        self.force_recluster().await;
    }

    /// Run a reclustering now, cancelling any pending timer.
    pub async fn force_recluster(&self) {
        self.scheduler.cancel();
        self.run_recluster().await;
    }

    /// The scheduler's fire path: one global reclustering under the
    /// pipeline lock, then one snapshot broadcast.
    pub async fn run_recluster(&self) {
        let n = self.state.lock().files.len();
        if n == 0 {
            self.state.lock().clusters.clear();
            self.broadcast_snapshot();
            return;
        }

        self.log_and_broadcast("cluster", format!("Clustering {n} files..."), "📊");
        {
            let _guard = self.pipeline.lock().await;
            if let Err(e) = self.recluster_locked().await {
                warn!("Reclustering failed: {}", e);
            }
        }
        self.broadcast_snapshot();
    }

    /// Process one debounced `(kind, path)` event. Caller holds the pipeline
    /// lock. `announce` controls the per-file log entries (the startup scan
    /// ingests quietly).
    pub(crate) async fn ingest_one(&self, kind: FileEventKind, path: &Path, announce: bool) {
        if self.ignore.is_ignored(path) {
            return;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if kind == FileEventKind::Deleted {
            let removed = self.state.lock().remove_deleted(path);
            if let Some(record) = removed {
                self.log_and_broadcast("delete", format!("Removed: {}", record.name), "🗑️");
                // Deletions must be visible without waiting for a recluster.
                self.broadcast_snapshot();
            }
            return;
        }

        // A record with this basename whose stored path vanished means the
        // user moved the file; absorb it without re-embedding.
        if let Some(moved) = self.state.lock().rekey_moved(path) {
            self.log_and_broadcast("move", format!("Moved: {moved}"), "📁");
            return;
        }

        // Redundant modify for content already indexed under this path.
        if kind == FileEventKind::Modified && self.state.lock().files.contains_key(path) {
            return;
        }

        if !path.exists() {
            return;
        }

        if announce {
            self.log_and_broadcast("detect", format!("Processing: {file_name}"), "👁️");
        }

        let text = {
            let owned = path.to_path_buf();
            match tokio::task::spawn_blocking(move || extract::extract_text(&owned)).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Extraction task failed for {}: {}", path.display(), e);
                    return;
                }
            }
        };

        if text.trim().is_empty() {
            if announce {
                self.log_and_broadcast("warning", format!("No text in {file_name}, skipping"), "⚠️");
            }
            return;
        }

        let word_count = text.split_whitespace().count();
        if announce {
            self.log_and_broadcast(
                "extract",
                format!("Extracted {word_count} words from {file_name}"),
                "📄",
            );
        }

        let embedding = {
            let embedder = Arc::clone(&self.embedder);
            let body = text.clone();
            match tokio::task::spawn_blocking(move || embed_document(embedder.as_ref(), &body))
                .await
            {
                Ok(Ok(embedding)) => embedding,
                Ok(Err(e)) => {
                    warn!("Embedding failed for {}: {}", path.display(), e);
                    return;
                }
                Err(e) => {
                    warn!("Embedding task failed for {}: {}", path.display(), e);
                    return;
                }
            }
        };

        if announce {
            self.log_and_broadcast("embed", format!("Embedded: {file_name}"), "🧠");
        }

        let record = FileRecord {
            name: file_name,
            path: path.to_path_buf(),
            snippet: extract::snippet(&text),
            word_count,
            keywords: cluster::terms::extract_keywords(&text, 5),
            text,
            embedding,
            cluster_id: None,
            position: [0.0; 3],
        };
        self.state.lock().files.insert(path.to_path_buf(), record);
    }

    /// Steps 1–7 of a reclustering. Caller holds the pipeline lock.
    async fn recluster_locked(&self) -> AppResult<()> {
        let rows: Vec<FileSnapshot> = {
            let state = self.state.lock();
            state
                .files
                .values()
                .map(|record| FileSnapshot {
                    path: record.path.clone(),
                    name: record.name.clone(),
                    text: record.text.clone(),
                    embedding: record.embedding.clone(),
                })
                .collect()
        };
        if rows.is_empty() {
            self.state.lock().clusters.clear();
            return Ok(());
        }

        // Grouping and layout are pure CPU work.
        let options = PartitionOptions {
            max_k: self.config.max_k,
            file_score_min: self.config.file_score_min,
        };
        let (rows, partition) = {
            let matcher = Arc::clone(&self.matcher);
            tokio::task::spawn_blocking(move || {
                let partition = cluster::partition(&matcher, &rows, &options);
                (rows, partition)
            })
            .await
            .map_err(|e| AppError::Clustering(format!("partition task failed: {e}")))?
        };

        // Assign provisional ids: category clusters first, then k-means
        // siblings, then a lone leftover file.
        let mut names: Vec<String> = Vec::new();
        let mut assignment = vec![0usize; rows.len()];

        for (category, indices) in &partition.categorized {
            let id = names.len();
            names.push(category.clone());
            for index in indices {
                assignment[*index] = id;
            }
        }

        for group in &partition.subclusters {
            let texts: Vec<&str> = group.iter().map(|i| rows[*i].text.as_str()).collect();
            let file_names: Vec<&str> = group.iter().map(|i| rows[*i].name.as_str()).collect();
            let name = self
                .namer
                .name_group(&self.matcher, &texts, &file_names)
                .await;
            let id = names.len();
            names.push(name);
            for index in group {
                assignment[*index] = id;
            }
        }

        if !partition.lone_uncategorized.is_empty() {
            let id = names.len();
            names.push("General Documents".to_string());
            for index in &partition.lone_uncategorized {
                assignment[*index] = id;
            }
        }

        // Steps 4 + 5: de-duplicate names, renumber densely.
        let dense_names = cluster::dedup_and_densify(&names, &mut assignment);

        // Rebuild the cluster table and write assignments + positions back.
        {
            let mut state = self.state.lock();
            let mut file_counts = vec![0usize; dense_names.len()];
            for id in &assignment {
                file_counts[*id] += 1;
            }

            state.clusters = dense_names
                .iter()
                .enumerate()
                .map(|(id, name)| {
                    (
                        id,
                        Cluster {
                            id,
                            name: name.clone(),
                            color: crate::config::cluster_color(id).to_string(),
                            file_count: file_counts[id],
                        },
                    )
                })
                .collect();

            for (i, row) in rows.iter().enumerate() {
                if let Some(record) = state.files.get_mut(&row.path) {
                    record.cluster_id = Some(assignment[i]);
                    record.position = partition.positions.get(i).copied().unwrap_or([0.0; 3]);
                }
            }
        }

        // Step 7: mirror the new assignments to disk.
        let assignments_by_path: BTreeMap<PathBuf, usize> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row.path.clone(), assignment[i]))
            .collect();
        let names_by_id: BTreeMap<usize, String> = dense_names
            .iter()
            .enumerate()
            .map(|(id, name)| (id, name.clone()))
            .collect();
        let cluster_map = organiser::build_cluster_map(&assignments_by_path, &names_by_id);

        self.premark_moves(&cluster_map);

        let moves = {
            let root = self.config.root_dir.clone();
            let prefix = self.config.folder_prefix.clone();
            let map = cluster_map;
            tokio::task::spawn_blocking(move || organiser::sync_folders(&root, &prefix, &map))
                .await
                .map_err(|e| AppError::Clustering(format!("folder sync task failed: {e}")))?
        };
        self.apply_moves(&moves);

        self.log_and_broadcast(
            "sync",
            format!(
                "Organized {} files into {} folders ✓",
                rows.len(),
                dense_names.len()
            ),
            "✅",
        );
        Ok(())
    }

    /// Mark both ends of every upcoming organiser move so the watcher's
    /// resulting deleted/created pairs are dropped.
    fn premark_moves(&self, cluster_map: &BTreeMap<String, Vec<PathBuf>>) {
        for (name, files) in cluster_map {
            let dest_folder = self
                .config
                .root_dir
                .join(format!("{}{}", self.config.folder_prefix, name));
            for file in files {
                if file.parent() == Some(dest_folder.as_path()) {
                    continue;
                }
                self.ignore.mark(file);
                if let Some(base) = file.file_name() {
                    self.ignore.mark(&dest_folder.join(base));
                }
            }
        }
    }

    /// Rewrite index keys for moves the organiser performed, re-marking both
    /// ends (collision-suffixed destinations were not premarked).
    fn apply_moves(&self, moves: &HashMap<PathBuf, PathBuf>) {
        if moves.is_empty() {
            return;
        }
        let mut state = self.state.lock();
        for (old_path, new_path) in moves {
            self.ignore.mark(old_path);
            self.ignore.mark(new_path);
            state.rekey(old_path, new_path);
        }
    }

    /// Boot sequence: enumerate everything on disk, ingest quietly, run one
    /// immediate reclustering, then open the gate for the reconciler.
    pub async fn startup_scan(&self) {
        self.log_and_broadcast("startup", "Scanning for existing files...", "🔍");

        let found =
            reconcile::scan_supported_files(&self.config.root_dir, &self.config.folder_prefix);

        if found.is_empty() {
            self.log_and_broadcast("startup", "No files found. Drop files to begin!", "📂");
            self.startup_done.store(true, Ordering::Release);
            return;
        }

        self.log_and_broadcast(
            "startup",
            format!("Found {} files, processing...", found.len()),
            "📂",
        );

        {
            let _guard = self.pipeline.lock().await;
            self.state.lock().files.clear();
            for path in &found {
                self.ingest_one(FileEventKind::Created, path, false).await;
            }

            let ingested = self.state.lock().files.len();
            if ingested > 0 {
                self.log_and_broadcast("cluster", format!("Clustering {ingested} files..."), "📊");
                if let Err(e) = self.recluster_locked().await {
                    warn!("Startup reclustering failed: {}", e);
                }
            }
        }

        self.broadcast_snapshot();
        self.startup_done.store(true, Ordering::Release);
        let total = self.state.lock().files.len();
        self.log_and_broadcast("startup", format!("Ready — {total} files organized."), "🚀");
        info!("Startup scan complete: {} files", total);
    }

    /// One reconciliation sweep: drop ghosts, ingest orphans, and when
    /// anything changed broadcast immediately and schedule a reclustering.
    pub async fn reconcile_once(&self) {
        let mut changed = false;
        {
            let _guard = self.pipeline.lock().await;

            let ghosts: Vec<PathBuf> = {
                let state = self.state.lock();
                state
                    .files
                    .keys()
                    .filter(|path| !path.exists())
                    .cloned()
                    .collect()
            };
            for ghost in ghosts {
                let removed = self.state.lock().files.remove(&ghost);
                if let Some(record) = removed {
                    self.log_and_broadcast(
                        "delete",
                        format!("Removed (missing): {}", record.name),
                        "🗑️",
                    );
                    changed = true;
                }
            }

            let known: HashSet<String> = {
                let state = self.state.lock();
                state.files.keys().map(|path| normalize_path(path)).collect()
            };
            let on_disk =
                reconcile::scan_supported_files(&self.config.root_dir, &self.config.folder_prefix);
            for path in on_disk {
                if !known.contains(&normalize_path(&path)) {
                    self.ingest_one(FileEventKind::Created, &path, true).await;
                    changed = true;
                }
            }
        }

        if changed {
            self.broadcast_snapshot();
            if let Some(engine) = self.arc() {
                self.scheduler.schedule(engine);
            }
        }
    }
}
