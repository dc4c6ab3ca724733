//! End-to-end engine scenarios over temporary directories, using the
//! deterministic lexical embedder and sub-second timers.

use sefs_backend::config::AppConfig;
use sefs_backend::embed::HashEmbedder;
use sefs_backend::engine::{Engine, FileEventKind};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn test_config(root: &Path) -> AppConfig {
    let mut config = AppConfig::from_env();
    config.root_dir = root.to_path_buf();
    config.debounce = Duration::from_millis(30);
    config.recluster_delay = Duration::from_millis(60);
    config.reconcile_interval = Duration::from_millis(100);
    config.ignore_ttl = Duration::from_millis(400);
    config.llm.api_key = None;
    config
}

fn new_engine(root: &Path) -> Arc<Engine> {
    Engine::new(test_config(root), Arc::new(HashEmbedder::new())).unwrap()
}

fn write(path: &Path, body: &str) {
    std::fs::write(path, body).unwrap();
}

fn assert_invariants(engine: &Engine) {
    let snapshot = engine.graph_snapshot();
    let ids: HashSet<usize> = snapshot.clusters.iter().map(|c| c.id).collect();

    // Dense ids [0, M).
    for expected in 0..snapshot.clusters.len() {
        assert!(ids.contains(&expected), "cluster ids are not dense: {ids:?}");
    }

    // Names pairwise distinct.
    let names: HashSet<&str> = snapshot.clusters.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names.len(), snapshot.clusters.len(), "duplicate cluster names");

    // Every assignment references a live cluster, and counts agree.
    for file in &snapshot.files {
        if let Some(id) = file.cluster_id {
            assert!(ids.contains(&id), "file references missing cluster {id}");
        }
    }
    for cluster in &snapshot.clusters {
        let actual = snapshot
            .files
            .iter()
            .filter(|f| f.cluster_id == Some(cluster.id))
            .count();
        assert_eq!(actual, cluster.file_count, "stale file_count");
    }
}

#[tokio::test]
async fn empty_root_yields_empty_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let engine = new_engine(dir.path());
    engine.startup_scan().await;

    assert!(engine.startup_complete());
    let snapshot = engine.graph_snapshot();
    assert!(snapshot.files.is_empty());
    assert!(snapshot.clusters.is_empty());
    assert_eq!(snapshot.total_files, 0);
}

#[tokio::test]
async fn category_promotion_moves_file_into_managed_folder() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("genetics_intro.txt"),
        "An introduction to genetics. The study of heredity examines how dna \
         passes traits between generations.",
    );

    let engine = new_engine(dir.path());
    engine.startup_scan().await;

    let snapshot = engine.graph_snapshot();
    assert_eq!(snapshot.clusters.len(), 1);
    assert_eq!(snapshot.clusters[0].name, "Biology Research");
    assert_eq!(snapshot.clusters[0].file_count, 1);

    let expected = engine
        .config()
        .root_dir
        .join("SEFS_Biology Research")
        .join("genetics_intro.txt");
    assert!(expected.exists(), "file was not organised into its folder");
    assert_eq!(snapshot.files[0].path, expected.to_string_lossy());
    assert_eq!(snapshot.files[0].cluster_id, Some(0));
    assert_invariants(&engine);
}

#[tokio::test]
async fn same_category_groups_merge_into_one_cluster() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..3 {
        write(
            &dir.path().join(format!("quantum{i}.txt")),
            "quantum behaviour of the wave function follows schrodinger",
        );
        write(
            &dir.path().join(format!("newton{i}.txt")),
            "newton linked force to acceleration for moving bodies",
        );
    }

    let engine = new_engine(dir.path());
    engine.startup_scan().await;

    let snapshot = engine.graph_snapshot();
    assert_eq!(snapshot.clusters.len(), 1, "both keyword groups share Physics");
    assert_eq!(snapshot.clusters[0].name, "Physics Research");
    assert_eq!(snapshot.clusters[0].file_count, 6);
    assert!(snapshot.files.iter().all(|f| f.cluster_id == Some(0)));
    assert_invariants(&engine);
}

#[tokio::test]
async fn uncategorized_files_get_term_based_names() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("scratch1.txt"),
        "lorem ipsum dolor sit amet consectetur adipiscing elit sed",
    );
    write(
        &dir.path().join("scratch2.txt"),
        "lorem ipsum dolor magna aliqua ut enim veniam quis nostrud",
    );
    write(
        &dir.path().join("scratch3.txt"),
        "duis aute irure dolor reprehenderit voluptate velit esse cillum",
    );

    let engine = new_engine(dir.path());
    engine.startup_scan().await;

    let snapshot = engine.graph_snapshot();
    assert!(!snapshot.clusters.is_empty());
    let category_names: HashSet<&str> = sefs_backend::cluster::categories::CATEGORIES
        .iter()
        .map(|(name, _)| *name)
        .collect();
    for cluster in &snapshot.clusters {
        assert!(
            !category_names.contains(cluster.name.as_str()),
            "lorem ipsum must not land in a dictionary category: {}",
            cluster.name
        );
        assert!(!cluster.name.is_empty());
    }
    assert_invariants(&engine);
}

#[tokio::test]
async fn single_uncategorized_file_is_general_documents() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("scribble.txt"),
        "zxqv wvut plok mnab grft esdc",
    );

    let engine = new_engine(dir.path());
    engine.startup_scan().await;

    let snapshot = engine.graph_snapshot();
    assert_eq!(snapshot.clusters.len(), 1);
    assert_eq!(snapshot.clusters[0].name, "General Documents");
    assert_invariants(&engine);
}

#[tokio::test]
async fn manual_move_is_absorbed_then_reorganised() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("genetics_intro.txt"),
        "genetics heredity dna chromosome gene mutation evolution",
    );

    let engine = new_engine(dir.path());
    engine.startup_scan().await;

    let root = engine.config().root_dir.clone();
    let settled = root.join("SEFS_Biology Research").join("genetics_intro.txt");
    assert!(settled.exists());

    // Let the startup move's ignore entries lapse, then drag the file into a
    // different managed folder the way a user would.
    tokio::time::sleep(Duration::from_millis(450)).await;
    let foreign = root.join("SEFS_Physics Research");
    std::fs::create_dir_all(&foreign).unwrap();
    let dragged = foreign.join("genetics_intro.txt");
    std::fs::rename(&settled, &dragged).unwrap();

    engine.handle_event(FileEventKind::Created, dragged.clone()).await;

    // The move was absorbed without re-ingesting.
    let snapshot = engine.graph_snapshot();
    assert_eq!(snapshot.total_files, 1);
    assert_eq!(snapshot.files[0].path, dragged.to_string_lossy());

    // The next reclustering pulls it back where its content belongs.
    engine.force_recluster().await;
    let snapshot = engine.graph_snapshot();
    assert_eq!(snapshot.clusters[0].name, "Biology Research");
    assert_eq!(snapshot.files[0].path, settled.to_string_lossy());
    assert!(settled.exists());
    assert!(
        !foreign.exists(),
        "emptied managed folder should be cleaned up"
    );
    assert_invariants(&engine);
}

#[tokio::test]
async fn rename_outside_managed_folders_keeps_embedding() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("plain_notes.txt"),
        "zxqv wvut plok mnab grft esdc",
    );

    let engine = new_engine(dir.path());
    engine.startup_scan().await;
    let root = engine.config().root_dir.clone();

    tokio::time::sleep(Duration::from_millis(450)).await;

    // General Documents holds the file now; move it back to the root. The
    // basename must stay the same for move detection to apply.
    let old_path = root.join("SEFS_General Documents").join("plain_notes.txt");
    assert!(old_path.exists());
    let new_path = root.join("plain_notes.txt");
    std::fs::rename(&old_path, &new_path).unwrap();

    let word_count_before = engine.graph_snapshot().files[0].word_count;
    engine
        .handle_event(FileEventKind::Created, new_path.clone())
        .await;

    let snapshot = engine.graph_snapshot();
    assert_eq!(snapshot.total_files, 1);
    assert_eq!(snapshot.files[0].path, new_path.to_string_lossy());
    assert_eq!(snapshot.files[0].word_count, word_count_before);
}

#[tokio::test]
async fn deletion_is_visible_and_folder_cleaned_on_next_recluster() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("genetics_intro.txt"),
        "genetics heredity dna chromosome gene mutation",
    );
    write(
        &dir.path().join("quantum_paper.txt"),
        "quantum schrodinger wave function particle physics",
    );

    let engine = new_engine(dir.path());
    engine.startup_scan().await;
    let root = engine.config().root_dir.clone();

    let snapshot = engine.graph_snapshot();
    assert_eq!(snapshot.clusters.len(), 2);

    // Delete the quantum paper on disk; the reconciler notices the ghost.
    let quantum = root.join("SEFS_Physics Research").join("quantum_paper.txt");
    assert!(quantum.exists());
    std::fs::remove_file(&quantum).unwrap();

    engine.reconcile_once().await;
    let snapshot = engine.graph_snapshot();
    assert_eq!(snapshot.total_files, 1);
    assert!(snapshot.files.iter().all(|f| f.name != "quantum_paper.txt"));

    engine.force_recluster().await;
    let snapshot = engine.graph_snapshot();
    assert_eq!(snapshot.clusters.len(), 1);
    assert_eq!(snapshot.clusters[0].name, "Biology Research");
    assert!(
        !root.join("SEFS_Physics Research").exists(),
        "empty managed folder survives reclustering"
    );
    assert_invariants(&engine);
}

#[tokio::test]
async fn reconciler_ingests_files_dropped_behind_the_watchers_back() {
    let dir = tempfile::tempdir().unwrap();
    let engine = new_engine(dir.path());
    engine.startup_scan().await;
    let root = engine.config().root_dir.clone();

    write(
        &root.join("genetics_intro.txt"),
        "genetics heredity dna chromosome gene mutation",
    );

    engine.reconcile_once().await;
    let snapshot = engine.graph_snapshot();
    assert_eq!(snapshot.total_files, 1);

    engine.force_recluster().await;
    let snapshot = engine.graph_snapshot();
    assert_eq!(snapshot.clusters[0].name, "Biology Research");
    assert!(
        root.join("SEFS_Biology Research")
            .join("genetics_intro.txt")
            .exists()
    );
}

#[tokio::test]
async fn internal_moves_produce_no_further_ingest() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("genetics_intro.txt"),
        "genetics heredity dna chromosome gene mutation",
    );

    let engine = new_engine(dir.path());
    engine.startup_scan().await;
    let root = engine.config().root_dir.clone();

    // Replay what the watcher would emit for the organiser's own move:
    // deleted(old) + created(new). Both ends are marked ignored, so the
    // index must not change.
    let before = engine.graph_snapshot();
    let old_path = root.join("genetics_intro.txt");
    let new_path = root.join("SEFS_Biology Research").join("genetics_intro.txt");
    engine.handle_event(FileEventKind::Deleted, old_path).await;
    engine.handle_event(FileEventKind::Created, new_path).await;

    let after = engine.graph_snapshot();
    assert_eq!(after.total_files, before.total_files);
    assert_eq!(after.files[0].path, before.files[0].path);
}

#[tokio::test]
async fn burst_of_arrivals_triggers_exactly_one_reclustering() {
    let dir = tempfile::tempdir().unwrap();
    let engine = new_engine(dir.path());
    engine.startup_scan().await;
    let root = engine.config().root_dir.clone();

    let baseline = count_log_kind(&engine, "cluster");

    for i in 0..4 {
        let path = root.join(format!("burst{i}.txt"));
        write(&path, "quantum schrodinger wave function particle");
        engine.handle_event(FileEventKind::Created, path).await;
    }

    // Wait out the quiet period plus the reclustering itself.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let reclusterings = count_log_kind(&engine, "cluster") - baseline;
    assert_eq!(reclusterings, 1, "burst must batch into one reclustering");
    let snapshot = engine.graph_snapshot();
    assert_eq!(snapshot.total_files, 4);
    assert_eq!(snapshot.clusters[0].name, "Physics Research");
}

#[tokio::test]
async fn modified_event_for_indexed_path_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("genetics_intro.txt"),
        "genetics heredity dna chromosome gene mutation",
    );

    let engine = new_engine(dir.path());
    engine.startup_scan().await;
    let root = engine.config().root_dir.clone();
    let settled = root.join("SEFS_Biology Research").join("genetics_intro.txt");

    tokio::time::sleep(Duration::from_millis(450)).await;

    let before = engine.graph_snapshot().files[0].word_count;
    write(&settled, "entirely different content now with many extra words");
    engine.handle_event(FileEventKind::Modified, settled).await;

    // Redundant modify on an indexed path is not re-ingested.
    assert_eq!(engine.graph_snapshot().files[0].word_count, before);
}

#[tokio::test]
async fn whitespace_only_files_are_dropped_before_indexing() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("blank.txt"), "   \n\t  \n");

    let engine = new_engine(dir.path());
    engine.startup_scan().await;

    assert_eq!(engine.graph_snapshot().total_files, 0);
}

#[tokio::test]
async fn cold_starts_are_deterministic_in_the_pca_regime() {
    let bodies = [
        ("alpha.txt", "zxqv wvut plok mnab grft esdc alpha"),
        ("beta.txt", "zxqv wvut plok mnab grft esdc beta"),
        ("gamma.txt", "completely different words entirely here gamma"),
        ("delta.txt", "completely different words entirely here delta"),
    ];

    let mut results = Vec::new();
    for _ in 0..2 {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in &bodies {
            write(&dir.path().join(name), body);
        }
        let engine = new_engine(dir.path());
        engine.startup_scan().await;

        let snapshot = engine.graph_snapshot();
        let mut by_name: Vec<(String, Option<usize>, [f32; 3], String)> = snapshot
            .files
            .iter()
            .map(|f| {
                let cluster_name = snapshot
                    .clusters
                    .iter()
                    .find(|c| Some(c.id) == f.cluster_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_default();
                (f.name.clone(), f.cluster_id, f.position, cluster_name)
            })
            .collect();
        by_name.sort_by(|a, b| a.0.cmp(&b.0));
        results.push(by_name);
    }

    assert_eq!(results[0], results[1], "cold starts diverged");
}

#[tokio::test]
async fn upload_batch_reclusters_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let engine = new_engine(dir.path());
    engine.startup_scan().await;
    let root = engine.config().root_dir.clone();

    let staging = root.join(".staging");
    let a = staging.join("quantum_a.txt");
    let b = staging.join("quantum_b.txt");
    write(&a, "quantum schrodinger wave function particle");
    write(&b, "quantum schrodinger wave function momentum");

    engine.ingest_batch(vec![a, b]).await;

    let snapshot = engine.graph_snapshot();
    assert_eq!(snapshot.total_files, 2);
    assert_eq!(snapshot.clusters[0].name, "Physics Research");
    for file in &snapshot.files {
        assert!(
            file.path.contains("SEFS_Physics Research"),
            "uploaded files must leave staging: {}",
            file.path
        );
    }
    assert_invariants(&engine);
}

fn count_log_kind(engine: &Engine, kind: &str) -> usize {
    engine
        .recent_logs(50)
        .iter()
        .filter(|entry| entry.kind == kind)
        .count()
}
