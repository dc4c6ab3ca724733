//! The hybrid grouping algorithm.
//!
//! Pure embedding clustering merges semantically distinct but geometrically
//! near groups; pure keyword matching misses novel content. The pipeline
//! combines them: a per-file keyword pass promotes strong category signals
//! into clusters directly, and only the leftover pool is clustered by
//! embedding k-means and named by the cascade in [`naming`].

pub mod categories;
pub mod kmeans;
pub mod layout;
pub mod naming;
pub mod terms;

use categories::KeywordMatcher;
use ndarray::Array2;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;

/// Immutable view of one indexed file, captured under the pipeline lock.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    pub path: PathBuf,
    pub name: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Copy)]
pub struct PartitionOptions {
    pub max_k: usize,
    pub file_score_min: u32,
}

/// Grouping result, before naming and id assignment. Indices refer to the
/// snapshot row order.
#[derive(Debug, Default)]
pub struct Partition {
    pub positions: Vec<[f32; 3]>,
    /// Dictionary-category clusters, in first-encounter order.
    pub categorized: Vec<(String, Vec<usize>)>,
    /// K-means groups of the uncategorized pool (present when ≥ 2 files
    /// stayed uncategorized), in ascending label order.
    pub subclusters: Vec<Vec<usize>>,
    /// A single leftover uncategorized file, if any.
    pub lone_uncategorized: Vec<usize>,
}

/// Steps 1–3 and 6 of a reclustering: per-file category detection, grouping,
/// k-means subclustering of the remainder, and the 3D layout. Pure CPU work,
/// safe to run on a blocking thread.
pub fn partition(
    matcher: &KeywordMatcher,
    rows: &[FileSnapshot],
    options: &PartitionOptions,
) -> Partition {
    if rows.is_empty() {
        return Partition::default();
    }

    let embeddings = embedding_matrix(rows);
    let positions = layout::positions_3d(&embeddings);

    // Step 1: per-file category detection, parallel over files.
    let file_categories: Vec<Option<&'static str>> = rows
        .par_iter()
        .map(|row| matcher.best_file_category(&row.text, &row.name, options.file_score_min))
        .collect();

    // Step 2: group by category, first-encounter order.
    let mut categorized: Vec<(String, Vec<usize>)> = Vec::new();
    let mut category_slot: HashMap<&str, usize> = HashMap::new();
    let mut uncategorized: Vec<usize> = Vec::new();

    for (index, category) in file_categories.iter().enumerate() {
        match category {
            Some(name) => {
                let slot = *category_slot.entry(name).or_insert_with(|| {
                    categorized.push((name.to_string(), Vec::new()));
                    categorized.len() - 1
                });
                categorized[slot].1.push(index);
            }
            None => uncategorized.push(index),
        }
    }

    // Step 3: k-means over the uncategorized pool.
    let mut subclusters: Vec<Vec<usize>> = Vec::new();
    let mut lone_uncategorized: Vec<usize> = Vec::new();

    if uncategorized.len() >= 2 {
        let pool = select_rows(&embeddings, &uncategorized);
        let labels = kmeans::cluster_auto_k(&pool, options.max_k);

        let mut by_label: HashMap<usize, Vec<usize>> = HashMap::new();
        for (local, label) in labels.iter().enumerate() {
            by_label
                .entry(*label)
                .or_default()
                .push(uncategorized[local]);
        }
        let mut labels_sorted: Vec<usize> = by_label.keys().copied().collect();
        labels_sorted.sort_unstable();
        for label in labels_sorted {
            subclusters.push(by_label.remove(&label).unwrap_or_default());
        }
    } else {
        lone_uncategorized = uncategorized;
    }

    Partition {
        positions,
        categorized,
        subclusters,
        lone_uncategorized,
    }
}

/// Step 4 + 5: merge provisional clusters whose names collide (the earlier
/// id wins) and renumber the survivors densely in ascending id order.
/// `assignment` maps row index → provisional id and is rewritten in place to
/// dense ids. Returns the dense id → name table.
pub fn dedup_and_densify(names: &[String], assignment: &mut [usize]) -> Vec<String> {
    let mut canonical: Vec<usize> = (0..names.len()).collect();
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (id, name) in names.iter().enumerate() {
        match seen.get(name.as_str()) {
            Some(first) => canonical[id] = *first,
            None => {
                seen.insert(name.as_str(), id);
            }
        }
    }

    let mut dense_of: HashMap<usize, usize> = HashMap::new();
    let mut dense_names: Vec<String> = Vec::new();
    for (id, name) in names.iter().enumerate() {
        if canonical[id] == id {
            dense_of.insert(id, dense_names.len());
            dense_names.push(name.clone());
        }
    }

    for slot in assignment.iter_mut() {
        *slot = dense_of[&canonical[*slot]];
    }

    dense_names
}

fn embedding_matrix(rows: &[FileSnapshot]) -> Array2<f64> {
    let d = rows
        .iter()
        .map(|r| r.embedding.len())
        .max()
        .unwrap_or(1)
        .max(1);
    let mut matrix = Array2::zeros((rows.len(), d));
    for (i, row) in rows.iter().enumerate() {
        for (j, value) in row.embedding.iter().take(d).enumerate() {
            matrix[[i, j]] = *value as f64;
        }
    }
    matrix
}

fn select_rows(matrix: &Array2<f64>, indices: &[usize]) -> Array2<f64> {
    let d = matrix.ncols();
    let mut out = Array2::zeros((indices.len(), d));
    for (local, index) in indices.iter().enumerate() {
        out.row_mut(local).assign(&matrix.row(*index));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(name: &str, text: &str, embedding: Vec<f32>) -> FileSnapshot {
        FileSnapshot {
            path: PathBuf::from(format!("/tmp/{name}")),
            name: name.to_string(),
            text: text.to_string(),
            embedding,
        }
    }

    fn options() -> PartitionOptions {
        PartitionOptions {
            max_k: 8,
            file_score_min: 2,
        }
    }

    #[test]
    fn keyword_files_group_by_category() {
        let matcher = KeywordMatcher::new();
        let rows = vec![
            snapshot("genetics.txt", "genetics heredity dna", vec![1.0, 0.0]),
            snapshot("cells.txt", "cell biology protein dna", vec![0.9, 0.1]),
            snapshot("quantum.txt", "quantum schrodinger wave function", vec![0.0, 1.0]),
        ];
        let partition = partition(&matcher, &rows, &options());
        assert_eq!(partition.categorized.len(), 2);
        assert_eq!(partition.categorized[0].0, "Biology Research");
        assert_eq!(partition.categorized[0].1, vec![0, 1]);
        assert_eq!(partition.categorized[1].0, "Physics Research");
        assert_eq!(partition.categorized[1].1, vec![2]);
        assert!(partition.subclusters.is_empty());
        assert!(partition.lone_uncategorized.is_empty());
        assert_eq!(partition.positions.len(), 3);
    }

    #[test]
    fn single_uncategorized_file_is_lone() {
        let matcher = KeywordMatcher::new();
        let rows = vec![snapshot("misc.txt", "zzz yyy xxx", vec![0.5, 0.5])];
        let partition = partition(&matcher, &rows, &options());
        assert!(partition.categorized.is_empty());
        assert_eq!(partition.lone_uncategorized, vec![0]);
    }

    #[test]
    fn uncategorized_pool_splits_by_embedding() {
        let matcher = KeywordMatcher::new();
        let rows = vec![
            snapshot("a1.txt", "aaa bbb", vec![0.0, 0.0]),
            snapshot("a2.txt", "aaa ccc", vec![0.1, 0.0]),
            snapshot("b1.txt", "ddd eee", vec![10.0, 10.0]),
            snapshot("b2.txt", "ddd fff", vec![10.1, 10.0]),
        ];
        let partition = partition(&matcher, &rows, &options());
        assert!(partition.categorized.is_empty());
        assert_eq!(partition.subclusters.len(), 2);
        let mut groups = partition.subclusters.clone();
        groups.sort();
        assert_eq!(groups, vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn dedup_merges_collisions_and_renumbers_densely() {
        let names = vec![
            "Physics Research".to_string(),
            "Lorem Ipsum".to_string(),
            "Physics Research".to_string(),
            "Notes".to_string(),
        ];
        let mut assignment = vec![0, 1, 2, 2, 3];
        let dense = dedup_and_densify(&names, &mut assignment);
        assert_eq!(
            dense,
            vec![
                "Physics Research".to_string(),
                "Lorem Ipsum".to_string(),
                "Notes".to_string()
            ]
        );
        assert_eq!(assignment, vec![0, 1, 0, 0, 2]);
    }

    #[test]
    fn dedup_keeps_unique_names_untouched() {
        let names = vec!["A".to_string(), "B".to_string()];
        let mut assignment = vec![0, 1, 1];
        let dense = dedup_and_densify(&names, &mut assignment);
        assert_eq!(dense, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(assignment, vec![0, 1, 1]);
    }
}
