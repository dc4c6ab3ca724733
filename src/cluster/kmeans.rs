//! Embedding k-means with automatic k selection.
//!
//! k is chosen by silhouette score over `k ∈ [2, min(max_k, n−1)]`; ties go
//! to the smaller k (strict improvement required). Fits are seeded, so the
//! same inputs always produce the same labels.

use linfa::DatasetBase;
use linfa::traits::{Fit, Predict};
use linfa_clustering::KMeans;
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use std::collections::HashSet;
use tracing::debug;

const KMEANS_SEED: u64 = 42;

/// Cluster rows of `embeddings`, choosing k by silhouette score.
/// Degenerate inputs (fewer than two rows, or all rows identical) collapse
/// into a single label.
pub fn cluster_auto_k(embeddings: &Array2<f64>, max_k: usize) -> Vec<usize> {
    let n = embeddings.nrows();
    if n < 2 {
        return vec![0; n];
    }

    let upper = max_k.min(n - 1);
    if upper < 2 || all_rows_identical(embeddings) {
        return vec![0; n];
    }

    let mut best: Option<(f64, Vec<usize>)> = None;
    for k in 2..=upper {
        let labels = match fit_predict(embeddings, k) {
            Ok(labels) => labels,
            Err(e) => {
                debug!("k-means fit failed for k={}: {}", k, e);
                continue;
            }
        };
        let Some(score) = silhouette(embeddings, &labels) else {
            continue;
        };
        if best.as_ref().is_none_or(|(s, _)| score > *s) {
            best = Some((score, labels));
        }
    }

    best.map(|(_, labels)| labels).unwrap_or_else(|| vec![0; n])
}

fn fit_predict(embeddings: &Array2<f64>, k: usize) -> anyhow::Result<Vec<usize>> {
    let rng = Xoshiro256Plus::seed_from_u64(KMEANS_SEED);
    let dataset = DatasetBase::from(embeddings.clone());
    let model = KMeans::params_with_rng(k, rng)
        .max_n_iterations(300)
        .tolerance(1e-4)
        .fit(&dataset)?;
    let labels: Array1<usize> = model.predict(embeddings);
    Ok(labels.to_vec())
}

/// Mean silhouette coefficient. `None` when the labeling has fewer than two
/// distinct clusters or the score is not finite.
pub fn silhouette(embeddings: &Array2<f64>, labels: &[usize]) -> Option<f64> {
    let n = labels.len();
    let distinct: HashSet<usize> = labels.iter().copied().collect();
    if distinct.len() < 2 || n != embeddings.nrows() {
        return None;
    }

    let mut cluster_sizes: std::collections::HashMap<usize, usize> =
        std::collections::HashMap::new();
    for label in labels {
        *cluster_sizes.entry(*label).or_insert(0) += 1;
    }

    let mut total = 0.0;
    for i in 0..n {
        // Singleton clusters contribute zero by convention.
        if cluster_sizes[&labels[i]] == 1 {
            continue;
        }

        let mut dist_sum: std::collections::HashMap<usize, f64> =
            std::collections::HashMap::new();
        for j in 0..n {
            if i == j {
                continue;
            }
            let d = euclidean(embeddings, i, j);
            *dist_sum.entry(labels[j]).or_insert(0.0) += d;
        }

        let own = labels[i];
        let a = dist_sum.get(&own).copied().unwrap_or(0.0) / (cluster_sizes[&own] - 1) as f64;
        let b = dist_sum
            .iter()
            .filter(|(label, _)| **label != own)
            .map(|(label, sum)| sum / cluster_sizes[label] as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    let score = total / n as f64;
    score.is_finite().then_some(score)
}

fn euclidean(embeddings: &Array2<f64>, i: usize, j: usize) -> f64 {
    let a = embeddings.row(i);
    let b = embeddings.row(j);
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

fn all_rows_identical(embeddings: &Array2<f64>) -> bool {
    let first = embeddings.row(0);
    (1..embeddings.nrows()).all(|i| {
        embeddings
            .row(i)
            .iter()
            .zip(first.iter())
            .all(|(a, b)| (a - b).abs() < 1e-12)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_blobs() -> Array2<f64> {
        array![
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [10.0, 10.0],
            [10.1, 10.0],
            [10.0, 10.1],
        ]
    }

    #[test]
    fn separated_blobs_split_into_two() {
        let labels = cluster_auto_k(&two_blobs(), 8);
        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[0], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[3], labels[5]);
        assert_ne!(labels[0], labels[3]);
        let distinct: HashSet<usize> = labels.iter().copied().collect();
        assert_eq!(distinct.len(), 2);
    }

    #[test]
    fn clustering_is_deterministic() {
        let a = cluster_auto_k(&two_blobs(), 8);
        let b = cluster_auto_k(&two_blobs(), 8);
        assert_eq!(a, b);
    }

    #[test]
    fn single_row_gets_label_zero() {
        let one = array![[1.0, 2.0]];
        assert_eq!(cluster_auto_k(&one, 8), vec![0]);
    }

    #[test]
    fn identical_rows_collapse_to_one_cluster() {
        let same = array![[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]];
        assert_eq!(cluster_auto_k(&same, 8), vec![0, 0, 0]);
    }

    #[test]
    fn silhouette_prefers_true_split() {
        let data = two_blobs();
        let good = vec![0, 0, 0, 1, 1, 1];
        let bad = vec![0, 1, 0, 1, 0, 1];
        let s_good = silhouette(&data, &good).unwrap();
        let s_bad = silhouette(&data, &bad).unwrap();
        assert!(s_good > s_bad);
        assert!(s_good > 0.8);
    }

    #[test]
    fn silhouette_rejects_single_cluster() {
        let data = two_blobs();
        assert!(silhouette(&data, &[0, 0, 0, 0, 0, 0]).is_none());
    }
}
