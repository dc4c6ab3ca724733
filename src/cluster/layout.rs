//! 3D layout of the embedding matrix.
//!
//! Regimes by sample count: fewer than 3 files keep their leading embedding
//! components; up to 15 files use PCA (the only regime with strict
//! determinism guarantees); larger sets use a seeded neighbor-embedding pass
//! in the UMAP family, falling back to PCA and finally to seeded random
//! coordinates if the math degenerates.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

const LAYOUT_SEED: u64 = 42;
const PCA_POWER_ITERATIONS: usize = 100;
const NEIGHBOR_EPOCHS: usize = 200;

/// Reduce every row of `embeddings` to a 3D position, in row order.
pub fn positions_3d(embeddings: &Array2<f64>) -> Vec<[f32; 3]> {
    let n = embeddings.nrows();
    if n == 0 {
        return vec![];
    }

    if n < 3 {
        return pad_raw(embeddings);
    }

    if n < 15 {
        return match pca_3d(embeddings) {
            Some(positions) => positions,
            None => {
                debug!("PCA degenerated on {} samples, using random layout", n);
                random_3d(n)
            }
        };
    }

    let k = 15.min(n - 1);
    if let Some(positions) = neighbor_embedding_3d(embeddings, k) {
        return positions;
    }
    debug!("Neighbor embedding failed on {} samples, falling back to PCA", n);
    match pca_3d(embeddings) {
        Some(positions) => positions,
        None => random_3d(n),
    }
}

/// Fewer than three samples: take the leading three embedding components.
fn pad_raw(embeddings: &Array2<f64>) -> Vec<[f32; 3]> {
    let take = embeddings.ncols().min(3);
    embeddings
        .rows()
        .into_iter()
        .map(|row| {
            let mut p = [0.0f32; 3];
            for (slot, value) in p.iter_mut().take(take).zip(row.iter()) {
                *slot = *value as f32;
            }
            p
        })
        .collect()
}

/// PCA onto `min(3, d, n)` components via power iteration with deflation,
/// zero-padded to three. `None` when the result is not finite.
pub fn pca_3d(embeddings: &Array2<f64>) -> Option<Vec<[f32; 3]>> {
    let n = embeddings.nrows();
    let d = embeddings.ncols();
    if n == 0 || d == 0 {
        return None;
    }
    let components = 3.min(d).min(n);

    // Center.
    let mean = embeddings.mean_axis(ndarray::Axis(0))?;
    let centered = embeddings - &mean.clone().insert_axis(ndarray::Axis(0));

    // Covariance-shaped matrix (unnormalized; scaling does not change axes).
    let mut cov: Array2<f64> = centered.t().dot(&centered);

    let mut projections: Vec<Array1<f64>> = Vec::with_capacity(components);
    let mut rng = StdRng::seed_from_u64(LAYOUT_SEED);

    for _ in 0..components {
        let mut v: Array1<f64> = Array1::from_iter((0..d).map(|_| rng.gen_range(-1.0..1.0)));
        let mut converged = false;
        for _ in 0..PCA_POWER_ITERATIONS {
            let next = cov.dot(&v);
            let norm = next.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm < 1e-12 {
                break;
            }
            v = next / norm;
            converged = true;
        }
        if !converged {
            // No remaining variance along any direction.
            projections.push(Array1::zeros(n));
            continue;
        }

        let eigenvalue = v.dot(&cov.dot(&v));
        projections.push(centered.dot(&v));

        // Deflate the found component.
        let outer = outer_product(&v);
        cov = cov - eigenvalue * &outer;
    }

    let mut positions = vec![[0.0f32; 3]; n];
    for (axis, projection) in projections.iter().enumerate() {
        for (i, value) in projection.iter().enumerate() {
            positions[i][axis] = *value as f32;
        }
    }

    positions
        .iter()
        .all(|p| p.iter().all(|x| x.is_finite()))
        .then_some(positions)
}

fn outer_product(v: &Array1<f64>) -> Array2<f64> {
    let d = v.len();
    let mut out = Array2::zeros((d, d));
    for i in 0..d {
        for j in 0..d {
            out[[i, j]] = v[i] * v[j];
        }
    }
    out
}

/// Seeded neighbor-embedding layout: random init, attraction along k-nearest
/// neighbor edges, repulsion from negative samples. `None` when coordinates
/// stop being finite.
fn neighbor_embedding_3d(embeddings: &Array2<f64>, k: usize) -> Option<Vec<[f32; 3]>> {
    let n = embeddings.nrows();
    let neighbors = nearest_neighbors(embeddings, k);

    let mut rng = StdRng::seed_from_u64(LAYOUT_SEED);
    let mut positions: Vec<[f64; 3]> = (0..n)
        .map(|_| {
            [
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            ]
        })
        .collect();

    for epoch in 0..NEIGHBOR_EPOCHS {
        let alpha = 0.1 * (1.0 - epoch as f64 / NEIGHBOR_EPOCHS as f64) + 0.005;
        for i in 0..n {
            for &j in &neighbors[i] {
                for axis in 0..3 {
                    let delta = positions[j][axis] - positions[i][axis];
                    positions[i][axis] += alpha * 0.5 * delta;
                }
            }
            // Negative sampling keeps non-neighbors from collapsing together.
            for _ in 0..5 {
                let r = rng.gen_range(0..n);
                if r == i || neighbors[i].contains(&r) {
                    continue;
                }
                let mut sq_dist = 0.0;
                for axis in 0..3 {
                    let delta = positions[i][axis] - positions[r][axis];
                    sq_dist += delta * delta;
                }
                let push = alpha / (1.0 + sq_dist);
                for axis in 0..3 {
                    let delta = positions[i][axis] - positions[r][axis];
                    positions[i][axis] = (positions[i][axis] + push * delta).clamp(-50.0, 50.0);
                }
            }
        }
    }

    let out: Vec<[f32; 3]> = positions
        .iter()
        .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
        .collect();
    out.iter()
        .all(|p| p.iter().all(|x| x.is_finite()))
        .then_some(out)
}

fn nearest_neighbors(embeddings: &Array2<f64>, k: usize) -> Vec<Vec<usize>> {
    let n = embeddings.nrows();
    (0..n)
        .map(|i| {
            let mut distances: Vec<(usize, f64)> = (0..n)
                .filter(|j| *j != i)
                .map(|j| {
                    let d = embeddings
                        .row(i)
                        .iter()
                        .zip(embeddings.row(j).iter())
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum::<f64>();
                    (j, d)
                })
                .collect();
            distances.sort_by(|a, b| {
                a.1.partial_cmp(&b.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.0.cmp(&b.0))
            });
            distances.into_iter().take(k).map(|(j, _)| j).collect()
        })
        .collect()
}

fn random_3d(n: usize) -> Vec<[f32; 3]> {
    let mut rng = StdRng::seed_from_u64(LAYOUT_SEED);
    (0..n)
        .map(|_| {
            [
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            ]
        })
        .collect()
}
