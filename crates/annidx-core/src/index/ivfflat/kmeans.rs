//! K-means++ seeding and Lloyd refinement (§5.2).
//!
//! The spherical variant used by cosine opclasses normalizes every sample
//! and centroid through [`OpClass::kmeans_norm`] before each distance
//! computation and after each centroid update, instead of using a separate
//! algorithm — this mirrors how `kmeans_norm` is dispatched per-opclass
//! rather than hard-coded.

use crate::distance::OpClass;
use crate::error::Result;
use crate::vector::Vector;
use rand::Rng;
use tracing::{debug, warn};

/// Result of a k-means run: the final centroids and, for diagnostics, the
/// total inertia (sum of squared distances to assigned centroid).
pub struct KmeansResult {
    /// Final centroid vectors, `lists` of them.
    pub centroids: Vec<Vector>,
    /// Sum of each sample's distance to its assigned centroid.
    pub inertia: f64,
    /// Number of Lloyd iterations actually run before convergence.
    pub iterations: usize,
}

/// Runs k-means++ seeding followed by Lloyd iterations until centroids stop
/// moving or `max_iterations` is reached.
///
/// # Errors
///
/// Propagates opclass distance/normalization errors.
pub fn run(
    opclass: &OpClass,
    samples: &[Vector],
    lists: usize,
    max_iterations: usize,
    rng: &mut impl Rng,
) -> Result<KmeansResult> {
    if samples.len() < lists {
        warn!(
            samples = samples.len(),
            lists, "fewer samples than requested lists; recall may suffer"
        );
    }
    let k = lists.min(samples.len()).max(1);
    let mut centroids = seed_plus_plus(opclass, samples, k, rng)?;

    let mut iterations = 0;
    let mut inertia = f64::INFINITY;
    for iter in 0..max_iterations {
        iterations = iter + 1;
        let (assignments, new_inertia) = assign(opclass, samples, &centroids)?;
        let new_centroids = update_centroids(opclass, samples, &assignments, &centroids)?;

        let converged = (inertia - new_inertia).abs() < 1e-9 * new_inertia.max(1.0);
        centroids = new_centroids;
        inertia = new_inertia;
        if converged {
            debug!(iterations, inertia, "k-means converged");
            break;
        }
    }

    // §5.2: when fewer distinct samples were available than `lists`, pad the
    // result back up to `lists` by duplicating already-trained centroids
    // rather than returning a short list, since downstream consumers
    // (the centroid directory, probe selection) size themselves off `lists`.
    if centroids.len() < lists {
        let trained = centroids.len();
        for i in 0..(lists - trained) {
            centroids.push(centroids[i % trained].clone());
        }
    }

    Ok(KmeansResult {
        centroids,
        inertia,
        iterations,
    })
}

/// k-means++ weighted seeding: first centroid uniform, each subsequent one
/// chosen with probability proportional to its squared distance to the
/// nearest already-chosen centroid.
fn seed_plus_plus(
    opclass: &OpClass,
    samples: &[Vector],
    k: usize,
    rng: &mut impl Rng,
) -> Result<Vec<Vector>> {
    let mut centroids = Vec::with_capacity(k);
    let first = rng.gen_range(0..samples.len());
    centroids.push(opclass.kmeans_norm(&samples[first])?);

    while centroids.len() < k {
        let mut weights = Vec::with_capacity(samples.len());
        for sample in samples {
            let mut best = f64::INFINITY;
            for c in &centroids {
                let d = opclass.distance(sample, c)?;
                if d < best {
                    best = d;
                }
            }
            weights.push(best.max(0.0));
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            let idx = rng.gen_range(0..samples.len());
            centroids.push(opclass.kmeans_norm(&samples[idx])?);
            continue;
        }
        let mut target = rng.gen_range(0.0..total);
        let mut chosen = samples.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            if target < *w {
                chosen = i;
                break;
            }
            target -= w;
        }
        centroids.push(opclass.kmeans_norm(&samples[chosen])?);
    }
    Ok(centroids)
}

fn assign(opclass: &OpClass, samples: &[Vector], centroids: &[Vector]) -> Result<(Vec<usize>, f64)> {
    let mut assignments = Vec::with_capacity(samples.len());
    let mut inertia = 0.0;
    for sample in samples {
        let mut best_idx = 0;
        let mut best_dist = f64::INFINITY;
        for (i, c) in centroids.iter().enumerate() {
            let d = opclass.distance(sample, c)?;
            if d < best_dist {
                best_dist = d;
                best_idx = i;
            }
        }
        assignments.push(best_idx);
        inertia += best_dist;
    }
    Ok((assignments, inertia))
}

fn update_centroids(
    opclass: &OpClass,
    samples: &[Vector],
    assignments: &[usize],
    previous: &[Vector],
) -> Result<Vec<Vector>> {
    let dim = previous.first().map(Vector::dimension).unwrap_or(0);
    let mut sums = vec![vec![0.0_f64; dim]; previous.len()];
    let mut counts = vec![0usize; previous.len()];

    for (sample, &cluster) in samples.iter().zip(assignments) {
        if let Some(values) = sample.as_f64() {
            for (acc, v) in sums[cluster].iter_mut().zip(values) {
                *acc += v;
            }
        }
        counts[cluster] += 1;
    }

    let mut centroids = Vec::with_capacity(previous.len());
    for (i, sum) in sums.into_iter().enumerate() {
        if counts[i] == 0 {
            centroids.push(previous[i].clone());
            continue;
        }
        let mean: Vec<f32> = sum.iter().map(|s| (s / counts[i] as f64) as f32).collect();
        centroids.push(opclass.kmeans_norm(&Vector::F32(mean))?);
    }
    Ok(centroids)
}
