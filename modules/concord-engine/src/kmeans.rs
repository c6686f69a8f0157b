//! Centroid-based partitioning shared by voter segmentation and embedding
//! clustering: k-means++ seeding followed by Lloyd iterations.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// k-means configuration. With a seed, output is fully deterministic.
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    max_iterations: usize,
    seed: Option<u64>,
}

/// Cluster index per input point, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub assignments: Vec<usize>,
    /// Number of clusters the assignments index into. Some may be empty.
    pub k: usize,
    pub iterations: usize,
}

impl Partition {
    /// Member point indices per cluster, including empty clusters.
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.k];
        for (point, &cluster) in self.assignments.iter().enumerate() {
            members[cluster].push(point);
        }
        members
    }
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: 100,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Partition `points` (equal-length rows) into at most `k` clusters.
    ///
    /// `k` is clamped to the number of points. Duplicate points can leave
    /// clusters empty; that is reported, not treated as a failure.
    pub fn fit(&self, points: &[Vec<f64>]) -> Partition {
        let n = points.len();
        let k = self.k.min(n);
        if k == 0 {
            return Partition {
                assignments: Vec::new(),
                k: 0,
                iterations: 0,
            };
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut centroids = seed_centroids(points, k, &mut rng);
        let mut assignments = vec![usize::MAX; n];
        let mut iterations = 0;

        while iterations < self.max_iterations {
            iterations += 1;

            let mut changed = false;
            for (i, point) in points.iter().enumerate() {
                let nearest = nearest_centroid(point, &centroids);
                if assignments[i] != nearest {
                    assignments[i] = nearest;
                    changed = true;
                }
            }
            if !changed {
                break;
            }

            update_centroids(points, &assignments, &mut centroids);
        }

        Partition {
            assignments,
            k,
            iterations,
        }
    }
}

/// k-means++: each further centroid is drawn with probability proportional
/// to its squared distance from the nearest centroid chosen so far.
fn seed_centroids(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.random_range(0..n)].clone());

    let mut distances: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = distances.iter().sum();
        let next = if total > 0.0 {
            let mut target = rng.random::<f64>() * total;
            let mut chosen = distances.iter().rposition(|d| *d > 0.0).unwrap_or(0);
            for (i, d) in distances.iter().enumerate() {
                if *d <= 0.0 {
                    continue;
                }
                if target < *d {
                    chosen = i;
                    break;
                }
                target -= d;
            }
            chosen
        } else {
            // Every point coincides with a centroid already.
            rng.random_range(0..n)
        };

        centroids.push(points[next].clone());
        let newest = centroids.len() - 1;
        for (d, p) in distances.iter_mut().zip(points) {
            *d = d.min(squared_distance(p, &centroids[newest]));
        }
    }

    centroids
}

/// Ties resolve to the lowest centroid index.
fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (j, centroid) in centroids.iter().enumerate() {
        let d = squared_distance(point, centroid);
        if d < best_distance {
            best = j;
            best_distance = d;
        }
    }
    best
}

/// Move each centroid to the mean of its members. Empty clusters keep
/// their previous centroid.
fn update_centroids(points: &[Vec<f64>], assignments: &[usize], centroids: &mut [Vec<f64>]) {
    let dim = centroids.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0; dim]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];

    for (point, &cluster) in points.iter().zip(assignments) {
        counts[cluster] += 1;
        for (s, v) in sums[cluster].iter_mut().zip(point) {
            *s += v;
        }
    }

    for ((centroid, sum), count) in centroids.iter_mut().zip(sums).zip(counts) {
        if count > 0 {
            *centroid = sum.into_iter().map(|s| s / count as f64).collect();
        }
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
