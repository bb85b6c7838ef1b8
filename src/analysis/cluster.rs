//! Seeded k-means over RGB samples
//!
//! Centers are initialised with k-means++ from a `StdRng` seeded once per
//! call, so the same samples and seed always produce the same partition.
//! Of `restarts` independent runs, the one with the lowest inertia wins;
//! ties keep the earliest run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::constants::background::CONVERGENCE_TOLERANCE;

pub type Sample = [f32; 3];

/// Outcome of one clustering
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub centers: Vec<Sample>,
    /// Samples assigned to each center
    pub counts: Vec<usize>,
    /// Sum of squared distances to assigned centers
    pub inertia: f64,
    /// Lloyd iterations used by the winning run
    pub iterations: usize,
}

impl Clustering {
    /// Share (0.0-1.0) of samples in the largest cluster
    pub fn dominant_share(&self) -> f64 {
        let total: usize = self.counts.iter().sum();
        if total == 0 {
            return 1.0;
        }
        let largest = self.counts.iter().copied().max().unwrap_or(0);
        largest as f64 / total as f64
    }
}

/// k-means settings
#[derive(Debug, Clone, Copy)]
pub struct KMeans {
    pub clusters: usize,
    pub restarts: usize,
    pub max_iterations: usize,
    pub seed: u64,
}

impl KMeans {
    /// Cluster `samples`
    ///
    /// Returns `None` when there is nothing to cluster. When the samples hold
    /// fewer distinct colors than `clusters`, fewer centers are produced.
    pub fn fit(&self, samples: &[Sample]) -> Option<Clustering> {
        if samples.is_empty() || self.clusters == 0 {
            return None;
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<Clustering> = None;

        for _ in 0..self.restarts.max(1) {
            let centers = plus_plus_init(samples, self.clusters, &mut rng);
            let run = lloyd(samples, centers, self.max_iterations);
            let better = match &best {
                Some(current) => run.inertia < current.inertia,
                None => true,
            };
            if better {
                best = Some(run);
            }
        }

        best
    }
}

fn squared_distance(a: &Sample, b: &Sample) -> f64 {
    let dr = (a[0] - b[0]) as f64;
    let dg = (a[1] - b[1]) as f64;
    let db = (a[2] - b[2]) as f64;
    dr * dr + dg * dg + db * db
}

fn nearest(sample: &Sample, centers: &[Sample]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (idx, center) in centers.iter().enumerate() {
        let d = squared_distance(sample, center);
        if d < best.1 {
            best = (idx, d);
        }
    }
    best
}

/// k-means++ seeding: each new center is drawn with probability proportional
/// to its squared distance from the centers chosen so far
fn plus_plus_init(samples: &[Sample], k: usize, rng: &mut StdRng) -> Vec<Sample> {
    let mut centers = Vec::with_capacity(k);
    centers.push(samples[rng.gen_range(0..samples.len())]);

    let mut distances: Vec<f64> = samples
        .iter()
        .map(|s| squared_distance(s, &centers[0]))
        .collect();

    while centers.len() < k {
        let total: f64 = distances.iter().sum();
        if total <= 0.0 {
            // every sample already coincides with a center
            break;
        }

        let target = rng.gen::<f64>() * total;
        let mut acc = 0.0;
        let mut chosen = samples.len() - 1;
        for (idx, &d) in distances.iter().enumerate() {
            acc += d;
            if acc > target && d > 0.0 {
                chosen = idx;
                break;
            }
        }
        if distances[chosen] <= 0.0 {
            // floating point slack landed on a covered sample
            match distances.iter().rposition(|&d| d > 0.0) {
                Some(idx) => chosen = idx,
                None => break,
            }
        }

        let center = samples[chosen];
        for (d, s) in distances.iter_mut().zip(samples) {
            *d = d.min(squared_distance(s, &center));
        }
        centers.push(center);
    }

    centers
}

fn lloyd(samples: &[Sample], mut centers: Vec<Sample>, max_iterations: usize) -> Clustering {
    let k = centers.len();
    let mut labels = vec![0usize; samples.len()];
    let mut iterations = 0;

    for _ in 0..max_iterations.max(1) {
        iterations += 1;

        for (label, sample) in labels.iter_mut().zip(samples) {
            *label = nearest(sample, &centers).0;
        }

        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (&label, sample) in labels.iter().zip(samples) {
            counts[label] += 1;
            for c in 0..3 {
                sums[label][c] += sample[c] as f64;
            }
        }

        let mut shift = 0.0;
        for idx in 0..k {
            // an emptied cluster keeps its previous center
            if counts[idx] == 0 {
                continue;
            }
            let n = counts[idx] as f64;
            let updated = [
                (sums[idx][0] / n) as f32,
                (sums[idx][1] / n) as f32,
                (sums[idx][2] / n) as f32,
            ];
            shift += squared_distance(&centers[idx], &updated);
            centers[idx] = updated;
        }

        if shift <= CONVERGENCE_TOLERANCE {
            break;
        }
    }

    let mut counts = vec![0usize; k];
    let mut inertia = 0.0;
    for sample in samples {
        let (label, d) = nearest(sample, &centers);
        counts[label] += 1;
        inertia += d;
    }

    Clustering {
        centers,
        counts,
        inertia,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kmeans(seed: u64) -> KMeans {
        KMeans {
            clusters: 3,
            restarts: 10,
            max_iterations: 300,
            seed,
        }
    }

    fn three_blobs() -> Vec<Sample> {
        let mut samples = Vec::new();
        for i in 0..60 {
            samples.push([10.0 + (i % 3) as f32, 10.0, 10.0]);
        }
        for i in 0..30 {
            samples.push([200.0, 20.0 + (i % 2) as f32, 20.0]);
        }
        for _ in 0..10 {
            samples.push([50.0, 50.0, 240.0]);
        }
        samples
    }

    #[test]
    fn test_separates_blobs() {
        let result = kmeans(42).fit(&three_blobs()).unwrap();
        let mut counts = result.counts.clone();
        counts.sort_unstable();
        assert_eq!(counts, vec![10, 30, 60]);
        assert!((result.dominant_share() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_same_seed_same_result() {
        let samples: Vec<Sample> = (0..500)
            .map(|i| {
                let v = ((i * 37) % 256) as f32;
                [v, 255.0 - v, ((i * 11) % 256) as f32]
            })
            .collect();
        let a = kmeans(7).fit(&samples).unwrap();
        let b = kmeans(7).fit(&samples).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_color_collapses() {
        let samples = vec![[128.0, 128.0, 128.0]; 100];
        let result = kmeans(0).fit(&samples).unwrap();
        assert_eq!(result.centers.len(), 1);
        assert_eq!(result.dominant_share(), 1.0);
        assert_eq!(result.inertia, 0.0);
    }

    #[test]
    fn test_two_colors_with_three_clusters() {
        let mut samples = vec![[0.0, 0.0, 0.0]; 75];
        samples.extend(vec![[255.0, 255.0, 255.0]; 25]);
        let result = kmeans(1).fit(&samples).unwrap();
        assert_eq!(result.centers.len(), 2);
        assert!((result.dominant_share() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input() {
        assert!(kmeans(0).fit(&[]).is_none());
    }
}
