//! Seeded synthetic datasets for tests.
//!
//! Generators return flat row-major data plus ground truth so tests can
//! check learned structure, not just accuracy.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A 2-D binary problem split by the diagonal `x + y = 1` with a margin.
pub struct SeparableData {
    /// Row-major samples, 2 attributes per row.
    pub data: Vec<f64>,
    pub labels: Vec<u32>,
    /// Coefficients of the generating separator: `[1, 1, -1]`.
    pub separator: [f64; 3],
}

/// Uniform samples over the unit square, labeled by the side of
/// `x + y = 1` and kept at least `margin` away from it.
pub fn linearly_separable(n_samples: usize, margin: f64, seed: u64) -> SeparableData {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(n_samples * 2);
    let mut labels = Vec::with_capacity(n_samples);

    while labels.len() < n_samples {
        let x: f64 = rng.gen_range(0.0..1.0);
        let y: f64 = rng.gen_range(0.0..1.0);
        let offset = x + y - 1.0;
        if offset.abs() < margin {
            continue;
        }
        data.push(x);
        data.push(y);
        labels.push(u32::from(offset > 0.0));
    }

    SeparableData {
        data,
        labels,
        separator: [1.0, 1.0, -1.0],
    }
}

/// Multiclass point clouds: `n_per_class` samples per center, uniform in a
/// box of half-width `spread` around it. Class `i` comes from center `i`.
///
/// Returns `(row-major data, labels)`; the attribute count is the centers'
/// dimension.
pub fn class_blobs(
    n_per_class: usize,
    centers: &[&[f64]],
    spread: f64,
    seed: u64,
) -> (Vec<f64>, Vec<u32>) {
    assert!(!centers.is_empty());
    let d = centers[0].len();
    assert!(centers.iter().all(|c| c.len() == d));

    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(n_per_class * centers.len() * d);
    let mut labels = Vec::with_capacity(n_per_class * centers.len());

    for (class, center) in centers.iter().enumerate() {
        for _ in 0..n_per_class {
            for &coordinate in center.iter() {
                data.push(coordinate + rng.gen_range(-spread..=spread));
            }
            labels.push(class as u32);
        }
    }

    (data, labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separable_respects_margin() {
        let set = linearly_separable(50, 0.2, 1);
        assert_eq!(set.labels.len(), 50);
        for (row, &label) in set.data.chunks(2).zip(&set.labels) {
            let offset = row[0] + row[1] - 1.0;
            assert!(offset.abs() >= 0.2);
            assert_eq!(label, u32::from(offset > 0.0));
        }
    }

    #[test]
    fn test_separable_is_reproducible() {
        let a = linearly_separable(30, 0.1, 9);
        let b = linearly_separable(30, 0.1, 9);
        assert_eq!(a.data, b.data);
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn test_blobs_stay_near_centers() {
        let centers: [&[f64]; 2] = [&[0.0, 0.0], &[10.0, 10.0]];
        let (data, labels) = class_blobs(20, &centers, 0.5, 3);
        assert_eq!(labels.len(), 40);
        for (row, &label) in data.chunks(2).zip(&labels) {
            let center = centers[label as usize];
            assert!((row[0] - center[0]).abs() <= 0.5);
            assert!((row[1] - center[1]).abs() <= 0.5);
        }
    }
}
