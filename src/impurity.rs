//! Impurity measures over a two-way class-count partition.
//!
//! Every measure scores a candidate hyperplane from the per-class counts on
//! its left and right side. Lower is better; 0 is a perfect split. Measures
//! that are classically maximized (information gain, twoing) are returned in
//! reciprocal form so the whole search minimizes uniformly.
//!
//! [`split_impurity`] is the front-end the search goes through: degenerate
//! subsets score 0 and a partition with both sides homogeneous in different
//! classes scores 0 without consulting the measure (some measures, Hellinger
//! in particular, are not 0 at perfect splits on their own).

use crate::dataset::majority_class;

/// Goodness-of-split criterion for evaluating candidate hyperplanes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImpurityMeasure {
    /// Larger of the two side minorities (side total minus its majority
    /// count). Guarantees depth logarithmic in the number of samples.
    MaxMinority,
    /// Sum of the two side minorities.
    SumMinority,
    /// Reciprocal of Quinlan's information gain.
    InfoGain,
    /// Weighted Gini index of the two sides (CART).
    GiniIndex,
    /// Reciprocal of the CART twoing rule value.
    Twoing,
    /// Hellinger-distance based criterion; robust on imbalanced data.
    #[default]
    Hellinger,
}

impl ImpurityMeasure {
    /// Raw measure value for a left/right class-count partition.
    ///
    /// Callers normally want [`split_impurity`], which layers the
    /// degenerate-subset and perfect-split shortcuts on top.
    pub fn evaluate(self, left: &[u32], right: &[u32]) -> f64 {
        debug_assert_eq!(left.len(), right.len());
        match self {
            Self::MaxMinority => {
                let (l, r) = (minority(left), minority(right));
                l.max(r) as f64
            }
            Self::SumMinority => (minority(left) + minority(right)) as f64,
            Self::InfoGain => info_gain(left, right),
            Self::GiniIndex => gini_index(left, right),
            Self::Twoing => twoing(left, right),
            Self::Hellinger => hellinger(left, right),
        }
    }
}

impl std::fmt::Display for ImpurityMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::MaxMinority => "max_minority",
            Self::SumMinority => "sum_minority",
            Self::InfoGain => "info_gain",
            Self::GiniIndex => "gini_index",
            Self::Twoing => "twoing",
            Self::Hellinger => "hellinger",
        };
        f.write_str(name)
    }
}

/// Impurity of a partition, with the shortcuts applied before the measure:
/// a subset of at most one point scores 0, and so does a partition whose
/// sides are each homogeneous in different classes.
pub fn split_impurity(measure: ImpurityMeasure, left: &[u32], right: &[u32]) -> f64 {
    let total: u32 = left.iter().sum::<u32>() + right.iter().sum::<u32>();
    if total <= 1 {
        return 0.0;
    }
    if is_perfect_split(left, right) {
        return 0.0;
    }
    measure.evaluate(left, right)
}

/// Both sides homogeneous, in different classes.
fn is_perfect_split(left: &[u32], right: &[u32]) -> bool {
    let (lpt, rpt) = (left.iter().sum::<u32>(), right.iter().sum::<u32>());
    let left_cat = majority_class(left);
    let right_cat = majority_class(right);
    left[left_cat as usize] == lpt && right[right_cat as usize] == rpt && left_cat != right_cat
}

/// Side total minus its majority count.
fn minority(counts: &[u32]) -> u32 {
    let total: u32 = counts.iter().sum();
    total - counts[majority_class(counts) as usize]
}

fn entropy(counts: &[u32], total: u32) -> f64 {
    let mut info = 0.0;
    for &c in counts {
        if c > 0 {
            let ratio = c as f64 / total as f64;
            info -= ratio * ratio.log2();
        }
    }
    info
}

fn info_gain(left: &[u32], right: &[u32]) -> f64 {
    let (lt, rt) = (left.iter().sum::<u32>(), right.iter().sum::<u32>());
    let total = lt + rt;
    if total == 0 {
        return 0.0;
    }

    let joint: Vec<u32> = left.iter().zip(right).map(|(&l, &r)| l + r).collect();
    let presplit = entropy(&joint, total);

    let mut postsplit = 0.0;
    if lt > 0 {
        postsplit += lt as f64 * entropy(left, lt) / total as f64;
    }
    if rt > 0 {
        postsplit += rt as f64 * entropy(right, rt) / total as f64;
    }

    let gain = presplit - postsplit;
    if gain == 0.0 {
        // Zero gain: either the subset is already homogeneous (perfect, 0)
        // or the split is maximally uninformative (worst possible).
        if joint.iter().any(|&c| c == total) {
            return 0.0;
        }
        return f64::INFINITY;
    }
    1.0 / gain
}

fn gini_index(left: &[u32], right: &[u32]) -> f64 {
    let (lt, rt) = (left.iter().sum::<u32>(), right.iter().sum::<u32>());

    let side = |counts: &[u32], total: u32| -> f64 {
        if total == 0 {
            return 0.0;
        }
        let mut sum_sq = 0.0;
        for &c in counts {
            let p = c as f64 / total as f64;
            sum_sq += p * p;
        }
        1.0 - sum_sq
    };

    (lt as f64 * side(left, lt) + rt as f64 * side(right, rt)) / (lt + rt) as f64
}

fn twoing(left: &[u32], right: &[u32]) -> f64 {
    let (lt, rt) = (left.iter().sum::<u32>() as f64, right.iter().sum::<u32>() as f64);
    let total = lt + rt;
    if total == 0.0 {
        return 0.0;
    }

    let mut goodness = 0.0;
    for (&l, &r) in left.iter().zip(right) {
        let mut diff = 0.0;
        if lt > 0.0 {
            diff = l as f64 / lt;
        }
        if rt > 0.0 {
            diff -= r as f64 / rt;
        }
        goodness += diff.abs();
    }

    let twoing_val = (lt / total) * (rt / total) * goodness * goodness / 4.0;
    if twoing_val == 0.0 {
        return f64::INFINITY;
    }
    1.0 / twoing_val
}

fn hellinger(left: &[u32], right: &[u32]) -> f64 {
    let (lt, rt) = (left.iter().sum::<u32>(), right.iter().sum::<u32>());
    let sqrt_two = 2.0_f64.sqrt();

    // Pairwise Hellinger distance between class distributions on one side,
    // inverted so a well-separated side scores low.
    let side = |counts: &[u32], total: u32| -> f64 {
        if total == 0 {
            return 0.0;
        }
        let mut dist = 0.0;
        for i in 0..counts.len() {
            for j in (i + 1)..counts.len() {
                let pi = counts[i] as f64 / total as f64;
                let pj = counts[j] as f64 / total as f64;
                let d = pi.sqrt() - pj.sqrt();
                dist += d * d;
            }
        }
        sqrt_two - dist.sqrt()
    };

    (lt as f64 * side(left, lt) + rt as f64 * side(right, rt)) / (lt + rt) as f64
}
