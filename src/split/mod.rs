//! Hyperplane split search.
//!
//! Four search modes over a node's samples:
//!
//! - [`Splitter::AxisParallel`] — exhaustive single-attribute thresholds.
//! - [`Splitter::Oc1`] — randomized coordinate hill-climbing with random-jump
//!   perturbations, from random starting hyperplanes.
//! - [`Splitter::Oc1AxisParallel`] — the same search seeded with the best
//!   axis-parallel split, kept only when it beats that split.
//! - [`Splitter::Cart`] — CART's deterministic linear-combination cycle.
//!
//! All searches minimize one [`ImpurityMeasure`] and share the 1-D candidate
//! scan in [`scan`]. The search operates on a materialized copy of the node's
//! samples ([`NodeData`]), so per-node normalization never touches the
//! caller's data.

mod axis_parallel;
mod cart;
mod oblique;
mod scan;

pub(crate) use axis_parallel::axis_parallel_split;
pub(crate) use cart::cart_split;
pub(crate) use oblique::oblique_split;

use std::str::FromStr;

use ndarray::Array2;
use thiserror::Error;

use crate::dataset::SamplesView;
use crate::impurity::{split_impurity, ImpurityMeasure};

/// Impurity differences at or below this are treated as no change; also the
/// offset used when a 1-D threshold falls before every candidate.
pub(crate) const TOLERANCE: f64 = 1e-4;

/// Consecutive no-better coefficient perturbations tolerated before
/// equal-impurity moves are rejected.
pub(crate) const MAX_STAGNANT_PERTURBATIONS: u32 = 10;

/// Hard cap on CART perturbation cycles; the cycle can oscillate on some
/// inputs instead of converging.
pub(crate) const MAX_CART_CYCLES: u32 = 100;

/// Random starting coefficients are uniform in `[-MAX_COEFFICIENT, MAX_COEFFICIENT]`.
pub(crate) const MAX_COEFFICIENT: f64 = 1.0;

// =============================================================================
// Splitter
// =============================================================================

/// Split search mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Splitter {
    /// Oblique search from random starting hyperplanes.
    #[default]
    Oc1,
    /// Oblique search seeded with the best axis-parallel split.
    Oc1AxisParallel,
    /// Axis-parallel thresholds only.
    AxisParallel,
    /// CART linear-combination cycle from the best axis-parallel split.
    Cart,
}

/// A splitter string was not one of the recognized mode names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized splitter {0:?}; expected \"oc1\", \"oc1, axis_parallel\", \"axis_parallel\" or \"cart\"")]
pub struct ParseSplitterError(pub String);

impl FromStr for Splitter {
    type Err = ParseSplitterError;

    /// Parse the estimator-style mode strings. Tokens are comma-separated
    /// and order-insensitive: `"oc1, axis_parallel"` and
    /// `"axis_parallel, oc1"` both name the seeded mode.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens: Vec<&str> = s.split(',').map(str::trim).collect();
        tokens.sort_unstable();
        match tokens.as_slice() {
            ["oc1"] => Ok(Self::Oc1),
            ["axis_parallel", "oc1"] => Ok(Self::Oc1AxisParallel),
            ["axis_parallel"] => Ok(Self::AxisParallel),
            ["cart"] => Ok(Self::Cart),
            _ => Err(ParseSplitterError(s.to_string())),
        }
    }
}

impl std::fmt::Display for Splitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Oc1 => "oc1",
            Self::Oc1AxisParallel => "oc1, axis_parallel",
            Self::AxisParallel => "axis_parallel",
            Self::Cart => "cart",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Search inputs and outputs
// =============================================================================

/// Knobs the oblique search needs, extracted from the model config.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SearchParams {
    pub measure: ImpurityMeasure,
    pub n_restarts: u32,
    pub max_perturbations: u32,
    pub seed: u64,
}

/// A candidate hyperplane (flat coefficients, bias last) with its impurity.
#[derive(Clone, Debug)]
pub(crate) struct ScoredSplit {
    pub coefficients: Vec<f64>,
    pub impurity: f64,
}

/// The samples of one tree node, materialized so the search can shift and
/// scan them without touching the caller's matrix.
#[derive(Clone, Debug)]
pub(crate) struct NodeData {
    x: Array2<f64>,
    y: Vec<u32>,
    n_classes: usize,
}

impl NodeData {
    /// Copy the given rows out of the full training view.
    pub fn gather(samples: SamplesView<'_>, labels: &[u32], rows: &[u32], n_classes: usize) -> Self {
        let d = samples.n_attributes();
        let mut x = Array2::zeros((rows.len(), d));
        let mut y = Vec::with_capacity(rows.len());
        for (out, &row) in rows.iter().enumerate() {
            x.row_mut(out).assign(&samples.row(row as usize));
            y.push(labels[row as usize]);
        }
        Self { x, y, n_classes }
    }

    #[cfg(test)]
    pub fn from_parts(x: Array2<f64>, y: Vec<u32>, n_classes: usize) -> Self {
        assert_eq!(x.nrows(), y.len());
        Self { x, y, n_classes }
    }

    #[inline]
    pub fn n(&self) -> usize {
        self.y.len()
    }

    #[inline]
    pub fn d(&self) -> usize {
        self.x.ncols()
    }

    #[inline]
    pub fn value(&self, sample: usize, attribute: usize) -> f64 {
        self.x[[sample, attribute]]
    }

    #[inline]
    pub fn label(&self, sample: usize) -> u32 {
        self.y[sample]
    }

    #[inline]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Impurity before any split, all samples on the right side.
    pub fn initial_impurity(&self, measure: ImpurityMeasure) -> f64 {
        let left = vec![0u32; self.n_classes];
        let right = crate::dataset::class_counts(self.y.iter().copied(), self.n_classes);
        split_impurity(measure, &left, &right)
    }

    /// Copy with every attribute whose minimum is negative shifted into the
    /// positive quadrant. Returns the shift applied per attribute (0 where
    /// none), which [`unshift_bias`] folds back into a found hyperplane.
    pub fn shifted_to_positive(&self) -> (Self, Vec<f64>) {
        let mut shifts = vec![0.0; self.d()];
        let mut x = self.x.clone();
        for (attribute, shift) in shifts.iter_mut().enumerate() {
            let min = self
                .x
                .column(attribute)
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min);
            if min < 0.0 {
                *shift = min;
                for v in x.column_mut(attribute) {
                    *v -= min;
                }
            }
        }
        let shifted = Self {
            x,
            y: self.y.clone(),
            n_classes: self.n_classes,
        };
        (shifted, shifts)
    }
}

/// Rewrite a hyperplane found on shifted data so it applies to the original
/// coordinates: `sum(w_i * (x_i - m_i)) + b == sum(w_i * x_i) + (b - sum(w_i * m_i))`.
pub(crate) fn unshift_bias(coefficients: &mut [f64], shifts: &[f64]) {
    let d = shifts.len();
    let mut bias = coefficients[d];
    for (w, m) in coefficients[..d].iter().zip(shifts) {
        bias -= w * m;
    }
    coefficients[d] = bias;
}

/// Signed margins of every sample against a flat coefficient vector.
pub(crate) fn margins(data: &NodeData, coefficients: &[f64]) -> Vec<f64> {
    let d = data.d();
    debug_assert_eq!(coefficients.len(), d + 1);
    (0..data.n())
        .map(|i| {
            let mut value = coefficients[d];
            for (c, w) in coefficients[..d].iter().enumerate() {
                value += w * data.value(i, c);
            }
            value
        })
        .collect()
}

/// Impurity of the partition induced by precomputed margins.
pub(crate) fn impurity_of_margins(
    data: &NodeData,
    measure: ImpurityMeasure,
    margins: &[f64],
) -> f64 {
    let mut left = vec![0u32; data.n_classes()];
    let mut right = vec![0u32; data.n_classes()];
    for (i, &value) in margins.iter().enumerate() {
        if value < 0.0 {
            left[data.label(i) as usize] += 1;
        } else {
            right[data.label(i) as usize] += 1;
        }
    }
    split_impurity(measure, &left, &right)
}

/// Impurity of the partition a coefficient vector induces on `data`.
pub(crate) fn impurity_of(data: &NodeData, measure: ImpurityMeasure, coefficients: &[f64]) -> f64 {
    impurity_of_margins(data, measure, &margins(data, coefficients))
}
