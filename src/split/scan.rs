//! 1-D candidate scan shared by every search mode.
//!
//! Each candidate is a scalar value (an attribute value, or the coefficient
//! value a sample suggests) tagged with the sample's class. The scan sorts
//! the candidates and sweeps the boundary across equal-value groups, scoring
//! each placement as a 1-D classification problem.

use crate::impurity::{split_impurity, ImpurityMeasure};

use super::TOLERANCE;

/// One sample's vote in a 1-D split: a scalar position and its class.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Candidate {
    pub value: f64,
    pub label: u32,
}

/// Best 1-D threshold over the candidates.
///
/// Sorts in place, then moves equal-value groups from the right side to the
/// left one at a time, keeping the strictly best boundary (first found wins
/// ties, so the result is deterministic). The returned threshold is the
/// midpoint of the straddling values, or `first - TOLERANCE` / `last` when
/// the best boundary is before every candidate or after all of them.
///
/// # Panics
/// Panics (in debug builds) if `candidates` is empty.
pub(crate) fn linear_split(
    candidates: &mut [Candidate],
    measure: ImpurityMeasure,
    n_classes: usize,
) -> f64 {
    debug_assert!(!candidates.is_empty());
    candidates.sort_by(|a, b| a.value.total_cmp(&b.value));

    let n = candidates.len();
    let mut left = vec![0u32; n_classes];
    let mut right = vec![0u32; n_classes];
    for c in candidates.iter() {
        right[c.label as usize] += 1;
    }

    // Boundary 0 = everything on the right.
    let mut best_impurity = split_impurity(measure, &left, &right);
    let mut best_boundary = 0;

    let mut from = 0;
    while from < n {
        let mut to = from + 1;
        while to < n && candidates[to].value == candidates[from].value {
            to += 1;
        }
        for c in &candidates[from..to] {
            left[c.label as usize] += 1;
            right[c.label as usize] -= 1;
        }
        from = to;

        let impurity = split_impurity(measure, &left, &right);
        if impurity < best_impurity {
            best_impurity = impurity;
            best_boundary = from;
            if impurity == 0.0 {
                break;
            }
        }
    }

    if best_boundary == 0 {
        candidates[0].value - TOLERANCE
    } else if best_boundary == n {
        candidates[n - 1].value
    } else {
        (candidates[best_boundary - 1].value + candidates[best_boundary].value) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(values: &[(f64, u32)]) -> Vec<Candidate> {
        values
            .iter()
            .map(|&(value, label)| Candidate { value, label })
            .collect()
    }

    #[test]
    fn test_separable_threshold_is_midpoint() {
        let mut c = candidates(&[(1.0, 0), (2.0, 0), (3.0, 1), (4.0, 1)]);
        let t = linear_split(&mut c, ImpurityMeasure::GiniIndex, 2);
        assert!((t - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_unsorted_input_is_sorted_first() {
        let mut c = candidates(&[(4.0, 1), (1.0, 0), (3.0, 1), (2.0, 0)]);
        let t = linear_split(&mut c, ImpurityMeasure::GiniIndex, 2);
        assert!((t - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_single_class_keeps_boundary_before_first() {
        // No boundary improves on "all right", so the threshold lands just
        // below the smallest candidate.
        let mut c = candidates(&[(1.0, 0), (2.0, 0), (3.0, 0)]);
        let t = linear_split(&mut c, ImpurityMeasure::GiniIndex, 2);
        assert!((t - (1.0 - TOLERANCE)).abs() < 1e-12);
    }

    #[test]
    fn test_equal_values_move_as_a_group() {
        // The three samples at 2.0 move together; the boundary cannot fall
        // between them, so the best split is at 1.5 even though splitting
        // inside the group would score better.
        let mut c = candidates(&[(1.0, 0), (2.0, 0), (2.0, 1), (2.0, 1), (3.0, 1)]);
        let t = linear_split(&mut c, ImpurityMeasure::GiniIndex, 2);
        assert!((t - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_reversed_classes_split_high() {
        let mut c = candidates(&[(1.0, 1), (2.0, 1), (3.0, 1), (4.0, 0)]);
        let t = linear_split(&mut c, ImpurityMeasure::GiniIndex, 2);
        assert!((t - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_single_candidate() {
        let mut c = candidates(&[(5.0, 1)]);
        let t = linear_split(&mut c, ImpurityMeasure::GiniIndex, 2);
        // One point scores 0 everywhere; boundary 0 wins.
        assert!((t - (5.0 - TOLERANCE)).abs() < 1e-12);
    }
}
