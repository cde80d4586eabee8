//! Exhaustive axis-parallel split search.

use crate::impurity::ImpurityMeasure;

use super::scan::{linear_split, Candidate};
use super::{impurity_of, NodeData, ScoredSplit};

/// Best single-attribute threshold split over the node's samples.
///
/// For each attribute the 1-D scan places a threshold over the raw values,
/// and the resulting hyperplane `x[a] - t` is scored on the full partition.
/// The first attribute seeds the best; later ones must be strictly better,
/// so equal-impurity ties go to the lowest attribute index.
pub(crate) fn axis_parallel_split(data: &NodeData, measure: ImpurityMeasure) -> ScoredSplit {
    let (n, d) = (data.n(), data.d());
    debug_assert!(n > 0 && d > 0);

    let mut candidates: Vec<Candidate> = Vec::with_capacity(n);
    let mut best: Option<ScoredSplit> = None;

    for attribute in 0..d {
        candidates.clear();
        for i in 0..n {
            candidates.push(Candidate {
                value: data.value(i, attribute),
                label: data.label(i),
            });
        }
        let threshold = linear_split(&mut candidates, measure, data.n_classes());

        let mut coefficients = vec![0.0; d + 1];
        coefficients[attribute] = 1.0;
        coefficients[d] = -threshold;
        let impurity = impurity_of(data, measure, &coefficients);

        if best.as_ref().map_or(true, |b| impurity < b.impurity) {
            let done = impurity == 0.0;
            best = Some(ScoredSplit {
                coefficients,
                impurity,
            });
            if done {
                break;
            }
        }
    }

    best.expect("at least one attribute")
}
