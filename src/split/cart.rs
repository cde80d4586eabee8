//! CART linear-combination split search.
//!
//! Deterministic hill-climbing from the best axis-parallel hyperplane: each
//! attribute coefficient is re-optimized over a small sweep of gamma offsets,
//! the bias separately, cycling until a cycle changes the impurity by less
//! than the tolerance. Unlike the randomized oblique search, a perturbation
//! is applied even when it scores worse; the cycle cap bounds oscillation.

use crate::impurity::ImpurityMeasure;

use super::scan::{linear_split, Candidate};
use super::{margins, NodeData, ScoredSplit, MAX_CART_CYCLES, TOLERANCE};

const GAMMAS: [f64; 3] = [-0.25, 0.0, 0.25];

/// Refine `start` (coefficients, bias last) with the CART cycle.
pub(crate) fn cart_split(data: &NodeData, measure: ImpurityMeasure, start: &[f64]) -> ScoredSplit {
    let mut state = CartState::new(data, measure, start.to_vec());

    let mut cycle = 0u32;
    loop {
        if state.impurity == 0.0 {
            break;
        }
        cycle += 1;
        let impurity_before = state.impurity;

        for coefficient in 0..data.d() {
            state.perturb_coefficient(coefficient);
            if state.impurity == 0.0 {
                break;
            }
        }
        if state.impurity != 0.0 {
            state.perturb_bias();
        }

        if cycle > MAX_CART_CYCLES {
            break;
        }
        if cycle != 1 && (impurity_before - state.impurity).abs() < TOLERANCE {
            break;
        }
    }

    ScoredSplit {
        coefficients: state.coefficients,
        impurity: state.impurity,
    }
}

struct CartState<'a> {
    data: &'a NodeData,
    measure: ImpurityMeasure,
    coefficients: Vec<f64>,
    vals: Vec<f64>,
    impurity: f64,
    candidates: Vec<Candidate>,
}

impl<'a> CartState<'a> {
    fn new(data: &'a NodeData, measure: ImpurityMeasure, coefficients: Vec<f64>) -> Self {
        debug_assert_eq!(coefficients.len(), data.d() + 1);
        let vals = margins(data, &coefficients);
        let impurity = super::impurity_of_margins(data, measure, &vals);
        Self {
            data,
            measure,
            coefficients,
            vals,
            impurity,
            candidates: Vec::with_capacity(data.n()),
        }
    }

    /// Sweep the gamma offsets for one coefficient and apply the best
    /// `(lambda, gamma)` found: `w[c] -= lambda`, `bias -= lambda * gamma`.
    fn perturb_coefficient(&mut self, coefficient: usize) {
        let n = self.data.n();
        let mut best: Option<(f64, f64, f64)> = None; // (impurity, lambda, gamma)

        for gamma in GAMMAS {
            self.candidates.clear();
            for i in 0..n {
                let denom = self.data.value(i, coefficient) + gamma;
                if denom != 0.0 {
                    self.candidates.push(Candidate {
                        value: self.vals[i] / denom,
                        label: self.data.label(i),
                    });
                }
            }
            if self.candidates.is_empty() {
                continue;
            }
            let lambda = linear_split(&mut self.candidates, self.measure, self.data.n_classes());

            let impurity = self.impurity_after(|data, vals, i| {
                vals[i] - lambda * (data.value(i, coefficient) + gamma)
            });
            if best.map_or(true, |(b, _, _)| impurity < b) {
                best = Some((impurity, lambda, gamma));
            }
        }

        let Some((impurity, lambda, gamma)) = best else {
            return;
        };
        if lambda.abs() <= TOLERANCE {
            return;
        }

        self.coefficients[coefficient] -= lambda;
        let d = self.data.d();
        self.coefficients[d] -= lambda * gamma;
        for i in 0..n {
            self.vals[i] -= lambda * (self.data.value(i, coefficient) + gamma);
        }
        self.impurity = impurity;
    }

    /// Re-optimize the bias alone; every sample is a candidate.
    fn perturb_bias(&mut self) {
        let n = self.data.n();
        self.candidates.clear();
        for i in 0..n {
            self.candidates.push(Candidate {
                value: self.vals[i],
                label: self.data.label(i),
            });
        }
        let lambda = linear_split(&mut self.candidates, self.measure, self.data.n_classes());
        if lambda.abs() <= TOLERANCE {
            return;
        }

        let impurity = self.impurity_after(|_, vals, i| vals[i] - lambda);
        let d = self.data.d();
        self.coefficients[d] -= lambda;
        for v in &mut self.vals {
            *v -= lambda;
        }
        self.impurity = impurity;
    }

    fn impurity_after(&self, new_val: impl Fn(&NodeData, &[f64], usize) -> f64) -> f64 {
        let mut left = vec![0u32; self.data.n_classes()];
        let mut right = vec![0u32; self.data.n_classes()];
        for i in 0..self.data.n() {
            if new_val(self.data, &self.vals, i) < 0.0 {
                left[self.data.label(i) as usize] += 1;
            } else {
                right[self.data.label(i) as usize] += 1;
            }
        }
        crate::impurity::split_impurity(self.measure, &left, &right)
    }
}
