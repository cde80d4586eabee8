//! Randomized oblique split search: coordinate hill-climbing with
//! random-jump perturbations, repeated over independent restarts.
//!
//! Each restart owns an RNG stream derived from the node seed and the
//! restart index, so the outcome is identical whether restarts run
//! sequentially or in parallel, and the best restart is chosen by
//! `(impurity, restart index)` so ties are deterministic too.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::impurity::{split_impurity, ImpurityMeasure};
use crate::utils::Parallelism;

use super::scan::{linear_split, Candidate};
use super::{
    margins, NodeData, ScoredSplit, SearchParams, MAX_COEFFICIENT, MAX_STAGNANT_PERTURBATIONS,
    TOLERANCE,
};

/// Best oblique hyperplane over the node's samples.
///
/// `start` seeds the first restart (the best axis-parallel hyperplane in
/// seeded mode); every other restart starts from random coefficients drawn
/// uniformly from `[-1, 1]`.
pub(crate) fn oblique_split(
    data: &NodeData,
    params: SearchParams,
    start: Option<&[f64]>,
    parallelism: Parallelism,
) -> ScoredSplit {
    let n_restarts = params.n_restarts.max(1) as usize;

    let results = parallelism.maybe_par_map(0..n_restarts, |restart| {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed);
        for _ in 0..restart {
            rng.long_jump();
        }

        let coefficients = match (restart, start) {
            (0, Some(seed_coefficients)) => seed_coefficients.to_vec(),
            _ => random_coefficients(&mut rng, data.d() + 1),
        };

        let mut state = RestartState::new(data, params.measure, coefficients);
        state.run(&mut rng, params.max_perturbations);
        ScoredSplit {
            coefficients: state.coefficients,
            impurity: state.impurity,
        }
    });

    results
        .into_iter()
        .reduce(|best, candidate| {
            if candidate.impurity < best.impurity {
                candidate
            } else {
                best
            }
        })
        .expect("at least one restart")
}

fn random_coefficients(rng: &mut Xoshiro256PlusPlus, len: usize) -> Vec<f64> {
    (0..len)
        .map(|_| rng.gen_range(-MAX_COEFFICIENT..=MAX_COEFFICIENT))
        .collect()
}

// =============================================================================
// RestartState
// =============================================================================

/// One restart's hyperplane, sample margins, and bookkeeping.
///
/// The margins (`vals`) always correspond to `coefficients`; every accepted
/// move updates both together.
struct RestartState<'a> {
    data: &'a NodeData,
    measure: ImpurityMeasure,
    coefficients: Vec<f64>,
    vals: Vec<f64>,
    impurity: f64,
    stagnant: u32,
    // Scratch reused across perturbations.
    candidates: Vec<Candidate>,
    trial_vals: Vec<f64>,
    left: Vec<u32>,
    right: Vec<u32>,
}

impl<'a> RestartState<'a> {
    fn new(data: &'a NodeData, measure: ImpurityMeasure, coefficients: Vec<f64>) -> Self {
        debug_assert_eq!(coefficients.len(), data.d() + 1);
        let vals = margins(data, &coefficients);
        let mut state = Self {
            data,
            measure,
            coefficients,
            vals,
            impurity: 0.0,
            stagnant: 0,
            candidates: Vec::with_capacity(data.n()),
            trial_vals: vec![0.0; data.n()],
            left: vec![0; data.n_classes()],
            right: vec![0; data.n_classes()],
        };
        state.impurity = state.impurity_of_vals_buf();
        state
    }

    /// Hill-climb to a local minimum, then try to escape it with random
    /// jumps; repeat until neither makes progress.
    fn run(&mut self, rng: &mut Xoshiro256PlusPlus, max_perturbations: u32) {
        loop {
            self.hill_climb();
            if self.impurity == 0.0 {
                return;
            }
            let mut jumped = false;
            for _ in 0..max_perturbations {
                if self.random_jump(rng) {
                    jumped = true;
                    break;
                }
            }
            if !jumped {
                return;
            }
        }
    }

    /// Cycle over all coefficients (bias included) until a full cycle makes
    /// no move.
    fn hill_climb(&mut self) {
        loop {
            if self.impurity == 0.0 {
                return;
            }
            let mut improved = false;
            for coefficient in 0..=self.data.d() {
                if self.coordinate_step(coefficient) {
                    improved = true;
                    if self.impurity == 0.0 {
                        return;
                    }
                }
            }
            if !improved {
                return;
            }
        }
    }

    /// Re-optimize one coefficient with every other one frozen.
    ///
    /// Each sample with a nonzero value in the coefficient's attribute votes
    /// for the coefficient value that would put it exactly on the hyperplane;
    /// the 1-D scan picks the best boundary among those votes. The move is
    /// applied when it does not worsen the impurity, with equal-impurity
    /// moves rationed by the stagnation counter.
    fn coordinate_step(&mut self, coefficient: usize) -> bool {
        let d = self.data.d();
        let n = self.data.n();

        self.candidates.clear();
        if coefficient == d {
            // Bias: moving it shifts every margin by the same amount.
            for i in 0..n {
                self.candidates.push(Candidate {
                    value: self.coefficients[d] - self.vals[i],
                    label: self.data.label(i),
                });
            }
        } else {
            for i in 0..n {
                let x = self.data.value(i, coefficient);
                if x != 0.0 {
                    self.candidates.push(Candidate {
                        value: self.coefficients[coefficient] - self.vals[i] / x,
                        label: self.data.label(i),
                    });
                }
            }
        }
        if self.candidates.is_empty() {
            return false;
        }

        let new_value = linear_split(&mut self.candidates, self.measure, self.data.n_classes());
        let delta = new_value - self.coefficients[coefficient];

        for i in 0..n {
            let change = if coefficient == d {
                delta
            } else {
                delta * self.data.value(i, coefficient)
            };
            self.trial_vals[i] = self.vals[i] + change;
        }
        let trial_impurity = self.impurity_of_trial();

        let stagnant_move = (self.impurity - trial_impurity).abs() <= TOLERANCE;
        if self.impurity < trial_impurity
            || (stagnant_move && self.stagnant > MAX_STAGNANT_PERTURBATIONS)
        {
            return false;
        }

        if stagnant_move {
            self.stagnant += 1;
        } else {
            self.stagnant = 0;
        }

        // A shift below the tolerance would not move the hyperplane
        // meaningfully; leave everything in place.
        if delta.abs() <= TOLERANCE {
            return false;
        }

        self.coefficients[coefficient] = new_value;
        std::mem::swap(&mut self.vals, &mut self.trial_vals);
        if !stagnant_move {
            self.impurity = trial_impurity;
        }
        true
    }

    /// Perturb along a random direction by the best step the 1-D scan finds.
    /// Applied only on strict improvement.
    fn random_jump(&mut self, rng: &mut Xoshiro256PlusPlus) -> bool {
        let d = self.data.d();
        let n = self.data.n();
        let direction = random_coefficients(rng, d + 1);

        // Margin of each sample against the direction vector alone.
        let direction_vals: Vec<f64> = (0..n)
            .map(|i| {
                let mut value = direction[d];
                for (c, w) in direction[..d].iter().enumerate() {
                    value += w * self.data.value(i, c);
                }
                value
            })
            .collect();

        // Along the ray `h + alpha * direction`, sample i crosses the
        // hyperplane at alpha = -val_i / dir_i.
        self.candidates.clear();
        for i in 0..n {
            if direction_vals[i] != 0.0 {
                self.candidates.push(Candidate {
                    value: -(self.vals[i] / direction_vals[i]),
                    label: self.data.label(i),
                });
            }
        }
        if self.candidates.is_empty() {
            return false;
        }

        let alpha = linear_split(&mut self.candidates, self.measure, self.data.n_classes());
        for i in 0..n {
            self.trial_vals[i] = self.vals[i] + alpha * direction_vals[i];
        }
        let trial_impurity = self.impurity_of_trial();

        if trial_impurity < self.impurity {
            for (w, r) in self.coefficients.iter_mut().zip(&direction) {
                *w += alpha * r;
            }
            std::mem::swap(&mut self.vals, &mut self.trial_vals);
            self.impurity = trial_impurity;
            self.stagnant = 0;
            true
        } else {
            false
        }
    }

    fn impurity_of_vals_buf(&mut self) -> f64 {
        self.trial_vals.copy_from_slice(&self.vals);
        self.impurity_of_trial()
    }

    fn impurity_of_trial(&mut self) -> f64 {
        self.left.fill(0);
        self.right.fill(0);
        for (i, &value) in self.trial_vals.iter().enumerate() {
            if value < 0.0 {
                self.left[self.data.label(i) as usize] += 1;
            } else {
                self.right[self.data.label(i) as usize] += 1;
            }
        }
        split_impurity(self.measure, &self.left, &self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::axis_parallel_split;
    use ndarray::Array2;
    use rand::rngs::StdRng;

    fn diagonal_data(n: usize, seed: u64) -> NodeData {
        // Two classes separated by x + y = 1 with a margin.
        let mut rng = StdRng::seed_from_u64(seed);
        let mut x = Array2::zeros((n, 2));
        let mut y = Vec::with_capacity(n);
        let mut row = 0;
        while row < n {
            let a: f64 = rng.gen_range(0.0..1.0);
            let b: f64 = rng.gen_range(0.0..1.0);
            if (a + b - 1.0).abs() < 0.1 {
                continue;
            }
            x[[row, 0]] = a;
            x[[row, 1]] = b;
            y.push(u32::from(a + b > 1.0));
            row += 1;
        }
        NodeData::from_parts(x, y, 2)
    }

    fn params(n_restarts: u32) -> SearchParams {
        SearchParams {
            measure: ImpurityMeasure::GiniIndex,
            n_restarts,
            max_perturbations: 5,
            seed: 7,
        }
    }

    #[test]
    fn test_oblique_separates_diagonal_data() {
        let data = diagonal_data(80, 3);
        let ap = axis_parallel_split(&data, ImpurityMeasure::GiniIndex);
        // No single attribute separates a diagonal boundary.
        assert!(ap.impurity > 0.0);

        let split = oblique_split(
            &data,
            params(20),
            Some(&ap.coefficients),
            Parallelism::Sequential,
        );
        assert_eq!(split.impurity, 0.0);
    }

    #[test]
    fn test_seeded_search_never_worse_than_its_start() {
        for seed in 0..5 {
            let data = diagonal_data(60, seed);
            let ap = axis_parallel_split(&data, ImpurityMeasure::GiniIndex);
            let split = oblique_split(
                &data,
                params(4),
                Some(&ap.coefficients),
                Parallelism::Sequential,
            );
            assert!(split.impurity <= ap.impurity);
        }
    }

    #[test]
    fn test_same_seed_same_result() {
        let data = diagonal_data(60, 11);
        let a = oblique_split(&data, params(6), None, Parallelism::Sequential);
        let b = oblique_split(&data, params(6), None, Parallelism::Sequential);
        assert_eq!(a.coefficients, b.coefficients);
        assert_eq!(a.impurity, b.impurity);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let data = diagonal_data(60, 11);
        let sequential = oblique_split(&data, params(6), None, Parallelism::Sequential);
        let parallel = oblique_split(&data, params(6), None, Parallelism::Parallel);
        assert_eq!(sequential.coefficients, parallel.coefficients);
    }

    #[test]
    fn test_hill_climb_improves_from_any_start() {
        let data = diagonal_data(60, 2);
        let start = vec![0.3, -0.8, 0.1];
        let before = super::super::impurity_of(&data, ImpurityMeasure::GiniIndex, &start);
        let mut state = RestartState::new(&data, ImpurityMeasure::GiniIndex, start);
        state.hill_climb();
        assert!(state.impurity <= before);
    }
}
