//! Recursive tree construction.
//!
//! The builder partitions row-index subsets of the training view top-down.
//! At each node it materializes the subset, applies the stop rules, runs the
//! configured split search, and either records a split or a majority-class
//! leaf. Nodes are pushed parent-first, so the arena is laid out in
//! pre-order.

use crate::dataset::{class_counts, majority_class, SamplesView};
use crate::hyperplane::{Hyperplane, Side};
use crate::model::ObliqueTreeConfig;
use crate::split::{
    axis_parallel_split, cart_split, oblique_split, unshift_bias, NodeData, ScoredSplit,
    SearchParams, Splitter,
};
use crate::tree::{Node, NodeId, Tree};
use crate::utils::Parallelism;

pub(crate) struct TreeBuilder<'a, 'b> {
    samples: SamplesView<'a>,
    labels: &'b [u32],
    n_classes: usize,
    config: &'b ObliqueTreeConfig,
    parallelism: Parallelism,
    nodes: Vec<Node>,
}

impl<'a, 'b> TreeBuilder<'a, 'b> {
    pub fn new(
        samples: SamplesView<'a>,
        labels: &'b [u32],
        n_classes: usize,
        config: &'b ObliqueTreeConfig,
        parallelism: Parallelism,
    ) -> Self {
        Self {
            samples,
            labels,
            n_classes,
            config,
            parallelism,
            nodes: Vec::new(),
        }
    }

    pub fn build(mut self) -> Tree {
        let rows: Vec<u32> = (0..self.samples.n_samples() as u32).collect();
        self.grow(rows, 0);
        Tree::new(self.nodes, self.samples.n_attributes())
    }

    /// Grow the subtree over `rows` and return its root's arena index.
    fn grow(&mut self, rows: Vec<u32>, depth: u32) -> NodeId {
        let counts = class_counts(rows.iter().map(|&r| self.labels[r as usize]), self.n_classes);
        let label = majority_class(&counts);
        let n = rows.len();

        let is_pure = counts[label as usize] as usize == n;
        if is_pure || n <= self.config.min_split_size || depth >= self.config.max_depth {
            return self.push_leaf(label, n);
        }

        let data = NodeData::gather(self.samples, self.labels, &rows, self.n_classes);
        let initial_impurity = data.initial_impurity(self.config.impurity);
        if initial_impurity == 0.0 {
            return self.push_leaf(label, n);
        }

        let Some(best) = self.search(&data, depth) else {
            return self.push_leaf(label, n);
        };
        // No hyperplane improved on leaving the subset unsplit.
        if best.impurity >= initial_impurity {
            return self.push_leaf(label, n);
        }

        let hyperplane = Hyperplane::from_coefficients(best.coefficients);
        let mut left_rows = Vec::new();
        let mut right_rows = Vec::new();
        for &row in &rows {
            match hyperplane.side(self.samples.row(row as usize)) {
                Side::Left => left_rows.push(row),
                Side::Right => right_rows.push(row),
            }
        }
        if left_rows.is_empty() || right_rows.is_empty() {
            return self.push_leaf(label, n);
        }

        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node::Split {
            hyperplane,
            left: 0,
            right: 0,
            label,
            n_samples: n as u32,
        });
        let left_id = self.grow(left_rows, depth + 1);
        let right_id = self.grow(right_rows, depth + 1);
        if let Node::Split { left, right, .. } = &mut self.nodes[id as usize] {
            *left = left_id;
            *right = right_id;
        }
        id
    }

    fn push_leaf(&mut self, label: u32, n_samples: usize) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node::Leaf {
            label,
            n_samples: n_samples as u32,
        });
        id
    }

    /// Best split over the node's samples per the configured mode, or `None`
    /// when the mode has nothing to offer for a subset this small.
    fn search(&self, data: &NodeData, depth: u32) -> Option<ScoredSplit> {
        let config = self.config;
        let min_oblique = config
            .min_oblique_size
            .unwrap_or(2 * self.samples.n_attributes());
        let params = SearchParams {
            measure: config.impurity,
            n_restarts: config.n_restarts,
            max_perturbations: config.max_perturbations,
            // One stream per node; the arena position makes it unique and
            // the build order makes it reproducible.
            seed: node_seed(config.seed, self.nodes.len() as u64),
        };

        match config.splitter {
            Splitter::AxisParallel => Some(axis_parallel_split(data, config.impurity)),
            Splitter::Oc1 => {
                if data.n() <= min_oblique {
                    return None;
                }
                Some(self.oblique(data, params, None))
            }
            Splitter::Oc1AxisParallel => {
                let ap = axis_parallel_split(data, config.impurity);
                if ap.impurity == 0.0 || data.n() <= min_oblique {
                    return Some(ap);
                }
                let oblique = self.oblique(data, params, Some(&ap.coefficients));
                // The oblique hyperplane must beat the axis-parallel one by
                // the configured bias factor to be worth its complexity.
                if config.ap_bias * oblique.impurity < ap.impurity {
                    Some(oblique)
                } else {
                    Some(ap)
                }
            }
            Splitter::Cart => {
                let ap = axis_parallel_split(data, config.impurity);
                if ap.impurity == 0.0 || (depth != 0 && data.n() <= min_oblique) {
                    return Some(ap);
                }
                Some(cart_split(data, config.impurity, &ap.coefficients))
            }
        }
    }

    /// Run the randomized search, shifting the subset into the positive
    /// quadrant first when normalization is on.
    fn oblique(
        &self,
        data: &NodeData,
        params: SearchParams,
        start: Option<&[f64]>,
    ) -> ScoredSplit {
        if self.config.normalize {
            let (shifted, shifts) = data.shifted_to_positive();
            let mut split = oblique_split(&shifted, params, start, self.parallelism);
            unshift_bias(&mut split.coefficients, &shifts);
            split
        } else {
            oblique_split(data, params, start, self.parallelism)
        }
    }
}

/// Mix the model seed with a node's arena position (splitmix64 finalizer).
fn node_seed(seed: u64, position: u64) -> u64 {
    let mut z = seed ^ position.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impurity::ImpurityMeasure;

    fn config(splitter: Splitter) -> ObliqueTreeConfig {
        ObliqueTreeConfig::builder()
            .splitter(splitter)
            .impurity(ImpurityMeasure::GiniIndex)
            .build()
            .unwrap()
    }

    #[test]
    fn test_pure_subset_is_a_single_leaf() {
        let data = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let samples = SamplesView::from_slice(&data, 1);
        let labels = vec![2, 2, 2, 2, 2, 2];
        let cfg = config(Splitter::AxisParallel);
        let tree = TreeBuilder::new(samples, &labels, 3, &cfg, Parallelism::Sequential).build();
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.node(tree.root()).label(), 2);
    }

    #[test]
    fn test_tiny_subset_is_a_single_leaf() {
        // Mixed classes, but at or below the minimum split size.
        let data = [0.0, 1.0, 2.0];
        let samples = SamplesView::from_slice(&data, 1);
        let labels = vec![0, 1, 1];
        let cfg = config(Splitter::AxisParallel);
        let tree = TreeBuilder::new(samples, &labels, 2, &cfg, Parallelism::Sequential).build();
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.node(tree.root()).label(), 1);
    }

    #[test]
    fn test_axis_parallel_builds_separating_stump() {
        let data = [0.0, 1.0, 2.0, 10.0, 11.0, 12.0];
        let samples = SamplesView::from_slice(&data, 1);
        let labels = vec![0, 0, 0, 1, 1, 1];
        let cfg = config(Splitter::AxisParallel);
        let tree = TreeBuilder::new(samples, &labels, 2, &cfg, Parallelism::Sequential).build();
        tree.validate().unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.depth(), 1);
        let predictions = tree.predict(samples, Parallelism::Sequential).unwrap();
        assert_eq!(predictions, labels);
    }

    #[test]
    fn test_max_depth_caps_growth() {
        // Alternating classes force deep recursion unless capped.
        let data: Vec<f64> = (0..32).map(f64::from).collect();
        let samples = SamplesView::from_slice(&data, 1);
        let labels: Vec<u32> = (0..32).map(|i| i % 2).collect();
        let cfg = ObliqueTreeConfig::builder()
            .splitter(Splitter::AxisParallel)
            .impurity(ImpurityMeasure::GiniIndex)
            .max_depth(2)
            .build()
            .unwrap();
        let tree = TreeBuilder::new(samples, &labels, 2, &cfg, Parallelism::Sequential).build();
        tree.validate().unwrap();
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn test_oblique_mode_skips_small_subsets() {
        // 4 samples in 2 attributes: at most 2*d = 4, so the oblique-only
        // mode refuses to split and the tree is a leaf.
        let data = [0.0, 0.0, 0.1, 0.1, 1.0, 1.0, 1.1, 1.1];
        let samples = SamplesView::from_slice(&data, 2);
        let labels = vec![0, 0, 1, 1];
        let cfg = config(Splitter::Oc1);
        let tree = TreeBuilder::new(samples, &labels, 2, &cfg, Parallelism::Sequential).build();
        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn test_node_seed_spreads() {
        let a = node_seed(42, 0);
        let b = node_seed(42, 1);
        let c = node_seed(43, 0);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
