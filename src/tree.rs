//! Fitted decision trees.
//!
//! Nodes live in a flat arena addressed by [`NodeId`], root at index 0, laid
//! out in pre-order (a node precedes its children). Leaves are explicit, so
//! every split has exactly two children and `leaf_count == node_count + 1`
//! always holds.

use ndarray::ArrayView1;

use crate::dataset::SamplesView;
use crate::error::{PredictError, PruneError};
use crate::hyperplane::{Hyperplane, Side};
use crate::utils::Parallelism;

/// Index of a node within its tree's arena.
pub type NodeId = u32;

/// One tree node: an oblique split or a class leaf.
///
/// Split nodes also carry the majority class of the samples that reached
/// them during training; pruning collapses a split into a leaf with that
/// label.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Split {
        hyperplane: Hyperplane,
        left: NodeId,
        right: NodeId,
        /// Majority class of the training samples at this node.
        label: u32,
        n_samples: u32,
    },
    Leaf {
        label: u32,
        n_samples: u32,
    },
}

impl Node {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Majority class at this node.
    #[inline]
    pub fn label(&self) -> u32 {
        match self {
            Node::Split { label, .. } | Node::Leaf { label, .. } => *label,
        }
    }

    /// Training samples that reached this node.
    #[inline]
    pub fn n_samples(&self) -> u32 {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }
}

// =============================================================================
// TreeValidationError
// =============================================================================

/// Structural validation errors for [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeValidationError {
    /// Tree has no nodes.
    EmptyTree,
    /// A child pointer references an out-of-bounds node.
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: NodeId,
        n_nodes: usize,
    },
    /// A node references itself as a child.
    SelfLoop { node: NodeId },
    /// A node was reached by more than one path.
    DuplicateVisit { node: NodeId },
    /// A cycle was detected during traversal.
    CycleDetected { node: NodeId },
    /// A node exists in storage but is unreachable from the root.
    UnreachableNode { node: NodeId },
    /// A split node's hyperplane has the wrong number of weights.
    WeightCountMismatch {
        node: NodeId,
        expected: usize,
        actual: usize,
    },
}

// =============================================================================
// Tree
// =============================================================================

/// A fitted oblique decision tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
    n_attributes: usize,
}

impl Tree {
    pub(crate) fn new(nodes: Vec<Node>, n_attributes: usize) -> Self {
        debug_assert!(!nodes.is_empty());
        Self {
            nodes,
            n_attributes,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        0
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Attribute count the tree was trained on.
    #[inline]
    pub fn n_attributes(&self) -> usize {
        self.n_attributes
    }

    /// Number of internal (split) nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_leaf()).count()
    }

    /// Number of leaves. Always `node_count() + 1`.
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Longest root-to-leaf path, in edges. A single-leaf tree has depth 0.
    pub fn depth(&self) -> u32 {
        let mut max_depth = 0;
        let mut stack: Vec<(NodeId, u32)> = vec![(self.root(), 0)];
        while let Some((id, depth)) = stack.pop() {
            match self.node(id) {
                Node::Leaf { .. } => max_depth = max_depth.max(depth),
                Node::Split { left, right, .. } => {
                    stack.push((*left, depth + 1));
                    stack.push((*right, depth + 1));
                }
            }
        }
        max_depth
    }

    /// Route one sample to its leaf and return the leaf's class.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> u32 {
        let mut id = self.root();
        loop {
            match self.node(id) {
                Node::Leaf { label, .. } => return *label,
                Node::Split {
                    hyperplane,
                    left,
                    right,
                    ..
                } => {
                    id = match hyperplane.side(row) {
                        Side::Left => *left,
                        Side::Right => *right,
                    };
                }
            }
        }
    }

    /// Predict a class for every row.
    pub fn predict(
        &self,
        samples: SamplesView<'_>,
        parallelism: Parallelism,
    ) -> Result<Vec<u32>, PredictError> {
        if samples.n_attributes() != self.n_attributes {
            return Err(PredictError::AttributeMismatch {
                expected: self.n_attributes,
                actual: samples.n_attributes(),
            });
        }
        Ok(parallelism
            .maybe_par_map(0..samples.n_samples(), |i| self.predict_row(samples.row(i))))
    }

    /// Coefficient vectors of the internal nodes, pre-order, each of length
    /// `n_attributes + 1` with the bias last.
    pub fn split_coefficients(&self) -> Vec<&[f64]> {
        let mut out = Vec::with_capacity(self.node_count());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            if let Node::Split {
                hyperplane,
                left,
                right,
                ..
            } = self.node(id)
            {
                out.push(hyperplane.coefficients());
                stack.push(*right);
                stack.push(*left);
            }
        }
        out
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate basic structural invariants.
    ///
    /// Intended for debug checks and tests.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        let n_nodes = self.nodes.len();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }

        // Iterative DFS with color marking.
        // 0 = unvisited, 1 = visiting, 2 = done
        let mut color = vec![0u8; n_nodes];
        let mut stack: Vec<(NodeId, u8)> = vec![(self.root(), 0)];

        while let Some((id, phase)) = stack.pop() {
            let idx = id as usize;
            match phase {
                0 => {
                    match color[idx] {
                        0 => {}
                        1 => return Err(TreeValidationError::CycleDetected { node: id }),
                        2 => return Err(TreeValidationError::DuplicateVisit { node: id }),
                        _ => unreachable!(),
                    }
                    color[idx] = 1;
                    stack.push((id, 1));

                    if let Node::Split {
                        hyperplane,
                        left,
                        right,
                        ..
                    } = self.node(id)
                    {
                        if hyperplane.n_attributes() != self.n_attributes {
                            return Err(TreeValidationError::WeightCountMismatch {
                                node: id,
                                expected: self.n_attributes,
                                actual: hyperplane.n_attributes(),
                            });
                        }
                        let (left, right) = (*left, *right);
                        if left == id || right == id {
                            return Err(TreeValidationError::SelfLoop { node: id });
                        }
                        for (side, child) in [("left", left), ("right", right)] {
                            if child as usize >= n_nodes {
                                return Err(TreeValidationError::ChildOutOfBounds {
                                    node: id,
                                    side,
                                    child,
                                    n_nodes,
                                });
                            }
                        }
                        stack.push((right, 0));
                        stack.push((left, 0));
                    }
                }
                1 => color[idx] = 2,
                _ => unreachable!(),
            }
        }

        for (i, &c) in color.iter().enumerate() {
            if c == 0 {
                return Err(TreeValidationError::UnreachableNode { node: i as NodeId });
            }
        }

        Ok(())
    }

    // =========================================================================
    // Pruning
    // =========================================================================

    /// Reduced-error pruning against a labeled sample set.
    ///
    /// Routes every sample down the tree, then collapses each split whose
    /// majority-class leaf would misclassify no more of its samples than the
    /// subtree does. Deterministic, and only ever simplifies the tree. An
    /// empty sample set leaves the tree unchanged.
    pub fn pruned(&self, samples: SamplesView<'_>, labels: &[u32]) -> Result<Tree, PruneError> {
        if samples.n_attributes() != self.n_attributes {
            return Err(PruneError::AttributeMismatch {
                expected: self.n_attributes,
                actual: samples.n_attributes(),
            });
        }
        if samples.n_samples() != labels.len() {
            return Err(PruneError::LabelMismatch {
                samples: samples.n_samples(),
                labels: labels.len(),
            });
        }
        if samples.n_samples() == 0 {
            return Ok(self.clone());
        }

        // Misclassifications at each node if it were a leaf.
        let mut wrong_as_leaf = vec![0u32; self.nodes.len()];
        let mut reached = vec![false; self.nodes.len()];
        for (i, &label) in labels.iter().enumerate() {
            let row = samples.row(i);
            let mut id = self.root();
            loop {
                reached[id as usize] = true;
                if self.node(id).label() != label {
                    wrong_as_leaf[id as usize] += 1;
                }
                match self.node(id) {
                    Node::Leaf { .. } => break,
                    Node::Split {
                        hyperplane,
                        left,
                        right,
                        ..
                    } => {
                        id = match hyperplane.side(row) {
                            Side::Left => *left,
                            Side::Right => *right,
                        };
                    }
                }
            }
        }

        // Children follow their parent in the arena, so a reverse sweep sees
        // every subtree before its root.
        let mut subtree_wrong = vec![0u32; self.nodes.len()];
        for id in (0..self.nodes.len()).rev() {
            subtree_wrong[id] = match &self.nodes[id] {
                Node::Leaf { .. } => wrong_as_leaf[id],
                Node::Split { left, right, .. } => {
                    subtree_wrong[*left as usize] + subtree_wrong[*right as usize]
                }
            };
        }

        let mut nodes = Vec::with_capacity(self.nodes.len());
        self.copy_pruned(self.root(), &wrong_as_leaf, &subtree_wrong, &reached, &mut nodes);
        Ok(Tree::new(nodes, self.n_attributes))
    }

    fn copy_pruned(
        &self,
        id: NodeId,
        wrong_as_leaf: &[u32],
        subtree_wrong: &[u32],
        reached: &[bool],
        out: &mut Vec<Node>,
    ) -> NodeId {
        let node = self.node(id);
        let collapse = !node.is_leaf()
            && reached[id as usize]
            && wrong_as_leaf[id as usize] <= subtree_wrong[id as usize];

        let new_id = out.len() as NodeId;
        match node {
            Node::Leaf { .. } => out.push(node.clone()),
            Node::Split { label, n_samples, .. } if collapse => out.push(Node::Leaf {
                label: *label,
                n_samples: *n_samples,
            }),
            Node::Split {
                hyperplane,
                left,
                right,
                label,
                n_samples,
            } => {
                out.push(Node::Split {
                    hyperplane: hyperplane.clone(),
                    left: 0,
                    right: 0,
                    label: *label,
                    n_samples: *n_samples,
                });
                let new_left = self.copy_pruned(*left, wrong_as_leaf, subtree_wrong, reached, out);
                let new_right =
                    self.copy_pruned(*right, wrong_as_leaf, subtree_wrong, reached, out);
                if let Node::Split { left, right, .. } = &mut out[new_id as usize] {
                    *left = new_left;
                    *right = new_right;
                }
            }
        }
        new_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn stump() -> Tree {
        // x - 1.5: left -> class 0, right -> class 1.
        Tree::new(
            vec![
                Node::Split {
                    hyperplane: Hyperplane::from_coefficients(vec![1.0, -1.5]),
                    left: 1,
                    right: 2,
                    label: 0,
                    n_samples: 4,
                },
                Node::Leaf {
                    label: 0,
                    n_samples: 2,
                },
                Node::Leaf {
                    label: 1,
                    n_samples: 2,
                },
            ],
            1,
        )
    }

    #[test]
    fn test_counts_and_depth() {
        let tree = stump();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.leaf_count(), tree.node_count() + 1);
        assert_eq!(tree.depth(), 1);
        tree.validate().unwrap();
    }

    #[test]
    fn test_single_leaf_tree() {
        let tree = Tree::new(
            vec![Node::Leaf {
                label: 3,
                n_samples: 9,
            }],
            2,
        );
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.node_count(), 0);
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.predict_row(array![5.0, 5.0].view()), 3);
        tree.validate().unwrap();
    }

    #[test]
    fn test_predict_routes_by_side() {
        let tree = stump();
        let data = [1.0, 1.5, 2.0];
        let samples = SamplesView::from_slice(&data, 1);
        let predictions = tree.predict(samples, Parallelism::Sequential).unwrap();
        // 1.5 sits exactly on the hyperplane and goes right.
        assert_eq!(predictions, vec![0, 1, 1]);
    }

    #[test]
    fn test_predict_checks_width() {
        let tree = stump();
        let data = [1.0, 2.0];
        let samples = SamplesView::from_slice(&data, 2);
        assert_eq!(
            tree.predict(samples, Parallelism::Sequential),
            Err(PredictError::AttributeMismatch {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn test_split_coefficients_pre_order() {
        // Root split, left child split, three leaves.
        let tree = Tree::new(
            vec![
                Node::Split {
                    hyperplane: Hyperplane::from_coefficients(vec![1.0, -4.0]),
                    left: 1,
                    right: 4,
                    label: 0,
                    n_samples: 6,
                },
                Node::Split {
                    hyperplane: Hyperplane::from_coefficients(vec![1.0, -2.0]),
                    left: 2,
                    right: 3,
                    label: 0,
                    n_samples: 4,
                },
                Node::Leaf {
                    label: 0,
                    n_samples: 2,
                },
                Node::Leaf {
                    label: 1,
                    n_samples: 2,
                },
                Node::Leaf {
                    label: 2,
                    n_samples: 2,
                },
            ],
            1,
        );
        tree.validate().unwrap();
        let coefficients = tree.split_coefficients();
        assert_eq!(coefficients, vec![&[1.0, -4.0][..], &[1.0, -2.0][..]]);
    }

    #[test]
    fn test_validate_rejects_out_of_bounds_child() {
        let tree = Tree::new(
            vec![
                Node::Split {
                    hyperplane: Hyperplane::from_coefficients(vec![1.0, 0.0]),
                    left: 1,
                    right: 9,
                    label: 0,
                    n_samples: 2,
                },
                Node::Leaf {
                    label: 0,
                    n_samples: 1,
                },
            ],
            1,
        );
        assert!(matches!(
            tree.validate(),
            Err(TreeValidationError::ChildOutOfBounds { side: "right", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unreachable_node() {
        let tree = Tree::new(
            vec![
                Node::Leaf {
                    label: 0,
                    n_samples: 1,
                },
                Node::Leaf {
                    label: 1,
                    n_samples: 1,
                },
            ],
            1,
        );
        assert!(matches!(
            tree.validate(),
            Err(TreeValidationError::UnreachableNode { node: 1 })
        ));
    }

    #[test]
    fn test_prune_collapses_useless_split() {
        // Both leaves predict what the parent majority already predicts on
        // this sample set, so the split collapses.
        let tree = stump();
        let data = [1.0, 1.2, 2.0, 2.5];
        let samples = SamplesView::from_slice(&data, 1);
        // All labels 0: the right leaf (class 1) misclassifies two samples,
        // a root leaf of class 0 misclassifies none.
        let pruned = tree.pruned(samples, &[0, 0, 0, 0]).unwrap();
        assert_eq!(pruned.leaf_count(), 1);
        assert_eq!(pruned.predict_row(array![2.0].view()), 0);
        pruned.validate().unwrap();
    }

    #[test]
    fn test_prune_keeps_useful_split() {
        let tree = stump();
        let data = [1.0, 1.2, 2.0, 2.5];
        let samples = SamplesView::from_slice(&data, 1);
        let pruned = tree.pruned(samples, &[0, 0, 1, 1]).unwrap();
        assert_eq!(pruned, tree);
    }

    #[test]
    fn test_prune_empty_set_is_identity() {
        let tree = stump();
        let samples = SamplesView::from_slice(&[], 1);
        let pruned = tree.pruned(samples, &[]).unwrap();
        assert_eq!(pruned, tree);
    }

    #[test]
    fn test_prune_checks_inputs() {
        let tree = stump();
        let data = [1.0, 2.0];
        assert!(matches!(
            tree.pruned(SamplesView::from_slice(&data, 2), &[0]),
            Err(PruneError::AttributeMismatch { .. })
        ));
        assert!(matches!(
            tree.pruned(SamplesView::from_slice(&data, 1), &[0]),
            Err(PruneError::LabelMismatch { .. })
        ));
    }
}
