//! Estimator-style model API.
//!
//! [`ObliqueTreeConfig`] collects every training knob behind a validating
//! builder; [`ObliqueTree`] owns a config and, after [`fit`](ObliqueTree::fit),
//! the induced [`Tree`].
//!
//! # Example
//!
//! ```
//! use oblique::{ObliqueTree, ObliqueTreeConfig, SamplesView, Splitter};
//!
//! let config = ObliqueTreeConfig::builder()
//!     .splitter(Splitter::Oc1AxisParallel)
//!     .n_restarts(10)
//!     .seed(7)
//!     .build()
//!     .unwrap();
//!
//! let data = [0.0, 0.0, 0.2, 0.1, 1.0, 0.9, 0.8, 1.0];
//! let labels = [0, 0, 1, 1];
//! let samples = SamplesView::from_slice(&data, 2);
//!
//! let mut model = ObliqueTree::new(config);
//! model.fit(samples, &labels).unwrap();
//! assert_eq!(model.predict(samples).unwrap(), labels);
//! ```

use std::num::NonZeroUsize;

use bon::Builder;
use thiserror::Error;

use crate::builder::TreeBuilder;
use crate::dataset::{n_classes, SamplesView};
use crate::error::{FitError, PredictError, PruneError};
use crate::impurity::ImpurityMeasure;
use crate::split::Splitter;
use crate::tree::Tree;
use crate::utils::run_with_threads;

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// At least one restart is required.
    #[error("n_restarts must be at least 1")]
    InvalidRestarts,
    /// The axis-parallel bias must be a positive finite factor.
    #[error("ap_bias must be positive and finite, got {0}")]
    InvalidApBias(f64),
    /// Trees need room for at least one split.
    #[error("max_depth must be at least 1")]
    InvalidMaxDepth,
    /// Subsets of fewer than two samples can never split.
    #[error("min_split_size must be at least 1")]
    InvalidMinSplitSize,
}

// =============================================================================
// ObliqueTreeConfig
// =============================================================================

/// Training configuration for [`ObliqueTree`].
///
/// Defaults follow the classic OC1 settings: the seeded oblique splitter is
/// selected with [`Splitter::Oc1AxisParallel`], while the default
/// [`Splitter::Oc1`] searches from random hyperplanes only.
///
/// # Example
///
/// ```
/// use oblique::{ImpurityMeasure, ObliqueTreeConfig};
///
/// // All defaults.
/// let config = ObliqueTreeConfig::builder().build().unwrap();
/// assert_eq!(config.n_restarts, 20);
///
/// // Customized search.
/// let config = ObliqueTreeConfig::builder()
///     .impurity(ImpurityMeasure::GiniIndex)
///     .n_restarts(50)
///     .max_perturbations(10)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct ObliqueTreeConfig {
    // === Split search ===
    /// Split search mode. Default: [`Splitter::Oc1`].
    #[builder(default)]
    pub splitter: Splitter,

    /// Impurity measure to minimize. Default: [`ImpurityMeasure::Hellinger`].
    #[builder(default)]
    pub impurity: ImpurityMeasure,

    /// Independent restarts of the randomized oblique search per node.
    /// Default: 20.
    #[builder(default = 20)]
    pub n_restarts: u32,

    /// Random-jump attempts when hill-climbing stalls. Default: 5.
    #[builder(default = 5)]
    pub max_perturbations: u32,

    // === Stop rules ===
    /// Maximum tree depth in edges. Default: 50.
    #[builder(default = 50)]
    pub max_depth: u32,

    /// Subsets of at most this many samples become leaves. Default: 3.
    #[builder(default = 3)]
    pub min_split_size: usize,

    /// Subsets of at most this many samples skip the oblique search.
    /// `None` uses `2 * n_attributes`.
    pub min_oblique_size: Option<usize>,

    // === Search behavior ===
    /// An oblique split replaces the axis-parallel one only when
    /// `ap_bias * oblique_impurity < axis_parallel_impurity`. Default: 1.0.
    #[builder(default = 1.0)]
    pub ap_bias: f64,

    /// Shift each node's samples into the positive quadrant before the
    /// oblique search. Default: true.
    #[builder(default = true)]
    pub normalize: bool,

    // === Resource control ===
    /// Number of threads. `None` uses all available cores.
    pub n_threads: Option<NonZeroUsize>,

    // === Reproducibility ===
    /// Random seed; the only source of randomness in training. Default: 42.
    #[builder(default = 42)]
    pub seed: u64,
}

/// Custom finishing function that validates the config.
impl<S: oblique_tree_config_builder::IsComplete> ObliqueTreeConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any parameter is invalid:
    /// - `n_restarts == 0`
    /// - `ap_bias` non-positive or non-finite
    /// - `max_depth == 0`
    /// - `min_split_size == 0`
    pub fn build(self) -> Result<ObliqueTreeConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl ObliqueTreeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.n_restarts == 0 {
            return Err(ConfigError::InvalidRestarts);
        }
        if !(self.ap_bias.is_finite() && self.ap_bias > 0.0) {
            return Err(ConfigError::InvalidApBias(self.ap_bias));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidMaxDepth);
        }
        if self.min_split_size == 0 {
            return Err(ConfigError::InvalidMinSplitSize);
        }
        Ok(())
    }
}

impl Default for ObliqueTreeConfig {
    fn default() -> Self {
        Self::builder().build().expect("default config is valid")
    }
}

// =============================================================================
// ObliqueTree
// =============================================================================

/// An oblique decision tree classifier.
///
/// Freshly constructed models are unfitted; every query before a successful
/// [`fit`](Self::fit) fails with a not-fitted error. Refitting replaces the
/// tree wholesale.
#[derive(Debug, Clone, Default)]
pub struct ObliqueTree {
    config: ObliqueTreeConfig,
    tree: Option<Tree>,
}

impl ObliqueTree {
    pub fn new(config: ObliqueTreeConfig) -> Self {
        Self { config, tree: None }
    }

    #[inline]
    pub fn config(&self) -> &ObliqueTreeConfig {
        &self.config
    }

    /// The fitted tree, if any.
    #[inline]
    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    /// Induce a tree over `samples` (one row per sample) and `labels`
    /// (class indices, `0..n_classes`).
    ///
    /// Training is deterministic given the config: the same inputs and seed
    /// produce the same tree, regardless of thread count.
    pub fn fit(&mut self, samples: SamplesView<'_>, labels: &[u32]) -> Result<(), FitError> {
        if samples.n_samples() == 0 {
            return Err(FitError::EmptyDataset);
        }
        if samples.n_attributes() == 0 {
            return Err(FitError::NoAttributes);
        }
        if samples.n_samples() != labels.len() {
            return Err(FitError::LabelMismatch {
                samples: samples.n_samples(),
                labels: labels.len(),
            });
        }

        let n_classes = n_classes(labels);
        let config = &self.config;
        let tree = run_with_threads(self.threads(), |parallelism| {
            TreeBuilder::new(samples, labels, n_classes, config, parallelism).build()
        });
        self.tree = Some(tree);
        Ok(())
    }

    /// Predict a class for every row.
    pub fn predict(&self, samples: SamplesView<'_>) -> Result<Vec<u32>, PredictError> {
        let tree = self.fitted()?;
        run_with_threads(self.threads(), |parallelism| {
            tree.predict(samples, parallelism)
        })
    }

    /// Reduced-error pruning against a labeled sample set; see
    /// [`Tree::pruned`]. Replaces the fitted tree in place.
    pub fn prune(&mut self, samples: SamplesView<'_>, labels: &[u32]) -> Result<(), PruneError> {
        let tree = self.tree.as_ref().ok_or(PruneError::NotFitted)?;
        self.tree = Some(tree.pruned(samples, labels)?);
        Ok(())
    }

    /// Depth of the fitted tree, in edges.
    pub fn tree_depth(&self) -> Result<u32, PredictError> {
        Ok(self.fitted()?.depth())
    }

    /// Number of leaves in the fitted tree.
    pub fn leaf_count(&self) -> Result<usize, PredictError> {
        Ok(self.fitted()?.leaf_count())
    }

    /// Number of internal (split) nodes in the fitted tree.
    pub fn node_count(&self) -> Result<usize, PredictError> {
        Ok(self.fitted()?.node_count())
    }

    /// Coefficient vectors of the internal nodes in pre-order, each
    /// `n_attributes + 1` long with the bias last.
    pub fn coefficients(&self) -> Result<Vec<Vec<f64>>, PredictError> {
        Ok(self
            .fitted()?
            .split_coefficients()
            .into_iter()
            .map(<[f64]>::to_vec)
            .collect())
    }

    fn fitted(&self) -> Result<&Tree, PredictError> {
        self.tree.as_ref().ok_or(PredictError::NotFitted)
    }

    fn threads(&self) -> usize {
        self.config.n_threads.map_or(0, NonZeroUsize::get)
    }
}

// =============================================================================
// Tests
// =============================================================================
