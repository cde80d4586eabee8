//! Oblique decision tree classification.
//!
//! Classic univariate decision trees test one attribute per node; the trees
//! built here split on hyperplanes over all attributes at once, found with
//! OC1-style randomized coordinate hill-climbing (plus axis-parallel and
//! CART linear-combination modes). Training is deterministic given the seed,
//! whatever the thread count.
//!
//! # Quick start
//!
//! ```
//! use oblique::{ObliqueTree, ObliqueTreeConfig, SamplesView, Splitter};
//!
//! // Four samples, two attributes each, two classes.
//! let data = [
//!     0.1, 0.2, //
//!     0.2, 0.0, //
//!     0.9, 1.0, //
//!     1.0, 0.8,
//! ];
//! let labels = [0, 0, 1, 1];
//! let samples = SamplesView::from_slice(&data, 2);
//!
//! let config = ObliqueTreeConfig::builder()
//!     .splitter(Splitter::Oc1AxisParallel)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//! let mut model = ObliqueTree::new(config);
//! model.fit(samples, &labels).unwrap();
//!
//! assert_eq!(model.predict(samples).unwrap(), labels);
//! assert_eq!(model.leaf_count().unwrap(), model.node_count().unwrap() + 1);
//! ```

mod builder;

pub mod dataset;
pub mod error;
pub mod hyperplane;
pub mod impurity;
pub mod model;
pub mod split;
pub mod testing;
pub mod tree;
pub mod utils;

pub use dataset::SamplesView;
pub use error::{FitError, PredictError, PruneError};
pub use hyperplane::{Hyperplane, Side};
pub use impurity::ImpurityMeasure;
pub use model::{ConfigError, ObliqueTree, ObliqueTreeConfig};
pub use split::{ParseSplitterError, Splitter};
pub use tree::{Node, NodeId, Tree, TreeValidationError};
pub use utils::{run_with_threads, Parallelism};

// Re-export for use in tests and examples.
pub use approx;
