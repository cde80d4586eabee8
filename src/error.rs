//! Error types for the public training and prediction surfaces.

use thiserror::Error;

/// Errors raised by [`ObliqueTree::fit`](crate::model::ObliqueTree::fit)
/// when the training inputs violate the data contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FitError {
    /// The training set has no samples.
    #[error("training set is empty")]
    EmptyDataset,

    /// The training set has no attributes (zero-width rows).
    #[error("training set has no attributes")]
    NoAttributes,

    /// The label slice length does not match the number of samples.
    #[error("label count {labels} does not match sample count {samples}")]
    LabelMismatch { samples: usize, labels: usize },
}

/// Errors raised when querying or applying a model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictError {
    /// The model has not been fitted yet.
    #[error("model has not been fitted")]
    NotFitted,

    /// The query rows have a different width than the training rows.
    #[error("expected {expected} attributes per sample, got {actual}")]
    AttributeMismatch { expected: usize, actual: usize },
}

/// Errors raised by reduced-error pruning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PruneError {
    /// The model has not been fitted yet.
    #[error("model has not been fitted")]
    NotFitted,

    /// The pruning rows have a different width than the training rows.
    #[error("expected {expected} attributes per sample, got {actual}")]
    AttributeMismatch { expected: usize, actual: usize },

    /// The label slice length does not match the number of pruning samples.
    #[error("label count {labels} does not match sample count {samples}")]
    LabelMismatch { samples: usize, labels: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = FitError::LabelMismatch {
            samples: 10,
            labels: 8,
        };
        assert_eq!(e.to_string(), "label count 8 does not match sample count 10");

        let e = PredictError::AttributeMismatch {
            expected: 4,
            actual: 3,
        };
        assert_eq!(e.to_string(), "expected 4 attributes per sample, got 3");
    }
}
