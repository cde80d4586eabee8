//! Zero-copy views over training and query data.
//!
//! The engine consumes a rectangular sample-major matrix: one row per
//! sample, one column per attribute, rows contiguous in memory. Labels are
//! small dense class indices (`0..n_classes`) in a plain slice, so class
//! histograms are arrays indexed by label.

use ndarray::{ArrayView1, ArrayView2};

/// Sample-major feature matrix view: `[n_samples, n_attributes]`.
///
/// Wraps an `ndarray` view so callers can hand over a slice or any
/// row-major array without copying.
#[derive(Clone, Copy, Debug)]
pub struct SamplesView<'a> {
    data: ArrayView2<'a, f64>,
}

impl<'a> SamplesView<'a> {
    /// View over an existing 2-D array (rows = samples).
    pub fn from_array(data: ArrayView2<'a, f64>) -> Self {
        Self { data }
    }

    /// View over a flat row-major slice.
    ///
    /// # Panics
    /// Panics if `data.len()` is not a multiple of `n_attributes`.
    pub fn from_slice(data: &'a [f64], n_attributes: usize) -> Self {
        assert!(n_attributes > 0, "n_attributes must be positive");
        assert_eq!(
            data.len() % n_attributes,
            0,
            "data length {} is not a multiple of n_attributes {}",
            data.len(),
            n_attributes
        );
        let n_samples = data.len() / n_attributes;
        let data = ArrayView2::from_shape((n_samples, n_attributes), data)
            .expect("shape checked above");
        Self { data }
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn n_attributes(&self) -> usize {
        self.data.ncols()
    }

    /// One sample's attribute vector.
    #[inline]
    pub fn row(&self, sample: usize) -> ArrayView1<'a, f64> {
        self.data.index_axis_move(ndarray::Axis(0), sample)
    }

    #[inline]
    pub fn value(&self, sample: usize, attribute: usize) -> f64 {
        self.data[[sample, attribute]]
    }
}

/// Number of classes implied by a label slice (`max + 1`).
///
/// Labels are class indices, so absent intermediate classes still count:
/// labels `[0, 2]` imply 3 classes.
pub fn n_classes(labels: &[u32]) -> usize {
    labels.iter().copied().max().map_or(0, |m| m as usize + 1)
}

/// Per-class occurrence counts over `labels`, length `n_classes`.
pub fn class_counts(labels: impl IntoIterator<Item = u32>, n_classes: usize) -> Vec<u32> {
    let mut counts = vec![0u32; n_classes];
    for label in labels {
        counts[label as usize] += 1;
    }
    counts
}

/// Index of the largest count, lowest index winning ties.
pub fn majority_class(counts: &[u32]) -> u32 {
    let mut major = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[major] {
            major = class;
        }
    }
    major as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_slice_shape() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let view = SamplesView::from_slice(&data, 3);
        assert_eq!(view.n_samples(), 2);
        assert_eq!(view.n_attributes(), 3);
        assert_eq!(view.value(1, 2), 6.0);
    }

    #[test]
    #[should_panic]
    fn test_from_slice_ragged_panics() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let _ = SamplesView::from_slice(&data, 3);
    }

    #[test]
    fn test_from_array_rows() {
        let arr = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let view = SamplesView::from_array(arr.view());
        assert_eq!(view.n_samples(), 3);
        assert_eq!(view.row(2).to_vec(), vec![5.0, 6.0]);
    }

    #[test]
    fn test_n_classes_counts_gaps() {
        assert_eq!(n_classes(&[]), 0);
        assert_eq!(n_classes(&[0, 0, 0]), 1);
        assert_eq!(n_classes(&[0, 2]), 3);
    }

    #[test]
    fn test_class_counts() {
        let counts = class_counts([0u32, 1, 1, 2, 1], 4);
        assert_eq!(counts, vec![1, 3, 1, 0]);
    }

    #[test]
    fn test_majority_class_tie_breaks_low() {
        assert_eq!(majority_class(&[2, 3, 1]), 1);
        assert_eq!(majority_class(&[3, 3, 1]), 0);
    }
}
