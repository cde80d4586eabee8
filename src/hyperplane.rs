//! Oblique split hyperplanes and the side rule.
//!
//! A hyperplane over `d` attributes is `d` weights plus a bias term. The
//! signed margin of a sample is `sum(w_i * x_i) + bias`; a negative margin
//! routes the sample left, zero or positive routes it right. Search and
//! prediction share this one rule, so ties resolve identically everywhere.

use ndarray::ArrayView1;

/// Which side of a hyperplane a sample falls on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Side for a signed margin: strictly negative goes left, ties right.
    #[inline]
    pub fn from_margin(margin: f64) -> Self {
        if margin < 0.0 {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// A splitting hyperplane: `d` attribute weights followed by a bias.
///
/// Stored as one flat coefficient vector of length `d + 1` with the bias
/// last, the layout the coefficient export uses.
#[derive(Clone, Debug, PartialEq)]
pub struct Hyperplane {
    coefficients: Vec<f64>,
}

impl Hyperplane {
    /// From a flat coefficient vector (`d` weights, then bias).
    ///
    /// # Panics
    /// Panics if fewer than two coefficients are given.
    pub fn from_coefficients(coefficients: Vec<f64>) -> Self {
        assert!(
            coefficients.len() >= 2,
            "a hyperplane needs at least one weight and a bias"
        );
        Self { coefficients }
    }

    /// Axis-parallel hyperplane testing `x[attribute] < threshold`.
    pub fn axis_parallel(n_attributes: usize, attribute: usize, threshold: f64) -> Self {
        let mut coefficients = vec![0.0; n_attributes + 1];
        coefficients[attribute] = 1.0;
        coefficients[n_attributes] = -threshold;
        Self { coefficients }
    }

    #[inline]
    pub fn n_attributes(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Attribute weights, without the bias.
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.coefficients[..self.coefficients.len() - 1]
    }

    #[inline]
    pub fn bias(&self) -> f64 {
        self.coefficients[self.coefficients.len() - 1]
    }

    /// Flat coefficient vector: weights then bias.
    #[inline]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Signed margin of one sample row.
    #[inline]
    pub fn margin(&self, row: ArrayView1<'_, f64>) -> f64 {
        debug_assert_eq!(row.len(), self.n_attributes());
        let mut value = self.bias();
        for (w, x) in self.weights().iter().zip(row.iter()) {
            value += w * x;
        }
        value
    }

    /// Which side a sample row falls on.
    #[inline]
    pub fn side(&self, row: ArrayView1<'_, f64>) -> Side {
        Side::from_margin(self.margin(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_margin_is_affine() {
        let h = Hyperplane::from_coefficients(vec![1.0, 2.0, -3.0]);
        let row = array![2.0, 0.5];
        assert_relative_eq!(h.margin(row.view()), 2.0 + 1.0 - 3.0);
    }

    #[test]
    fn test_tie_goes_right() {
        // x + y - 2 at (1, 1) sits exactly on the hyperplane.
        let h = Hyperplane::from_coefficients(vec![1.0, 1.0, -2.0]);
        assert_eq!(h.side(array![1.0, 1.0].view()), Side::Right);
        assert_eq!(h.side(array![0.9, 1.0].view()), Side::Left);
        assert_eq!(h.side(array![1.1, 1.0].view()), Side::Right);
    }

    #[test]
    fn test_axis_parallel_tests_one_attribute() {
        let h = Hyperplane::axis_parallel(3, 1, 5.0);
        assert_eq!(h.weights(), &[0.0, 1.0, 0.0]);
        assert_relative_eq!(h.bias(), -5.0);
        assert_eq!(h.side(array![9.0, 4.9, 9.0].view()), Side::Left);
        assert_eq!(h.side(array![0.0, 5.0, 0.0].view()), Side::Right);
    }

    #[test]
    fn test_coefficient_layout() {
        let h = Hyperplane::from_coefficients(vec![0.5, -0.5, 1.0]);
        assert_eq!(h.n_attributes(), 2);
        assert_eq!(h.coefficients(), &[0.5, -0.5, 1.0]);
    }
}
