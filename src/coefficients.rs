use nalgebra::{DMatrix, DVector};
use num_traits::{Float, NumCast};
use tracing::debug;

use crate::error::{Result, ShaperError};

/// Central finite difference coefficients, rows are derivative orders 1..N-1.
///
/// See <https://en.wikipedia.org/wiki/Finite_difference_coefficient>.
const CENTRAL_3: [[f64; 3]; 2] = [[-0.5, 0.0, 0.5], [1.0, -2.0, 1.0]];

const CENTRAL_5: [[f64; 5]; 4] = [
    [1.0 / 12.0, -2.0 / 3.0, 0.0, 2.0 / 3.0, -1.0 / 12.0],
    [-1.0 / 12.0, 4.0 / 3.0, -5.0 / 2.0, 4.0 / 3.0, -1.0 / 12.0],
    [-1.0 / 2.0, 1.0, 0.0, -1.0, 1.0 / 2.0],
    [1.0, -4.0, 6.0, -4.0, 1.0],
];

const CENTRAL_7: [[f64; 7]; 6] = [
    [-1.0 / 60.0, 3.0 / 20.0, -3.0 / 4.0, 0.0, 3.0 / 4.0, -3.0 / 20.0, 1.0 / 60.0],
    [1.0 / 90.0, -3.0 / 20.0, 3.0 / 2.0, -49.0 / 18.0, 3.0 / 2.0, -3.0 / 20.0, 1.0 / 90.0],
    [1.0 / 8.0, -1.0, 13.0 / 8.0, 0.0, -13.0 / 8.0, 1.0, -1.0 / 8.0],
    [-1.0 / 6.0, 2.0, -13.0 / 2.0, 28.0 / 3.0, -13.0 / 2.0, 2.0, -1.0 / 6.0],
    [-1.0 / 2.0, 2.0, -5.0 / 2.0, 0.0, 5.0 / 2.0, -2.0, 1.0 / 2.0],
    [1.0, -6.0, 15.0, -20.0, 15.0, -6.0, 1.0],
];

const CENTRAL_9: [[f64; 9]; 8] = [
    [
        3.0 / 840.0, -32.0 / 840.0, 168.0 / 840.0, -672.0 / 840.0, 0.0,
        672.0 / 840.0, -168.0 / 840.0, 32.0 / 840.0, -3.0 / 840.0,
    ],
    [
        -9.0 / 5040.0, 128.0 / 5040.0, -1008.0 / 5040.0, 8064.0 / 5040.0, -14350.0 / 5040.0,
        8064.0 / 5040.0, -1008.0 / 5040.0, 128.0 / 5040.0, -9.0 / 5040.0,
    ],
    [
        -7.0 / 240.0, 72.0 / 240.0, -338.0 / 240.0, 488.0 / 240.0, 0.0,
        -488.0 / 240.0, 338.0 / 240.0, -72.0 / 240.0, 7.0 / 240.0,
    ],
    [
        7.0 / 240.0, -96.0 / 240.0, 676.0 / 240.0, -1952.0 / 240.0, 2730.0 / 240.0,
        -1952.0 / 240.0, 676.0 / 240.0, -96.0 / 240.0, 7.0 / 240.0,
    ],
    [
        1.0 / 6.0, -9.0 / 6.0, 26.0 / 6.0, -29.0 / 6.0, 0.0,
        29.0 / 6.0, -26.0 / 6.0, 9.0 / 6.0, -1.0 / 6.0,
    ],
    [
        -1.0 / 4.0, 12.0 / 4.0, -52.0 / 4.0, 116.0 / 4.0, -150.0 / 4.0,
        116.0 / 4.0, -52.0 / 4.0, 12.0 / 4.0, -1.0 / 4.0,
    ],
    [
        -1.0 / 2.0, 6.0 / 2.0, -14.0 / 2.0, 14.0 / 2.0, 0.0,
        -14.0 / 2.0, 14.0 / 2.0, -6.0 / 2.0, 1.0 / 2.0,
    ],
    [1.0, -8.0, 28.0, -56.0, 70.0, -56.0, 28.0, -8.0, 1.0],
];

/// Looks up the exact central coefficients for the `derivative`-th order over `window` points.
///
/// Only odd windows of 3 to 9 points are tabulated. Returns `None` otherwise.
pub fn tabulated_coefficients(window: usize, derivative: usize) -> Option<&'static [f64]> {
    let row = derivative.checked_sub(1)?;
    match window {
        3 => CENTRAL_3.get(row).map(|r| &r[..]),
        5 => CENTRAL_5.get(row).map(|r| &r[..]),
        7 => CENTRAL_7.get(row).map(|r| &r[..]),
        9 => CENTRAL_9.get(row).map(|r| &r[..]),
        _ => None,
    }
}

/// Computes finite difference weights for sample positions `offsets` (in units of the step size).
///
/// The weights `w` satisfy `sum_i w[i] * x[i]^j = j! * [j == derivative]` for `j < offsets.len()`,
/// so applying them to samples of a polynomial of degree below `offsets.len()` yields its
/// exact `derivative`-th derivative at offset 0.
///
/// # Arguments
///
/// * `offsets` - Distinct sample positions relative to the evaluation point
/// * `derivative` - Order of derivative to estimate
///
/// # Returns
///
/// A vector of weights, one per offset
pub fn compute_coefficients_for_offsets(offsets: &[f64], derivative: usize) -> Result<Vec<f64>> {
    let n = offsets.len();
    if n == 0 {
        return Err(ShaperError::InvalidWindowSize(n));
    }
    if derivative >= n {
        // no polynomial of degree < n has a nonzero derivative of this order
        return Ok(vec![0.0; n]);
    }

    // Row j holds the j-th power of every offset
    let vandermonde = DMatrix::<f64>::from_fn(n, n, |j, i| offsets[i].powi(j as i32));

    let mut rhs = DVector::<f64>::zeros(n);
    rhs[derivative] = (1..=derivative).fold(1.0, |acc, x| acc * x as f64);

    let weights = vandermonde.lu().solve(&rhs).ok_or_else(|| {
        ShaperError::ComputationError("Failed to solve finite difference system".to_string())
    })?;

    Ok(weights.iter().copied().collect())
}

/// Computes central finite difference coefficients for a window of `window` samples.
///
/// The stencil is evaluated at sample index `window / 2`, so sample `i` sits at offset
/// `i - window / 2`. For even windows this leaves one more sample behind the center than
/// ahead of it.
///
/// # Arguments
///
/// * `window` - Number of samples in the stencil
/// * `derivative` - Order of derivative (0 for the value itself)
pub fn compute_central_coefficients(window: usize, derivative: usize) -> Result<Vec<f64>> {
    if window == 0 {
        return Err(ShaperError::InvalidWindowSize(window));
    }
    let center = (window / 2) as f64;
    let offsets: Vec<f64> = (0..window).map(|i| i as f64 - center).collect();
    compute_coefficients_for_offsets(&offsets, derivative)
}

/// Returns the tabulated coefficients when available and solves for them otherwise.
pub fn central_coefficients(window: usize, derivative: usize) -> Result<Vec<f64>> {
    match tabulated_coefficients(window, derivative) {
        Some(row) => Ok(row.to_vec()),
        None => compute_central_coefficients(window, derivative),
    }
}

/// Precomputed central stencil over `N` samples, one row per derivative order.
///
/// Row 0 selects the central sample, row `k` estimates the `k`-th derivative for unit
/// spacing and is divided by `dt^k` in [`apply`](CentralStencil::apply).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentralStencil<F, const N: usize> {
    rows: [[F; N]; N],
}

impl<F: Float, const N: usize> CentralStencil<F, N> {
    /// Builds the stencil, converting the coefficients to `F`.
    pub fn new() -> Result<Self> {
        if N == 0 {
            return Err(ShaperError::InvalidDerivativeCount(N));
        }
        let tabulated = N % 2 == 1 && N <= 9;
        if !tabulated && N > 2 {
            debug!(window = N, "solving central stencil");
        }

        let mut rows = [[F::zero(); N]; N];
        rows[0][Self::center()] = F::one();
        for (k, row) in rows.iter_mut().enumerate().skip(1) {
            let coeffs = central_coefficients(N, k)?;
            for (dst, &src) in row.iter_mut().zip(coeffs.iter()) {
                *dst = <F as NumCast>::from(src).ok_or_else(|| {
                    ShaperError::ComputationError(format!(
                        "Coefficient {} is not representable",
                        src
                    ))
                })?;
            }
        }
        Ok(Self { rows })
    }

    /// Index of the sample the stencil is evaluated at
    pub const fn center() -> usize {
        N / 2
    }

    /// Coefficients for the `derivative`-th order
    pub fn row(&self, derivative: usize) -> Option<&[F; N]> {
        self.rows.get(derivative)
    }

    /// Evaluates the value and derivatives `1..N` of `window` (oldest first) sampled every `dt`.
    ///
    /// # Returns
    ///
    /// `[value, d/dt, d²/dt², ...]` where the value is the central sample itself
    pub fn apply(&self, window: &[F; N], dt: F) -> [F; N] {
        let mut out = [F::zero(); N];
        if N == 0 {
            return out;
        }
        out[0] = window[Self::center()];

        let mut dtn = dt;
        for k in 1..N {
            let mut acc = F::zero();
            for (&c, &x) in self.rows[k].iter().zip(window.iter()) {
                acc = acc + c * x;
            }
            out[k] = acc / dtn;
            dtn = dtn * dt;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_tabulated_lookup() {
        assert_eq!(tabulated_coefficients(3, 1), Some(&[-0.5, 0.0, 0.5][..]));
        assert_eq!(tabulated_coefficients(3, 2), Some(&[1.0, -2.0, 1.0][..]));
        assert_eq!(tabulated_coefficients(3, 3), None);
        assert_eq!(tabulated_coefficients(3, 0), None);
        assert_eq!(tabulated_coefficients(4, 1), None);
        assert_eq!(tabulated_coefficients(11, 1), None);
    }

    #[test]
    fn test_solver_reproduces_tables() {
        for window in [3, 5, 7, 9] {
            for derivative in 1..window {
                let table = tabulated_coefficients(window, derivative).unwrap();
                let solved = compute_central_coefficients(window, derivative).unwrap();
                for (a, b) in table.iter().zip(solved.iter()) {
                    assert_abs_diff_eq!(a, b, epsilon = 1e-7);
                }
            }
        }
    }

    #[test]
    fn test_rows_annihilate_constants() {
        // every derivative stencil must sum to zero
        for window in 2..=10 {
            for derivative in 1..window {
                let row = central_coefficients(window, derivative).unwrap();
                let scale: f64 = row.iter().map(|c| c.abs()).sum();
                assert!(row.iter().sum::<f64>().abs() <= 1e-9 * scale);
            }
        }
    }

    #[test]
    fn test_even_window_stencil() {
        // offsets -2, -1, 0, 1
        let d1 = compute_central_coefficients(4, 1).unwrap();
        let expected = [1.0 / 6.0, -1.0, 0.5, 1.0 / 3.0];
        for (a, b) in d1.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
        let d1 = compute_central_coefficients(2, 1).unwrap();
        assert_abs_diff_eq!(d1[0], -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d1[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_forward_offsets() {
        let forward = compute_coefficients_for_offsets(&[0.0, 1.0, 2.0], 1).unwrap();
        assert_abs_diff_eq!(forward[0], -1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(forward[1], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(forward[2], -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_order_beyond_window_is_zero() {
        assert_eq!(compute_central_coefficients(3, 3).unwrap(), vec![0.0; 3]);
        assert_eq!(
            compute_central_coefficients(0, 1),
            Err(ShaperError::InvalidWindowSize(0))
        );
    }

    #[test]
    fn test_repeated_offsets_are_singular() {
        let result = compute_coefficients_for_offsets(&[0.0, 0.0, 1.0], 1);
        assert!(matches!(result, Err(ShaperError::ComputationError(_))));
    }

    #[test]
    fn test_stencil_apply_three_points() {
        let stencil = CentralStencil::<f64, 3>::new().unwrap();
        let out = stencil.apply(&[1.0, 2.0, 4.0], 0.1);
        assert_eq!(out[0], 2.0);
        assert_abs_diff_eq!(out[1], 15.0, epsilon = 1e-9);
        assert_abs_diff_eq!(out[2], 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_stencil_value_only() {
        let stencil = CentralStencil::<f32, 1>::new().unwrap();
        assert_eq!(stencil.apply(&[3.5], 0.01), [3.5]);
        assert_eq!(CentralStencil::<f32, 1>::center(), 0);
    }

    #[test]
    fn test_stencil_zero_size_rejected() {
        assert_eq!(
            CentralStencil::<f64, 0>::new(),
            Err(ShaperError::InvalidDerivativeCount(0))
        );
    }

    #[test]
    fn test_stencil_exact_on_polynomials() {
        // f(t) = t^3 - 2t, sampled around t = 0.5
        let dt = 0.05;
        let window: [f64; 5] = std::array::from_fn(|i| {
            let t = 0.5 + (i as f64 - 2.0) * dt;
            t.powi(3) - 2.0 * t
        });
        let stencil = CentralStencil::<f64, 5>::new().unwrap();
        let out = stencil.apply(&window, dt);
        assert_abs_diff_eq!(out[0], 0.125 - 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[1], 3.0 * 0.25 - 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(out[2], 6.0 * 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(out[3], 6.0, epsilon = 1e-3);
        assert_abs_diff_eq!(out[4], 0.0, epsilon = 1e-1);
    }

    #[test]
    fn test_stencil_rows() {
        let stencil = CentralStencil::<f64, 5>::new().unwrap();
        assert_eq!(stencil.row(0), Some(&[0.0, 0.0, 1.0, 0.0, 0.0]));
        assert_eq!(stencil.row(4), Some(&[1.0, -4.0, 6.0, -4.0, 1.0]));
        assert_eq!(stencil.row(5), None);
    }
}
