use num_traits::{Float, Zero};

use crate::sample::Sample;

/// One Kahan–Babuška–Neumaier step: returns `sum + value` and folds the
/// rounding error of that addition into `compensation`.
#[inline]
pub(crate) fn neumaier_step<F: Float>(sum: F, value: F, compensation: &mut F) -> F {
    let t = sum + value;
    if sum.abs() >= value.abs() {
        *compensation = *compensation + ((sum - t) + value);
    } else {
        *compensation = *compensation + ((value - t) + sum);
    }
    t
}

/// Compensated running total, one compensation term per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accumulator<T: Sample> {
    total: T,
    compensation: T,
}

impl<T: Sample> Default for Accumulator<T> {
    fn default() -> Self {
        Self::new(T::splat(T::Scalar::zero()))
    }
}

impl<T: Sample> Accumulator<T> {
    /// Starts a running total at `total` with no accumulated error.
    pub fn new(total: T) -> Self {
        Self {
            total,
            compensation: T::splat(T::Scalar::zero()),
        }
    }

    /// Adds `delta` to the caller supplied `total`.
    ///
    /// The rounding error of `total + delta` is carried into the compensation term,
    /// and the returned value is the corrected sum. The stored raw total becomes
    /// `total + delta`.
    pub fn accumulate(&mut self, total: T, delta: T) -> T {
        let mut out = total;
        for i in 0..T::AXES {
            let c = self.compensation.axis_mut(i);
            let t = neumaier_step(total.axis(i), delta.axis(i), c);
            *self.total.axis_mut(i) = t;
            *out.axis_mut(i) = t + *c;
        }
        out
    }

    /// Adds `delta` to the stored raw total and returns the corrected sum.
    pub fn add(&mut self, delta: T) -> T {
        let total = self.total;
        self.accumulate(total, delta)
    }

    /// Restarts the running total at `total`.
    pub fn reset(&mut self, total: T) {
        *self = Self::new(total);
    }

    /// Uncompensated running total
    pub fn total(&self) -> T {
        self.total
    }

    /// Accumulated rounding error
    pub fn compensation(&self) -> T {
        self.compensation
    }

    /// Compensated running total
    pub fn value(&self) -> T {
        self.total.zip_with(self.compensation, |t, c| t + c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_accumulate_small_integers() {
        let mut acc = Accumulator::<f64>::default();
        let mut sum = 0.0;
        for _ in 0..3 {
            sum = acc.accumulate(sum, 1.0);
        }
        assert_eq!(sum, 3.0);
        assert_eq!(acc.total(), 3.0);
    }

    #[test]
    fn test_compensation_recovers_lost_bits() {
        // 1.0 + 1e100 + 1.0 - 1e100 is 2.0, naive summation gives 0.0
        let mut acc = Accumulator::<f64>::default();
        let mut sum = 0.0;
        for v in [1.0, 1e100, 1.0, -1e100] {
            sum = acc.accumulate(acc.total(), v);
        }
        assert_eq!(sum, 2.0);
    }

    #[test]
    fn test_add_tracks_long_streams() {
        let mut acc = Accumulator::<f64>::new(0.0);
        let mut naive = 0.0f64;
        let mut sum = 0.0;
        for _ in 0..1_000_000 {
            sum = acc.add(0.1);
            naive += 0.1;
        }
        assert_abs_diff_eq!(sum, 100_000.0, epsilon = 1e-9);
        assert!((naive - 100_000.0).abs() > 1e-8);
    }

    #[test]
    fn test_per_axis_compensation() {
        let mut acc = Accumulator::<[f64; 2]>::default();
        let mut sum = [0.0; 2];
        for v in [[1.0, 2.0], [1e100, 1.0], [1.0, 1.0], [-1e100, 0.0]] {
            sum = acc.add(v);
        }
        assert_eq!(sum, [2.0, 4.0]);
        acc.reset([5.0, 6.0]);
        assert_eq!(acc.value(), [5.0, 6.0]);
        assert_eq!(acc.compensation(), [0.0, 0.0]);
    }
}
