//! Sample types accepted by the shaper family.
//!
//! A [`Sample`] is either a scalar (`f32`, `f64`) or a fixed-size array of scalars
//! (`[F; M]`), where every axis is processed independently.

use std::fmt::Debug;

use num_traits::{Float, FloatConst};

/// Maps `value` into the half-open interval `[lo, hi)` by shifting it by whole periods of `hi - lo`.
///
/// ```rust
/// use nested_shaper::wrap;
///
/// assert_eq!(wrap(27.0, 10.0, 20.0), 17.0);
/// assert_eq!(wrap(20.0, 10.0, 20.0), 10.0);
/// ```
pub fn wrap<F: Float>(value: F, lo: F, hi: F) -> F {
    if value >= lo && value < hi {
        return value;
    }
    let period = hi - lo;
    let wrapped = value - period * ((value - lo) / period).floor();
    // floor() can land exactly on hi when value sits a rounding error below a period boundary
    if wrapped >= hi {
        wrapped - period
    } else if wrapped < lo {
        wrapped + period
    } else {
        wrapped
    }
}

/// Wraps an angle difference into `[-pi, pi)`.
pub fn wrap_pi<F: Float + FloatConst>(value: F) -> F {
    wrap(value, -F::PI(), F::PI())
}

/// A value that can be pushed through the moving means and derivative stages.
pub trait Sample: Copy + Debug + PartialEq + 'static {
    /// Underlying floating point type of each axis
    type Scalar: Float + FloatConst + Debug + 'static;

    /// Output of an `N`-point derivative stage for this sample type
    type Derivatives<const N: usize>: Copy + Debug + PartialEq;

    /// Number of independent axes
    const AXES: usize;

    /// Sample with every axis set to `value`
    fn splat(value: Self::Scalar) -> Self;

    /// Reads axis `i`
    fn axis(&self, i: usize) -> Self::Scalar;

    /// Mutable access to axis `i`
    fn axis_mut(&mut self, i: usize) -> &mut Self::Scalar;

    /// Builds the derivative output from per-axis derivative vectors.
    fn derivatives_from_fn<const N: usize, G>(per_axis: G) -> Self::Derivatives<N>
    where
        G: FnMut(usize) -> [Self::Scalar; N];

    /// Applies `f` to every axis.
    fn map<G>(self, mut f: G) -> Self
    where
        G: FnMut(Self::Scalar) -> Self::Scalar,
    {
        let mut out = self;
        for i in 0..Self::AXES {
            let v = out.axis(i);
            *out.axis_mut(i) = f(v);
        }
        out
    }

    /// Combines two samples axis by axis.
    fn zip_with<G>(self, other: Self, mut f: G) -> Self
    where
        G: FnMut(Self::Scalar, Self::Scalar) -> Self::Scalar,
    {
        let mut out = self;
        for i in 0..Self::AXES {
            *out.axis_mut(i) = f(self.axis(i), other.axis(i));
        }
        out
    }
}

macro_rules! impl_scalar_sample {
    ($($t:ty),*) => {$(
        impl Sample for $t {
            type Scalar = $t;
            type Derivatives<const N: usize> = [$t; N];
            const AXES: usize = 1;

            #[inline]
            fn splat(value: $t) -> Self {
                value
            }

            #[inline]
            fn axis(&self, _i: usize) -> $t {
                *self
            }

            #[inline]
            fn axis_mut(&mut self, _i: usize) -> &mut $t {
                self
            }

            #[inline]
            fn derivatives_from_fn<const N: usize, G>(mut per_axis: G) -> [$t; N]
            where
                G: FnMut(usize) -> [$t; N],
            {
                per_axis(0)
            }
        }
    )*};
}

impl_scalar_sample!(f32, f64);

impl<F, const M: usize> Sample for [F; M]
where
    F: Float + FloatConst + Debug + 'static,
{
    type Scalar = F;
    /// Axis-major: `derivatives[axis][order]`
    type Derivatives<const N: usize> = [[F; N]; M];
    const AXES: usize = M;

    #[inline]
    fn splat(value: F) -> Self {
        [value; M]
    }

    #[inline]
    fn axis(&self, i: usize) -> F {
        self[i]
    }

    #[inline]
    fn axis_mut(&mut self, i: usize) -> &mut F {
        &mut self[i]
    }

    #[inline]
    fn derivatives_from_fn<const N: usize, G>(per_axis: G) -> [[F; N]; M]
    where
        G: FnMut(usize) -> [F; N],
    {
        std::array::from_fn(per_axis)
    }
}
