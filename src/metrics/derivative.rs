use num_traits::{FloatConst, Zero};

use crate::coefficients::CentralStencil;
use crate::error::{Result, ShaperError};
use crate::ring_buffer::RingBuffer;
use crate::sample::{wrap, Sample};

use super::{DerivativeMetrics, Geometry};

/// Copies axis `axis` of the `N` buffered samples, oldest first.
#[inline]
fn gather_axis<T: Sample, const N: usize>(window: &RingBuffer<T>, axis: usize) -> [T::Scalar; N] {
    let mut samples = [T::Scalar::zero(); N];
    for (dst, src) in samples.iter_mut().zip(window.iter()) {
        *dst = src.axis(axis);
    }
    samples
}

#[inline]
fn check_window<T, const N: usize>(window: &RingBuffer<T>) -> Result<()> {
    if window.len() != N {
        return Err(ShaperError::IndexOutOfRange {
            index: N.saturating_sub(1),
            len: window.len(),
        });
    }
    Ok(())
}

/// Central finite differences on a linear signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EuclideanDerivative<T: Sample, const N: usize> {
    stencil: CentralStencil<T::Scalar, N>,
}

impl<T: Sample, const N: usize> EuclideanDerivative<T, N> {
    pub fn new() -> Result<Self> {
        Ok(Self {
            stencil: CentralStencil::new()?,
        })
    }
}

impl<T: Sample, const N: usize> DerivativeMetrics<T, N> for EuclideanDerivative<T, N> {
    fn try_default() -> Result<Self> {
        Self::new()
    }

    fn derivatives(&self, window: &RingBuffer<T>, dt: T::Scalar) -> Result<T::Derivatives<N>> {
        check_window::<T, N>(window)?;
        Ok(T::derivatives_from_fn::<N, _>(|axis| {
            self.stencil.apply(&gather_axis::<T, N>(window, axis), dt)
        }))
    }
}

/// Central finite differences on an angle in radians.
///
/// The window is unwrapped first, each sample is moved to within π of its unwrapped
/// predecessor, so a crossing of the ±π seam does not show up as a 2π jump.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleDerivative<T: Sample, const N: usize> {
    stencil: CentralStencil<T::Scalar, N>,
}

impl<T: Sample, const N: usize> AngleDerivative<T, N> {
    pub fn new() -> Result<Self> {
        Ok(Self {
            stencil: CentralStencil::new()?,
        })
    }

    /// Unwraps `samples` in place, keeping the first one as the reference.
    pub fn unwrap_angles(samples: &mut [T::Scalar; N]) {
        let pi = T::Scalar::PI();
        for i in 1..N {
            let previous = samples[i - 1];
            samples[i] = wrap(samples[i], previous - pi, previous + pi);
        }
    }
}

impl<T: Sample, const N: usize> DerivativeMetrics<T, N> for AngleDerivative<T, N> {
    fn try_default() -> Result<Self> {
        Self::new()
    }

    fn derivatives(&self, window: &RingBuffer<T>, dt: T::Scalar) -> Result<T::Derivatives<N>> {
        check_window::<T, N>(window)?;
        Ok(T::derivatives_from_fn::<N, _>(|axis| {
            let mut samples = gather_axis::<T, N>(window, axis);
            Self::unwrap_angles(&mut samples);
            self.stencil.apply(&samples, dt)
        }))
    }
}

/// Derivative policy chosen at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DerivativeStrategy<T: Sample, const N: usize> {
    Euclidean(EuclideanDerivative<T, N>),
    Angle(AngleDerivative<T, N>),
}

impl<T: Sample, const N: usize> DerivativeStrategy<T, N> {
    pub fn new(geometry: Geometry) -> Result<Self> {
        Ok(match geometry {
            Geometry::Euclidean => DerivativeStrategy::Euclidean(EuclideanDerivative::new()?),
            Geometry::Angle => DerivativeStrategy::Angle(AngleDerivative::new()?),
        })
    }

    pub fn geometry(&self) -> Geometry {
        match self {
            DerivativeStrategy::Euclidean(_) => Geometry::Euclidean,
            DerivativeStrategy::Angle(_) => Geometry::Angle,
        }
    }
}

impl<T: Sample, const N: usize> DerivativeMetrics<T, N> for DerivativeStrategy<T, N> {
    fn try_default() -> Result<Self> {
        Self::new(Geometry::default())
    }

    fn derivatives(&self, window: &RingBuffer<T>, dt: T::Scalar) -> Result<T::Derivatives<N>> {
        match self {
            DerivativeStrategy::Euclidean(d) => d.derivatives(window, dt),
            DerivativeStrategy::Angle(d) => d.derivatives(window, dt),
        }
    }
}
