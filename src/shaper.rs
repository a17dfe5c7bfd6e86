use tracing::debug;

use crate::error::{Result, ShaperError};
use crate::metrics::{
    AngleCumulativeMean, AngleDerivative, AngleRecursiveMean, CumulativeMean, DerivativeMetrics,
    DerivativeStrategy, EuclideanDerivative, MeanMetrics, MeanStrategy, RecursiveMean,
};
use crate::moving_mean::NestedMean;
use crate::ring_buffer::RingBuffer;
use crate::sample::Sample;

/// Streaming smoother and differentiator.
///
/// Each sample passes through a cascade of moving means, and the last `N` cascade
/// outputs are differentiated with a central finite difference stencil. The output of
/// [`convolute`](Shaper::convolute) is `[value, d/dt, d²/dt², ..]` with `N` entries
/// (per axis for array samples), evaluated at the central buffered sample.
///
/// All buffers are allocated at construction; `convolute` does not allocate.
#[derive(Debug, Clone)]
pub struct Shaper<T: Sample, const N: usize, M = RecursiveMean<T>, D = EuclideanDerivative<T, N>> {
    cascade: NestedMean<T, M>,
    window: RingBuffer<T>,
    derivative: D,
}

/// Euclidean shaper recomputing every mean from scratch
pub type EuclideanCumulativeShaper<T, const N: usize> =
    Shaper<T, N, CumulativeMean, EuclideanDerivative<T, N>>;
/// Euclidean shaper with O(1) compensated mean updates
pub type EuclideanRecursiveShaper<T, const N: usize> =
    Shaper<T, N, RecursiveMean<T>, EuclideanDerivative<T, N>>;
pub type EuclideanShaper<T, const N: usize> = EuclideanRecursiveShaper<T, N>;
/// Angle shaper using circular means
pub type AngleCumulativeShaper<T, const N: usize> =
    Shaper<T, N, AngleCumulativeMean, AngleDerivative<T, N>>;
/// Angle shaper with O(1) wrapped mean updates
pub type AngleRecursiveShaper<T, const N: usize> =
    Shaper<T, N, AngleRecursiveMean<T>, AngleDerivative<T, N>>;
pub type AngleShaper<T, const N: usize> = AngleRecursiveShaper<T, N>;
/// Shaper whose policies are picked at runtime
pub type DynShaper<T, const N: usize> = Shaper<T, N, MeanStrategy<T>, DerivativeStrategy<T, N>>;

impl<T, const N: usize, M, D> Shaper<T, N, M, D>
where
    T: Sample,
    M: MeanMetrics<T> + Default,
    D: DerivativeMetrics<T, N>,
{
    /// Creates a shaper with one cascade stage per entry of `windows`.
    ///
    /// # Arguments
    ///
    /// * `seed` - Value every buffer is filled with, as if it had always been streaming
    /// * `windows` - Moving mean window of each stage
    ///
    /// # Example
    ///
    /// ```rust
    /// use nested_shaper::EuclideanShaper;
    ///
    /// let mut shaper = EuclideanShaper::<f64, 3>::new(0.0, &[10, 5]).expect("Valid windows");
    /// let [position, velocity, acceleration] = shaper.convolute(1.0, 0.01).unwrap();
    /// assert_eq!(position, 0.0);
    /// # let _ = (velocity, acceleration);
    /// ```
    pub fn new(seed: T, windows: &[usize]) -> Result<Self> {
        Self::with_extents(seed, windows, windows)
    }

    /// Creates a shaper whose stage windows can later be resized up to `extents`.
    pub fn with_extents(seed: T, windows: &[usize], extents: &[usize]) -> Result<Self> {
        Self::with_metrics(seed, windows, extents, M::default(), D::try_default()?)
    }
}

impl<T, const N: usize, M, D> Shaper<T, N, M, D>
where
    T: Sample,
    M: MeanMetrics<T>,
    D: DerivativeMetrics<T, N>,
{
    /// Creates a shaper from explicit mean and derivative policies.
    pub fn with_metrics(
        seed: T,
        windows: &[usize],
        extents: &[usize],
        mean: M,
        derivative: D,
    ) -> Result<Self> {
        if N == 0 {
            return Err(ShaperError::InvalidDerivativeCount(N));
        }
        let cascade = NestedMean::with_metrics(seed, windows, extents, mean)?;
        let mut window = RingBuffer::from_elem(seed, N)?;
        window.fill(seed);
        debug!(stages = cascade.len(), derivatives = N, "created shaper");
        Ok(Self {
            cascade,
            window,
            derivative,
        })
    }

    /// Refills the cascade and the derivative window with `seed`.
    pub fn initialize(&mut self, seed: T) {
        self.window.fill(seed);
        self.cascade.initialize(seed);
    }

    /// Resizes every cascade stage and refills all buffers with `seed`.
    ///
    /// `windows` must hold one size per stage.
    pub fn initialize_with(&mut self, seed: T, windows: &[usize]) -> Result<()> {
        self.cascade.initialize_with(seed, windows)?;
        self.window.fill(seed);
        Ok(())
    }

    /// Pushes `input` through the cascade and differentiates the smoothed history.
    ///
    /// # Arguments
    ///
    /// * `input` - Raw sample
    /// * `dt` - Time since the previous sample
    ///
    /// # Returns
    ///
    /// The value and derivatives `1..N` at the central buffered sample, which lags the
    /// newest cascade output by `N / 2` samples
    pub fn convolute(&mut self, input: T, dt: T::Scalar) -> Result<T::Derivatives<N>> {
        let smoothed = self.cascade.convolute(input);
        self.window.push(smoothed);
        self.derivative.derivatives(&self.window, dt)
    }

    /// Total delay between input and output in samples
    pub fn latency(&self) -> f64 {
        self.cascade.latency() + (N / 2) as f64
    }

    pub fn cascade(&self) -> &NestedMean<T, M> {
        &self.cascade
    }

    /// Last `N` cascade outputs, oldest first
    pub fn window(&self) -> &RingBuffer<T> {
        &self.window
    }

    pub fn derivative_metrics(&self) -> &D {
        &self.derivative
    }
}
