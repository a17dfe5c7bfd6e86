use tracing::debug;

use crate::error::{Result, ShaperError};
use crate::metrics::{MeanMetrics, RecursiveMean};
use crate::ring_buffer::RingBuffer;
use crate::sample::Sample;

/// A moving mean over the last `window` samples.
///
/// The window always stays full: it is seeded with a constant on construction and
/// every [`convolute`](MovingMean::convolute) replaces the oldest sample.
#[derive(Debug, Clone)]
pub struct MovingMean<T: Sample, M = RecursiveMean<T>> {
    window: RingBuffer<T>,
    mean: T,
    metrics: M,
}

impl<T: Sample, M: MeanMetrics<T> + Default> MovingMean<T, M> {
    /// Creates a moving mean of `window` samples, all equal to `seed`.
    pub fn new(seed: T, window: usize) -> Result<Self> {
        Self::with_metrics(seed, window, window, M::default())
    }

    /// Creates a moving mean whose window can later grow up to `extent` samples.
    pub fn with_extent(seed: T, window: usize, extent: usize) -> Result<Self> {
        Self::with_metrics(seed, window, extent, M::default())
    }
}

impl<T: Sample, M: MeanMetrics<T>> MovingMean<T, M> {
    /// Creates a moving mean using the given mean policy.
    ///
    /// # Arguments
    ///
    /// * `seed` - Value the window is filled with
    /// * `window` - Number of averaged samples
    /// * `extent` - Preallocated size, the upper bound for `window`
    /// * `metrics` - Mean policy
    pub fn with_metrics(seed: T, window: usize, extent: usize, metrics: M) -> Result<Self> {
        let mut buffer = RingBuffer::from_elem(seed, extent)?;
        buffer.resize(window)?;
        let mut stage = Self {
            window: buffer,
            mean: seed,
            metrics,
        };
        stage.initialize(seed);
        Ok(stage)
    }

    /// Refills the window with `seed`.
    pub fn initialize(&mut self, seed: T) {
        self.window.fill(seed);
        self.mean = seed;
        self.metrics.reset(seed);
    }

    /// Resizes the window to `window` samples and refills it with `seed`.
    pub fn initialize_with(&mut self, seed: T, window: usize) -> Result<()> {
        self.window.resize(window)?;
        self.initialize(seed);
        Ok(())
    }

    /// Pushes `input` and returns the updated mean.
    pub fn convolute(&mut self, input: T) -> T {
        // the window is kept full, so a push always evicts
        let evicted = self.window.push(input).unwrap_or(input);
        self.mean = self.metrics.mean(self.mean, evicted, input, &self.window);
        self.mean
    }

    /// Mean after the last push
    pub fn mean(&self) -> T {
        self.mean
    }

    /// Number of averaged samples
    pub fn window_size(&self) -> usize {
        self.window.capacity()
    }

    pub fn extent(&self) -> usize {
        self.window.extent()
    }

    /// Buffered samples, oldest first
    pub fn window(&self) -> &RingBuffer<T> {
        &self.window
    }

    pub fn metrics(&self) -> &M {
        &self.metrics
    }
}

/// A cascade of moving means, each stage averaging the output of the previous one.
///
/// Every stage is updated on every call. A cascade of `k` box filters behaves like a
/// `k`-pole lowpass with a group delay of `Σ (Wᵢ - 1) / 2` samples.
#[derive(Debug, Clone)]
pub struct NestedMean<T: Sample, M = RecursiveMean<T>> {
    stages: Vec<MovingMean<T, M>>,
}

impl<T: Sample, M: MeanMetrics<T> + Default> NestedMean<T, M> {
    /// Creates one stage per entry of `windows`, all seeded with `seed`.
    pub fn new(seed: T, windows: &[usize]) -> Result<Self> {
        Self::with_metrics(seed, windows, windows, M::default())
    }

    /// Like [`new`](NestedMean::new) but with separate preallocated extents per stage.
    pub fn with_extents(seed: T, windows: &[usize], extents: &[usize]) -> Result<Self> {
        Self::with_metrics(seed, windows, extents, M::default())
    }
}

impl<T: Sample, M: MeanMetrics<T>> NestedMean<T, M> {
    /// Creates the cascade with a copy of `metrics` in every stage.
    pub fn with_metrics(seed: T, windows: &[usize], extents: &[usize], metrics: M) -> Result<Self> {
        if windows.is_empty() {
            return Err(ShaperError::EmptyCascade);
        }
        if windows.len() != extents.len() {
            return Err(ShaperError::ArityMismatch {
                expected: extents.len(),
                actual: windows.len(),
            });
        }
        let stages = windows
            .iter()
            .zip(extents)
            .map(|(&window, &extent)| {
                MovingMean::with_metrics(seed, window, extent, metrics.clone())
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(?windows, ?extents, "created nested mean cascade");
        Ok(Self { stages })
    }

    /// Refills every stage with `seed`.
    pub fn initialize(&mut self, seed: T) {
        for stage in &mut self.stages {
            stage.initialize(seed);
        }
    }

    /// Resizes every stage and refills it with `seed`.
    ///
    /// `windows` must hold exactly one size per stage. Nothing is changed when any size is invalid.
    pub fn initialize_with(&mut self, seed: T, windows: &[usize]) -> Result<()> {
        if windows.len() != self.stages.len() {
            return Err(ShaperError::ArityMismatch {
                expected: self.stages.len(),
                actual: windows.len(),
            });
        }
        for (stage, &window) in self.stages.iter().zip(windows) {
            if window == 0 {
                return Err(ShaperError::InvalidWindowSize(window));
            }
            if window > stage.extent() {
                return Err(ShaperError::CapacityExceeded {
                    window,
                    extent: stage.extent(),
                });
            }
        }
        for (stage, &window) in self.stages.iter_mut().zip(windows) {
            stage.initialize_with(seed, window)?;
        }
        debug!(?windows, "resized nested mean cascade");
        Ok(())
    }

    /// Pushes `input` through every stage and returns the last stage's mean.
    pub fn convolute(&mut self, input: T) -> T {
        self.stages
            .iter_mut()
            .fold(input, |value, stage| stage.convolute(value))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[MovingMean<T, M>] {
        &self.stages
    }

    /// Current window size of every stage
    pub fn window_sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.stages.iter().map(|stage| stage.window_size())
    }

    /// Group delay of the cascade in samples
    pub fn latency(&self) -> f64 {
        self.window_sizes().map(|w| (w - 1) as f64 / 2.0).sum()
    }
}
