//! Gated moving average cascade with forward/backward difference derivatives.
//!
//! A [`NestedFilter`] chains [`AverageFilter`]s. A stage forwards its mean to the next
//! stage only once its own window is full, and the last stage feeds a depth buffer of
//! `depth` samples. [`peek`](NestedFilter::peek) differentiates that depth buffer:
//!
//! ```text
//! p1  p2  p3  [p4]   depth buffer
//!   v1  v2  v3
//!     a1  a2
//!       j1
//! ```
//!
//! Order `d` is the difference between the newest and the oldest entry of row `d - 1`,
//! divided by the time they span.
//!
//! A [`NestedShaper`] runs one nested filter per input channel, so a caller that already
//! knows position, velocity and acceleration can feed them all and only differentiate
//! the last one.

use std::fmt::Debug;

use num_traits::{Float, NumCast};
use tracing::debug;

use crate::average_filter::{AverageFilter, Averaging};
use crate::error::{Result, ShaperError};
use crate::summator::{NeumaierSum, Summator};

/// Gated cascade of average filters feeding a depth buffer.
#[derive(Debug, Clone)]
pub struct NestedFilter<F: Float + Debug, S = NeumaierSum<F>> {
    filters: Vec<AverageFilter<F, S>>,
    depth: AverageFilter<F, S>,
    derivatives: Vec<F>,
    differences: Vec<F>,
}

impl<F: Float + Debug, S: Summator<F>> NestedFilter<F, S> {
    /// Creates a filter producing `depth` outputs, with stage windows equal to `capacities`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use nested_shaper::NestedFilter;
    ///
    /// let mut filter = NestedFilter::<f64>::new(3, &[4, 4]).unwrap();
    /// filter.fill(0.0);
    /// filter.update(1.0);
    /// let [position, velocity, acceleration] = [0, 1, 2].map(|i| filter.peek(0.01).unwrap()[i]);
    /// # let _ = (position, velocity, acceleration);
    /// ```
    pub fn new(depth: usize, capacities: &[usize]) -> Result<Self> {
        Self::build(depth, capacities, capacities, Averaging::default(), S::default())
    }

    /// Creates a filter from explicit parts.
    ///
    /// # Arguments
    ///
    /// * `depth` - Number of outputs, the value plus `depth - 1` derivatives
    /// * `capacities` - Preallocated size of each stage
    /// * `windows` - Initial window of each stage, at most its capacity
    /// * `averaging` - Mean update mode shared by every stage
    /// * `summator` - Summation strategy cloned into every stage
    pub fn build(
        depth: usize,
        capacities: &[usize],
        windows: &[usize],
        averaging: Averaging,
        summator: S,
    ) -> Result<Self> {
        if depth == 0 {
            return Err(ShaperError::InvalidDerivativeCount(depth));
        }
        if capacities.is_empty() {
            return Err(ShaperError::EmptyCascade);
        }
        if windows.len() != capacities.len() {
            return Err(ShaperError::ArityMismatch {
                expected: capacities.len(),
                actual: windows.len(),
            });
        }
        let filters = windows
            .iter()
            .zip(capacities)
            .map(|(&window, &extent)| {
                AverageFilter::build(window, extent, averaging, summator.clone())
            })
            .collect::<Result<Vec<_>>>()?;
        let depth_filter = AverageFilter::build(depth, depth, averaging, summator)?;
        debug!(depth, ?capacities, ?windows, ?averaging, "created nested filter");
        Ok(Self {
            filters,
            depth: depth_filter,
            derivatives: vec![F::zero(); depth],
            differences: vec![F::zero(); depth],
        })
    }

    /// Resizes every stage and empties it. The depth buffer keeps its samples.
    ///
    /// Nothing is changed when any size is invalid.
    pub fn resize(&mut self, windows: &[usize]) -> Result<()> {
        if windows.len() != self.filters.len() {
            return Err(ShaperError::ArityMismatch {
                expected: self.filters.len(),
                actual: windows.len(),
            });
        }
        for (filter, &window) in self.filters.iter().zip(windows) {
            if window == 0 {
                return Err(ShaperError::InvalidWindowSize(window));
            }
            if window > filter.extent() {
                return Err(ShaperError::CapacityExceeded {
                    window,
                    extent: filter.extent(),
                });
            }
        }
        for (filter, &window) in self.filters.iter_mut().zip(windows) {
            filter.resize(window)?;
        }
        debug!(?windows, "resized nested filter");
        Ok(())
    }

    /// Empties every stage and the depth buffer.
    pub fn reset(&mut self) {
        self.depth.reset();
        for filter in &mut self.filters {
            filter.reset();
        }
        debug!("reset nested filter");
    }

    /// Fills every stage and the depth buffer with `value`.
    pub fn fill(&mut self, value: F) {
        self.depth.fill(value);
        for filter in &mut self.filters {
            filter.fill(value);
        }
    }

    /// True once the depth buffer is full
    pub fn is_ready(&self) -> bool {
        self.depth.is_full()
    }

    /// Pushes `input` into the first stage and propagates through every full stage.
    ///
    /// # Returns
    ///
    /// Whether the filter is ready after the update
    pub fn update(&mut self, input: F) -> bool {
        let mut value = input;
        for filter in &mut self.filters {
            filter.push(value);
            match filter.get() {
                Ok(mean) if filter.is_full() => value = mean,
                _ => return self.depth.is_full(),
            }
        }
        self.depth.push(value);
        self.depth.is_full()
    }

    /// Mean of the depth buffer
    pub fn get(&self) -> Result<F> {
        self.depth.get()
    }

    /// Computes the value and `depth - 1` derivatives.
    ///
    /// # Arguments
    ///
    /// * `dt` - Sample interval
    ///
    /// # Returns
    ///
    /// `[mean, d/dt, d²/dt², ..]`, or [`ShaperError::NotReady`] before the depth buffer fills
    pub fn peek(&mut self, dt: F) -> Result<&[F]> {
        if !self.depth.is_full() {
            return Err(ShaperError::NotReady);
        }
        let depth = self.derivatives.len();
        self.derivatives[0] = self.depth.get()?;
        for (dst, &src) in self.differences.iter_mut().zip(self.depth.buffer()) {
            *dst = src;
        }

        for order in 1..depth {
            // row `order - 1` holds depth - order + 1 entries
            let len = depth - order + 1;
            let span = <F as NumCast>::from(depth - order).unwrap_or_else(F::one) * dt;
            self.derivatives[order] = (self.differences[len - 1] - self.differences[0]) / span;
            for i in 0..len - 1 {
                self.differences[i] = (self.differences[i + 1] - self.differences[i]) / dt;
            }
        }
        Ok(self.derivatives.as_slice())
    }

    /// Number of outputs produced by [`peek`](NestedFilter::peek)
    pub fn depth(&self) -> usize {
        self.derivatives.len()
    }

    pub fn filters(&self) -> &[AverageFilter<F, S>] {
        &self.filters
    }

    /// The buffer that [`peek`](NestedFilter::peek) differentiates
    pub fn depth_filter(&self) -> &AverageFilter<F, S> {
        &self.depth
    }

    /// Current window of every stage
    pub fn window_sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.filters.iter().map(|filter| filter.capacity())
    }
}

/// One nested filter per input channel.
///
/// [`peek`](NestedShaper::peek) returns the mean of every channel followed by the
/// derivatives of the last channel, `channels + depth - 1` values in total.
#[derive(Debug, Clone)]
pub struct NestedShaper<F: Float + Debug, S = NeumaierSum<F>> {
    channels: Vec<NestedFilter<F, S>>,
    output: Vec<F>,
}

impl<F: Float + Debug, S: Summator<F>> NestedShaper<F, S> {
    pub fn new(channels: usize, depth: usize, capacities: &[usize]) -> Result<Self> {
        Self::build(
            channels,
            depth,
            capacities,
            capacities,
            Averaging::default(),
            S::default(),
        )
    }

    /// Creates `channels` identical nested filters, see [`NestedFilter::build`].
    pub fn build(
        channels: usize,
        depth: usize,
        capacities: &[usize],
        windows: &[usize],
        averaging: Averaging,
        summator: S,
    ) -> Result<Self> {
        if channels == 0 {
            return Err(ShaperError::ChannelMismatch {
                expected: 1,
                actual: 0,
            });
        }
        let filter = NestedFilter::build(depth, capacities, windows, averaging, summator)?;
        debug!(channels, "created nested shaper");
        Ok(Self {
            channels: vec![filter; channels],
            output: vec![F::zero(); channels + depth - 1],
        })
    }

    fn check_channels(&self, len: usize) -> Result<()> {
        if len != self.channels.len() {
            return Err(ShaperError::ChannelMismatch {
                expected: self.channels.len(),
                actual: len,
            });
        }
        Ok(())
    }

    /// Resizes the stages of every channel.
    pub fn resize(&mut self, windows: &[usize]) -> Result<()> {
        // validate once so that no channel is left resized on error
        let mut probe = self.channels[0].clone();
        probe.resize(windows)?;
        for channel in &mut self.channels {
            channel.resize(windows)?;
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
    }

    /// Fills channel `i` with `values[i]`.
    pub fn fill(&mut self, values: &[F]) -> Result<()> {
        self.check_channels(values.len())?;
        for (channel, &value) in self.channels.iter_mut().zip(values) {
            channel.fill(value);
        }
        Ok(())
    }

    /// True once every channel is ready
    pub fn is_ready(&self) -> bool {
        self.channels.iter().all(NestedFilter::is_ready)
    }

    /// Updates channel `i` with `inputs[i]` and reports readiness.
    pub fn update(&mut self, inputs: &[F]) -> Result<bool> {
        self.check_channels(inputs.len())?;
        for (channel, &input) in self.channels.iter_mut().zip(inputs) {
            channel.update(input);
        }
        Ok(self.is_ready())
    }

    /// Channel means followed by the derivatives `1..depth` of the last channel.
    pub fn peek(&mut self, dt: F) -> Result<&[F]> {
        let count = self.channels.len();
        for (dst, channel) in self.output.iter_mut().zip(&self.channels) {
            if !channel.is_ready() {
                return Err(ShaperError::NotReady);
            }
            *dst = channel.get()?;
        }
        let last = &mut self.channels[count - 1];
        let derivatives = last.peek(dt)?;
        for (dst, &src) in self.output[count..].iter_mut().zip(&derivatives[1..]) {
            *dst = src;
        }
        Ok(self.output.as_slice())
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn depth(&self) -> usize {
        self.channels[0].depth()
    }

    pub fn channels(&self) -> &[NestedFilter<F, S>] {
        &self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summator::{KleinSum, NaiveSum};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn worked_example<S: Summator<f64>>(averaging: Averaging) -> NestedFilter<f64, S> {
        let mut filter = NestedFilter::build(4, &[3, 5], &[2, 4], averaging, S::default()).unwrap();
        filter.fill(1.0);
        for x in [1.0, 2.0, 2.0, 4.0] {
            assert!(filter.update(x));
        }
        filter
    }

    #[test]
    fn test_worked_example() {
        let mut filter = worked_example::<NeumaierSum<f64>>(Averaging::Recursive);
        let depth: Vec<f64> = filter.depth_filter().buffer().iter().copied().collect();
        assert_eq!(depth, vec![1.0, 1.125, 1.375, 1.875]);

        let result = filter.peek(0.1).unwrap();
        assert_relative_eq!(result[0], 1.34375, max_relative = 1e-12);
        assert_relative_eq!(result[1], 35.0 / 12.0, max_relative = 1e-9);
        assert_relative_eq!(result[2], 18.75, max_relative = 1e-9);
        assert_relative_eq!(result[3], 125.0, max_relative = 1e-9);
    }

    #[test]
    fn test_worked_example_f32() {
        let mut filter = NestedFilter::<f32>::build(
            4,
            &[3, 5],
            &[2, 4],
            Averaging::Recursive,
            NeumaierSum::default(),
        )
        .unwrap();
        filter.fill(1.0);
        for x in [1.0, 2.0, 2.0, 4.0] {
            assert!(filter.update(x));
        }
        let depth: Vec<f32> = filter.depth_filter().buffer().iter().copied().collect();
        assert_eq!(depth, vec![1.0, 1.125, 1.375, 1.875]);

        let result = filter.peek(0.1).unwrap();
        assert_relative_eq!(result[0], 1.34375, max_relative = 1e-6);
        assert_relative_eq!(result[1], 35.0 / 12.0, max_relative = 1e-4);
        assert_relative_eq!(result[2], 18.75, max_relative = 1e-4);
        assert_relative_eq!(result[3], 125.0, max_relative = 1e-4);
    }

    #[test]
    fn test_worked_example_other_summators() {
        let mut naive = worked_example::<NaiveSum<f64>>(Averaging::Recursive);
        let mut klein = worked_example::<KleinSum<f64>>(Averaging::Recompute);
        let a = naive.peek(0.1).unwrap().to_vec();
        let b = klein.peek(0.1).unwrap();
        for (x, y) in a.iter().zip(b) {
            assert_relative_eq!(*x, *y, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_gating() {
        let mut filter = NestedFilter::<f64>::new(2, &[2, 3]).unwrap();
        assert!(!filter.is_ready());
        assert_eq!(filter.peek(0.1), Err(ShaperError::NotReady));

        // stage 0 fills on the second sample, stage 1 on the fourth
        assert!(!filter.update(1.0));
        assert!(filter.filters()[1].is_empty());
        assert!(!filter.update(3.0));
        assert_eq!(filter.filters()[1].get().unwrap(), 2.0);
        assert!(!filter.update(5.0));
        assert_eq!(filter.filters()[1].get().unwrap(), 3.0);
        assert!(filter.depth_filter().is_empty());
        assert!(!filter.update(7.0));
        // stage 1 just became full and forwarded (2 + 4 + 6) / 3
        assert_eq!(filter.depth_filter().len(), 1);
        assert_eq!(filter.depth_filter().get().unwrap(), 4.0);
        assert!(filter.update(9.0));
        assert_eq!(filter.peek(1.0).unwrap(), &[5.0, 2.0]);
    }

    #[test]
    fn test_depth_one_is_mean_only() {
        let mut filter = NestedFilter::<f32>::new(1, &[2]).unwrap();
        filter.fill(2.0);
        filter.update(4.0);
        assert_eq!(filter.peek(0.1).unwrap(), &[3.0]);
    }

    #[test]
    fn test_reset_and_resize() {
        let mut filter = NestedFilter::<f64>::build(
            3,
            &[4, 4],
            &[2, 2],
            Averaging::Recursive,
            NeumaierSum::default(),
        )
        .unwrap();
        filter.fill(1.0);
        assert!(filter.is_ready());
        filter.reset();
        assert!(!filter.is_ready());
        assert_eq!(filter.get(), Err(ShaperError::Empty));

        assert_eq!(
            filter.resize(&[4]),
            Err(ShaperError::ArityMismatch { expected: 2, actual: 1 })
        );
        assert_eq!(
            filter.resize(&[3, 5]),
            Err(ShaperError::CapacityExceeded { window: 5, extent: 4 })
        );
        assert_eq!(filter.window_sizes().collect::<Vec<_>>(), vec![2, 2]);
        filter.resize(&[3, 4]).unwrap();
        assert_eq!(filter.window_sizes().collect::<Vec<_>>(), vec![3, 4]);
    }

    #[test]
    fn test_invalid_construction() {
        assert_eq!(
            NestedFilter::<f64>::new(0, &[2]).unwrap_err(),
            ShaperError::InvalidDerivativeCount(0)
        );
        assert_eq!(NestedFilter::<f64>::new(2, &[]).unwrap_err(), ShaperError::EmptyCascade);
        assert_eq!(
            NestedFilter::<f64>::build(2, &[2, 2], &[2], Averaging::Recursive, NeumaierSum::default())
                .unwrap_err(),
            ShaperError::ArityMismatch { expected: 2, actual: 1 }
        );
    }

    #[test]
    fn test_linear_ramp_derivative() {
        let mut filter = NestedFilter::<f64>::new(3, &[3, 3]).unwrap();
        filter.fill(0.0);
        let dt = 0.01;
        for i in 1..=50 {
            filter.update(2.0 * i as f64 * dt);
        }
        let result = filter.peek(dt).unwrap();
        assert_abs_diff_eq!(result[1], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result[2], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_shaper_concatenates_channels() {
        let mut shaper = NestedShaper::<f64>::new(2, 4, &[2, 4]).unwrap();
        assert_eq!(shaper.channel_count(), 2);
        assert_eq!(shaper.depth(), 4);
        shaper.fill(&[5.0, 1.0]).unwrap();
        assert!(shaper.is_ready());
        for x in [1.0, 2.0, 2.0, 4.0] {
            assert!(shaper.update(&[5.0, x]).unwrap());
        }
        let mut single = worked_example::<NeumaierSum<f64>>(Averaging::Recursive);
        let expected = single.peek(0.1).unwrap().to_vec();

        let out = shaper.peek(0.1).unwrap();
        assert_eq!(out.len(), 2 + 4 - 1);
        assert_eq!(out[0], 5.0);
        assert_relative_eq!(out[1], expected[0], max_relative = 1e-12);
        for k in 1..4 {
            assert_relative_eq!(out[1 + k], expected[k], max_relative = 1e-9);
        }
    }

    #[test]
    fn test_shaper_channel_checks() {
        let mut shaper = NestedShaper::<f64>::new(3, 2, &[2]).unwrap();
        assert_eq!(
            shaper.fill(&[1.0, 2.0]),
            Err(ShaperError::ChannelMismatch { expected: 3, actual: 2 })
        );
        assert_eq!(
            shaper.update(&[1.0; 4]),
            Err(ShaperError::ChannelMismatch { expected: 3, actual: 4 })
        );
        assert_eq!(shaper.peek(0.1), Err(ShaperError::NotReady));
        assert!(NestedShaper::<f64>::new(0, 2, &[2]).is_err());

        shaper.fill(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(shaper.resize(&[3]), Err(ShaperError::CapacityExceeded { window: 3, extent: 2 }));
        assert!(shaper.is_ready());
        shaper.reset();
        assert!(!shaper.is_ready());
    }
}
