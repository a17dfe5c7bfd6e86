use std::fmt::Debug;

use num_traits::{Float, NumCast};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, ShaperError};
use crate::ring_buffer::RingBuffer;
use crate::summator::{NeumaierSum, Summator};

/// How an [`AverageFilter`] produces its mean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Averaging {
    /// Running sum updated on every push and pop
    #[default]
    Recursive,
    /// Buffer re-summed with a fresh summator on every read, free of drift
    Recompute,
}

/// A moving average that may be partially filled.
///
/// Unlike [`MovingMean`](crate::MovingMean) the buffer starts empty and the mean is
/// taken over however many samples are buffered.
#[derive(Debug, Clone)]
pub struct AverageFilter<F: Float + Debug, S = NeumaierSum<F>> {
    buffer: RingBuffer<F>,
    summator: S,
    averaging: Averaging,
}

impl<F: Float + Debug, S: Summator<F>> AverageFilter<F, S> {
    /// Creates an empty filter averaging up to `window` samples.
    pub fn new(window: usize) -> Result<Self> {
        Self::with_extent(window, window)
    }

    /// Creates an empty filter whose window may later be resized up to `extent`.
    pub fn with_extent(window: usize, extent: usize) -> Result<Self> {
        Self::build(window, extent, Averaging::default(), S::default())
    }

    /// Creates an empty filter from explicit parts.
    ///
    /// # Arguments
    ///
    /// * `window` - Logical size of the buffer
    /// * `extent` - Preallocated size, the upper bound for `window`
    /// * `averaging` - Running or recomputed mean
    /// * `summator` - Summation strategy, reset before use
    pub fn build(window: usize, extent: usize, averaging: Averaging, mut summator: S) -> Result<Self> {
        let mut buffer = RingBuffer::from_elem(F::zero(), extent)?;
        buffer.resize(window)?;
        summator.reset();
        Ok(Self {
            buffer,
            summator,
            averaging,
        })
    }

    /// Appends `value`, dropping the oldest sample when full.
    pub fn push(&mut self, value: F) {
        let evicted = self.buffer.push(value);
        if self.averaging == Averaging::Recursive {
            if let Some(old) = evicted {
                self.summator.sub(old);
            }
            self.summator.add(value);
        }
    }

    /// Removes and returns the oldest sample.
    pub fn pop(&mut self) -> Result<F> {
        let value = *self.buffer.pop()?;
        if self.averaging == Averaging::Recursive {
            self.summator.sub(value);
        }
        Ok(value)
    }

    /// Fills the whole window with `value`.
    pub fn fill(&mut self, value: F) {
        self.buffer.fill(value);
        let count = <F as NumCast>::from(self.buffer.len()).unwrap_or_else(F::one);
        self.summator.set(count * value);
    }

    /// Empties the buffer and clears the sum.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.summator.reset();
    }

    /// Changes the window to `window` samples and empties the filter.
    pub fn resize(&mut self, window: usize) -> Result<()> {
        self.buffer.resize(window)?;
        self.summator.reset();
        trace!(window, "resized average filter");
        Ok(())
    }

    /// Mean of the buffered samples.
    pub fn get(&self) -> Result<F> {
        let len = self.buffer.len();
        if len == 0 {
            return Err(ShaperError::Empty);
        }
        let sum = match self.averaging {
            Averaging::Recursive => self.summator.get(),
            Averaging::Recompute => {
                let mut fresh = S::default();
                for &x in &self.buffer {
                    fresh.add(x);
                }
                fresh.get()
            }
        };
        Ok(sum / <F as NumCast>::from(len).unwrap_or_else(F::one))
    }

    /// Pushes `value` and returns the new mean.
    pub fn retrieve(&mut self, value: F) -> Result<F> {
        self.push(value);
        self.get()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buffer.is_full()
    }

    /// Current window size
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn extent(&self) -> usize {
        self.buffer.extent()
    }

    pub fn averaging(&self) -> Averaging {
        self.averaging
    }

    /// Buffered samples, oldest first
    pub fn buffer(&self) -> &RingBuffer<F> {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summator::{DynSummator, KleinSum, NaiveSum, SummatorKind};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_partial_window_mean() {
        let mut filter = AverageFilter::<f64>::new(4).unwrap();
        assert_eq!(filter.get(), Err(ShaperError::Empty));
        assert_eq!(filter.retrieve(2.0).unwrap(), 2.0);
        assert_eq!(filter.retrieve(4.0).unwrap(), 3.0);
        assert!(!filter.is_full());
        filter.push(6.0);
        filter.push(8.0);
        assert!(filter.is_full());
        assert_eq!(filter.get().unwrap(), 5.0);
        // 2 is evicted
        assert_eq!(filter.retrieve(10.0).unwrap(), 7.0);
    }

    #[test]
    fn test_pop_updates_sum() {
        let mut filter = AverageFilter::<f32, NaiveSum<f32>>::new(3).unwrap();
        filter.push(1.0);
        filter.push(2.0);
        filter.push(3.0);
        assert_eq!(filter.pop().unwrap(), 1.0);
        assert_eq!(filter.get().unwrap(), 2.5);
        filter.pop().unwrap();
        filter.pop().unwrap();
        assert_eq!(filter.pop(), Err(ShaperError::Empty));
    }

    #[test]
    fn test_fill_sets_sum() {
        let mut filter = AverageFilter::<f64>::with_extent(3, 5).unwrap();
        filter.fill(1.5);
        assert!(filter.is_full());
        assert_eq!(filter.len(), 3);
        assert_eq!(filter.get().unwrap(), 1.5);
        filter.fill(1.5);
        assert_eq!(filter.get().unwrap(), 1.5);
        assert_eq!(filter.retrieve(4.5).unwrap(), 2.5);
    }

    #[test]
    fn test_reset_and_resize() {
        let mut filter = AverageFilter::<f64>::with_extent(2, 4).unwrap();
        filter.fill(3.0);
        filter.reset();
        assert!(filter.is_empty());
        assert_eq!(filter.get(), Err(ShaperError::Empty));

        filter.resize(4).unwrap();
        assert_eq!(filter.capacity(), 4);
        assert_eq!(filter.extent(), 4);
        assert_eq!(filter.retrieve(8.0).unwrap(), 8.0);
        assert_eq!(
            filter.resize(5),
            Err(ShaperError::CapacityExceeded { window: 5, extent: 4 })
        );
        assert_eq!(filter.resize(0), Err(ShaperError::InvalidWindowSize(0)));
    }

    #[test]
    fn test_recompute_matches_recursive() {
        let mut recursive = AverageFilter::<f64, KleinSum<f64>>::new(5).unwrap();
        let mut recompute =
            AverageFilter::<f64, KleinSum<f64>>::build(5, 5, Averaging::Recompute, KleinSum::default())
                .unwrap();
        assert_eq!(recompute.averaging(), Averaging::Recompute);
        for i in 0..50 {
            let x = (i as f64 * 0.37).sin() * 10.0;
            let a = recursive.retrieve(x).unwrap();
            let b = recompute.retrieve(x).unwrap();
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
        let b = recompute.pop().unwrap();
        assert_abs_diff_eq!(b, (45.0f64 * 0.37).sin() * 10.0, epsilon = 1e-12);
        assert_eq!(recompute.len(), 4);
    }

    #[test]
    fn test_dyn_summator_filter() {
        for kind in [SummatorKind::Naive, SummatorKind::Kbn, SummatorKind::Kbk] {
            let mut filter =
                AverageFilter::<f64, _>::build(2, 2, Averaging::Recursive, DynSummator::new(kind)).unwrap();
            filter.push(1.0);
            filter.push(3.0);
            assert_eq!(filter.retrieve(5.0).unwrap(), 4.0);
        }
    }

    #[test]
    fn test_compensated_sum_does_not_drift() {
        let mut filter = AverageFilter::<f64>::new(10).unwrap();
        filter.fill(0.0);
        for i in 0..100_000 {
            let x = if i % 2 == 0 { 1e8 } else { 0.1 };
            filter.push(x);
        }
        for _ in 0..10 {
            filter.push(0.1);
        }
        assert_abs_diff_eq!(filter.get().unwrap(), 0.1, epsilon = 1e-9);
    }
}
