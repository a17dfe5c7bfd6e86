use num_traits::{Float, NumCast, One, Zero};

use crate::accumulator::Accumulator;
use crate::ring_buffer::RingBuffer;
use crate::sample::{wrap_pi, Sample};

use super::{Geometry, MeanKind, MeanMetrics};

#[inline]
fn window_size<T: Sample>(window: &RingBuffer<T>) -> T::Scalar {
    <T::Scalar as NumCast>::from(window.len()).unwrap_or_else(<T::Scalar as One>::one)
}

/// Recomputes the arithmetic mean over the whole window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CumulativeMean;

impl<T: Sample> MeanMetrics<T> for CumulativeMean {
    fn reset(&mut self, _mean: T) {}

    fn mean(&mut self, _mean: T, _evicted: T, pushed: T, window: &RingBuffer<T>) -> T {
        if window.len() <= 1 {
            return pushed;
        }
        let mut sum = T::splat(T::Scalar::zero());
        for &x in window {
            sum = sum.zip_with(x, |s, v| s + v);
        }
        let size = window_size(window);
        sum.map(|s| s / size)
    }
}

/// Updates the mean in O(1) with a compensated running total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecursiveMean<T: Sample> {
    accumulator: Accumulator<T>,
    // value handed out by the previous call
    last: T,
}

impl<T: Sample> Default for RecursiveMean<T> {
    fn default() -> Self {
        Self {
            accumulator: Accumulator::default(),
            last: T::splat(T::Scalar::zero()),
        }
    }
}

impl<T: Sample> MeanMetrics<T> for RecursiveMean<T> {
    fn reset(&mut self, mean: T) {
        self.accumulator.reset(mean);
        self.last = mean;
    }

    fn mean(&mut self, mean: T, evicted: T, pushed: T, window: &RingBuffer<T>) -> T {
        if window.len() <= 1 {
            self.reset(pushed);
            return pushed;
        }
        if mean != self.last {
            self.accumulator.reset(mean);
        }
        let size = window_size(window);
        let delta = pushed.zip_with(evicted, |p, e| (p - e) / size);
        self.last = self.accumulator.add(delta);
        self.last
    }
}

/// Circular mean over the whole window: `atan2(Σ sin, Σ cos)` per axis.
///
/// See <https://en.wikipedia.org/wiki/Circular_mean>.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AngleCumulativeMean;

impl<T: Sample> MeanMetrics<T> for AngleCumulativeMean {
    fn reset(&mut self, _mean: T) {}

    fn mean(&mut self, _mean: T, _evicted: T, pushed: T, window: &RingBuffer<T>) -> T {
        if window.len() <= 1 {
            return pushed;
        }
        let mut s = T::splat(T::Scalar::zero());
        let mut c = T::splat(T::Scalar::zero());
        for &x in window {
            s = s.zip_with(x, |acc, v| acc + Float::sin(v));
            c = c.zip_with(x, |acc, v| acc + Float::cos(v));
        }
        s.zip_with(c, |y, x| Float::atan2(y, x))
    }
}

/// O(1) angular mean: the change `pushed - evicted` is wrapped into `[-π, π)` before it
/// is spread over the window, so the mean follows an angle across the ±π seam without
/// jumping. The returned mean is continuous and is not wrapped back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleRecursiveMean<T: Sample> {
    accumulator: Accumulator<T>,
    // value handed out by the previous call
    last: T,
}

impl<T: Sample> Default for AngleRecursiveMean<T> {
    fn default() -> Self {
        Self {
            accumulator: Accumulator::default(),
            last: T::splat(T::Scalar::zero()),
        }
    }
}

impl<T: Sample> MeanMetrics<T> for AngleRecursiveMean<T> {
    fn reset(&mut self, mean: T) {
        self.accumulator.reset(mean);
        self.last = mean;
    }

    fn mean(&mut self, mean: T, evicted: T, pushed: T, window: &RingBuffer<T>) -> T {
        if window.len() <= 1 {
            self.reset(pushed);
            return pushed;
        }
        if mean != self.last {
            self.accumulator.reset(mean);
        }
        let size = window_size(window);
        let delta = pushed.zip_with(evicted, |p, e| wrap_pi(p - e) / size);
        self.last = self.accumulator.add(delta);
        self.last
    }
}

/// Mean policy chosen at runtime, e.g. from a configuration file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeanStrategy<T: Sample> {
    Cumulative(CumulativeMean),
    Recursive(RecursiveMean<T>),
    AngleCumulative(AngleCumulativeMean),
    AngleRecursive(AngleRecursiveMean<T>),
}

impl<T: Sample> MeanStrategy<T> {
    pub fn new(geometry: Geometry, kind: MeanKind) -> Self {
        match (geometry, kind) {
            (Geometry::Euclidean, MeanKind::Cumulative) => MeanStrategy::Cumulative(CumulativeMean),
            (Geometry::Euclidean, MeanKind::Recursive) => {
                MeanStrategy::Recursive(RecursiveMean::default())
            }
            (Geometry::Angle, MeanKind::Cumulative) => {
                MeanStrategy::AngleCumulative(AngleCumulativeMean)
            }
            (Geometry::Angle, MeanKind::Recursive) => {
                MeanStrategy::AngleRecursive(AngleRecursiveMean::default())
            }
        }
    }
}

impl<T: Sample> Default for MeanStrategy<T> {
    fn default() -> Self {
        Self::new(Geometry::default(), MeanKind::default())
    }
}

impl<T: Sample> MeanMetrics<T> for MeanStrategy<T> {
    fn reset(&mut self, mean: T) {
        match self {
            MeanStrategy::Cumulative(m) => MeanMetrics::<T>::reset(m, mean),
            MeanStrategy::Recursive(m) => m.reset(mean),
            MeanStrategy::AngleCumulative(m) => MeanMetrics::<T>::reset(m, mean),
            MeanStrategy::AngleRecursive(m) => m.reset(mean),
        }
    }

    fn mean(&mut self, mean: T, evicted: T, pushed: T, window: &RingBuffer<T>) -> T {
        match self {
            MeanStrategy::Cumulative(m) => m.mean(mean, evicted, pushed, window),
            MeanStrategy::Recursive(m) => m.mean(mean, evicted, pushed, window),
            MeanStrategy::AngleCumulative(m) => m.mean(mean, evicted, pushed, window),
            MeanStrategy::AngleRecursive(m) => m.mean(mean, evicted, pushed, window),
        }
    }
}
