//! Pluggable policies for the moving means and the derivative stage.
//!
//! A [`MeanMetrics`] turns the state of a moving window into its new mean each time a
//! sample is pushed. A [`DerivativeMetrics`] turns the last `N` smoothed samples into
//! the value and its first `N - 1` derivatives.

mod derivative;
mod mean;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ring_buffer::RingBuffer;
use crate::sample::Sample;

pub use derivative::{AngleDerivative, DerivativeStrategy, EuclideanDerivative};
pub use mean::{AngleCumulativeMean, AngleRecursiveMean, CumulativeMean, MeanStrategy, RecursiveMean};

/// Computes the mean of a moving window.
pub trait MeanMetrics<T: Sample>: Debug + Clone {
    /// Forgets any running state. Called whenever the window is refilled with `mean`.
    fn reset(&mut self, mean: T);

    /// Returns the new mean after `pushed` replaced `evicted`.
    ///
    /// # Arguments
    ///
    /// * `mean` - Mean before the push
    /// * `evicted` - Oldest value, just removed from the window
    /// * `pushed` - Newest value, already stored in `window`
    /// * `window` - The full window after the push; `window.iter()` walks oldest to newest
    fn mean(&mut self, mean: T, evicted: T, pushed: T, window: &RingBuffer<T>) -> T;
}

/// Estimates a value and its derivatives from the last `N` samples.
pub trait DerivativeMetrics<T: Sample, const N: usize>: Debug + Clone + Sized {
    fn try_default() -> Result<Self>;

    /// Returns `[value, d/dt, ..]` per axis.
    ///
    /// # Arguments
    ///
    /// * `window` - Exactly `N` samples, oldest first
    /// * `dt` - Sample interval
    fn derivatives(&self, window: &RingBuffer<T>, dt: T::Scalar) -> Result<T::Derivatives<N>>;
}

/// Linear or circular treatment of the signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Geometry {
    #[default]
    Euclidean,
    /// Radians, wrapped with period 2π
    Angle,
}

/// How a moving mean is updated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeanKind {
    /// O(1) compensated update from the evicted and pushed values
    #[default]
    Recursive,
    /// O(W) recomputation over the whole window
    Cumulative,
}
