//! # Nested Shaper
//!
//! Streaming smoothing and differentiation of sampled signals for control loops.
//!
//! Each sample is passed through a cascade of moving averages. The cascade output is
//! differentiated with central finite differences, so a noisy or stepped position
//! stream yields a smooth position together with its velocity, acceleration, jerk and
//! higher derivatives.
//!
//! ## Features
//!
//! - Linear signals and angles (circular means, unwrapped derivatives)
//! - Scalar `f32`/`f64` samples and fixed-size arrays of them
//! - O(1) compensated mean updates or exact recomputation
//! - Buffers allocated once at construction, resizable within their extent
//! - A gated cascade with multi-channel input ([`NestedFilter`], [`NestedShaper`])
//! - TOML configuration and CSV helpers
//!
//! ## Example
//!
//! ```rust
//! use nested_shaper::EuclideanShaper;
//!
//! // two stages of 8 and 4 samples, value plus two derivatives
//! let mut shaper = EuclideanShaper::<f64, 3>::new(0.0, &[8, 4]).expect("Valid windows");
//! for i in 0..100 {
//!     let [position, velocity, acceleration] = shaper.convolute(i as f64 * 0.01, 0.01).unwrap();
//!     # let _ = (position, velocity, acceleration);
//! }
//! ```

mod accumulator;
mod average_filter;
mod coefficients;
pub mod config;
pub mod csv_utils;
mod error;
pub mod metrics;
mod moving_mean;
mod nested_filter;
mod ring_buffer;
mod sample;
mod shaper;
pub mod summator;

pub use accumulator::Accumulator;
pub use average_filter::{AverageFilter, Averaging};
pub use coefficients::{central_coefficients, compute_coefficients_for_offsets, CentralStencil};
pub use error::{Result, ShaperError};
pub use metrics::{DerivativeMetrics, Geometry, MeanKind, MeanMetrics};
pub use moving_mean::{MovingMean, NestedMean};
pub use nested_filter::{NestedFilter, NestedShaper};
pub use ring_buffer::{Iter, RingBuffer};
pub use sample::{wrap, wrap_pi, Sample};
pub use shaper::{
    AngleCumulativeShaper, AngleRecursiveShaper, AngleShaper, DynShaper, EuclideanCumulativeShaper,
    EuclideanRecursiveShaper, EuclideanShaper, Shaper,
};

/// Smooths and differentiates a recorded signal in one pass.
///
/// This is a convenience function that streams `data` through a Euclidean shaper seeded
/// with the first sample.
///
/// # Arguments
///
/// * `data` - The input signal
/// * `windows` - Moving average window of each cascade stage
/// * `dt` - Sample interval
///
/// # Returns
///
/// `[value, velocity, acceleration]` for every input sample, delayed by
/// [`Shaper::latency`] samples
///
/// # Example
///
/// ```rust
/// use nested_shaper::shape;
///
/// let data: Vec<f64> = (0..50).map(|i| i as f64).collect();
/// let shaped = shape(&data, &[5, 3], 1.0).unwrap();
/// assert_eq!(shaped.len(), data.len());
/// assert!((shaped[49][1] - 1.0).abs() < 1e-9);
/// ```
pub fn shape(data: &[f64], windows: &[usize], dt: f64) -> Result<Vec<[f64; 3]>> {
    let Some(&seed) = data.first() else {
        return Ok(Vec::new());
    };
    let mut shaper = EuclideanShaper::<f64, 3>::new(seed, windows)?;
    data.iter().map(|&x| shaper.convolute(x, dt)).collect()
}
