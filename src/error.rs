use thiserror::Error;

/// Error types for shaper, cascade and buffer operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShaperError {
    /// Requested window is larger than the preallocated extent
    #[error("Window size {window} exceeds the buffer extent {extent}")]
    CapacityExceeded { window: usize, extent: usize },
    /// Window (or extent) must be at least 1
    #[error("Invalid window size: {0}. Window size must be at least 1")]
    InvalidWindowSize(usize),
    /// Number of window sizes does not match the number of stages
    #[error("Expected {expected} window sizes, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    /// Relative index beyond the number of buffered elements
    #[error("Index {index} out of range for buffer holding {len} elements")]
    IndexOutOfRange { index: usize, len: usize },
    /// Pop or read on an empty buffer
    #[error("Buffer is empty")]
    Empty,
    /// Derivatives requested before the depth buffer is full
    #[error("Filter is not ready: depth buffer has not been filled yet")]
    NotReady,
    /// Derivative count must be at least 1
    #[error("Invalid derivative count: {0}. At least the value itself (1) is required")]
    InvalidDerivativeCount(usize),
    /// Mathematical computation error (e.g., singular matrix)
    #[error("Computation error: {0}")]
    ComputationError(String),
    /// A cascade needs at least one stage
    #[error("Cascade must contain at least one stage")]
    EmptyCascade,
    /// Per-channel input slice has the wrong length
    #[error("Expected {expected} channels, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },
}

/// Result type for shaper operations
pub type Result<T> = std::result::Result<T, ShaperError>;
