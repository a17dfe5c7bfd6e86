//! TOML configuration for building pipelines at runtime.
//!
//! ```toml
//! [shaper]
//! geometry = "angle"
//! mean = "recursive"
//! windows = [20, 10, 5]
//! extents = [40, 20, 10]
//! derivatives = 5
//!
//! [nested_filter]
//! depth = 4
//! capacities = [16, 16]
//! windows = [8, 12]
//! averaging = "recompute"
//! summator = "kbk"
//! channels = 2
//! ```

use std::fmt::Debug;
use std::path::Path;
use std::str::FromStr;

use num_traits::Float;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::average_filter::Averaging;
use crate::error::ShaperError;
use crate::metrics::{DerivativeStrategy, Geometry, MeanKind, MeanStrategy};
use crate::nested_filter::{NestedFilter, NestedShaper};
use crate::sample::Sample;
use crate::shaper::DynShaper;
use crate::summator::{DynSummator, SummatorKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid pipeline: {0}")]
    Shaper(#[from] ShaperError),
    #[error("Configured {actual} derivatives, but the shaper was built for {expected}")]
    DerivativeCount { expected: usize, actual: usize },
    #[error("Missing [{0}] section")]
    MissingSection(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub shaper: Option<ShaperConfig>,
    #[serde(default)]
    pub nested_filter: Option<NestedFilterConfig>,
}

impl Config {
    /// Reads and parses a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = contents.parse::<Config>()?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn shaper(&self) -> Result<&ShaperConfig, ConfigError> {
        self.shaper.as_ref().ok_or(ConfigError::MissingSection("shaper"))
    }

    pub fn nested_filter(&self) -> Result<&NestedFilterConfig, ConfigError> {
        self.nested_filter
            .as_ref()
            .ok_or(ConfigError::MissingSection("nested_filter"))
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s).map_err(|e| {
            warn!("Failed to parse config TOML: {}", e);
            ConfigError::Toml(e)
        })
    }
}

/// Settings of a [`Shaper`](crate::Shaper) pipeline
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ShaperConfig {
    #[serde(default)]
    pub geometry: Geometry,
    #[serde(default)]
    pub mean: MeanKind,
    #[serde(default = "default_windows")]
    pub windows: Vec<usize>,
    /// Arena size of each stage, defaults to `windows`
    #[serde(default)]
    pub extents: Option<Vec<usize>>,
    #[serde(default = "default_derivatives")]
    pub derivatives: usize,
}

impl Default for ShaperConfig {
    fn default() -> Self {
        Self {
            geometry: Geometry::default(),
            mean: MeanKind::default(),
            windows: default_windows(),
            extents: None,
            derivatives: default_derivatives(),
        }
    }
}

impl ShaperConfig {
    /// Builds a shaper seeded with `seed`.
    ///
    /// `N` has to equal the configured `derivatives`.
    pub fn build<T: Sample, const N: usize>(&self, seed: T) -> Result<DynShaper<T, N>, ConfigError> {
        if self.derivatives != N {
            return Err(ConfigError::DerivativeCount {
                expected: N,
                actual: self.derivatives,
            });
        }
        let extents = self.extents.as_deref().unwrap_or(&self.windows);
        let shaper = DynShaper::with_metrics(
            seed,
            &self.windows,
            extents,
            MeanStrategy::new(self.geometry, self.mean),
            DerivativeStrategy::new(self.geometry)?,
        )?;
        debug!(geometry = ?self.geometry, mean = ?self.mean, "built shaper from configuration");
        Ok(shaper)
    }
}

/// Settings of a [`NestedFilter`] or [`NestedShaper`] pipeline
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NestedFilterConfig {
    #[serde(default = "default_depth")]
    pub depth: usize,
    #[serde(default = "default_capacities")]
    pub capacities: Vec<usize>,
    /// Initial stage windows, defaults to `capacities`
    #[serde(default)]
    pub windows: Option<Vec<usize>>,
    #[serde(default)]
    pub averaging: Averaging,
    #[serde(default)]
    pub summator: SummatorKind,
    #[serde(default = "default_channels")]
    pub channels: usize,
}

impl Default for NestedFilterConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            capacities: default_capacities(),
            windows: None,
            averaging: Averaging::default(),
            summator: SummatorKind::default(),
            channels: default_channels(),
        }
    }
}

impl NestedFilterConfig {
    fn windows(&self) -> &[usize] {
        self.windows.as_deref().unwrap_or(&self.capacities)
    }

    /// Builds a single channel filter, ignoring `channels`.
    pub fn build_filter<F: Float + Debug>(&self) -> Result<NestedFilter<F, DynSummator<F>>, ConfigError> {
        Ok(NestedFilter::build(
            self.depth,
            &self.capacities,
            self.windows(),
            self.averaging,
            DynSummator::new(self.summator),
        )?)
    }

    pub fn build_shaper<F: Float + Debug>(&self) -> Result<NestedShaper<F, DynSummator<F>>, ConfigError> {
        Ok(NestedShaper::build(
            self.channels,
            self.depth,
            &self.capacities,
            self.windows(),
            self.averaging,
            DynSummator::new(self.summator),
        )?)
    }
}

fn default_windows() -> Vec<usize> {
    vec![10, 5]
}

fn default_derivatives() -> usize {
    3
}

fn default_depth() -> usize {
    3
}

fn default_capacities() -> Vec<usize> {
    vec![10, 5]
}

fn default_channels() -> usize {
    1
}
