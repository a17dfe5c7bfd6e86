//! Running sums used by [`AverageFilter`](crate::AverageFilter).
//!
//! Three strategies are provided, trading cost for accuracy:
//!
//! - [`NaiveSum`]: plain floating point addition
//! - [`NeumaierSum`]: Kahan–Babuška–Neumaier, one compensation term
//! - [`KleinSum`]: Kahan–Babuška–Klein, second-order compensation
//!
//! See <https://en.wikipedia.org/wiki/Kahan_summation_algorithm>.

use std::fmt::Debug;

use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::accumulator::neumaier_step;

/// A running sum that supports adding and removing values.
pub trait Summator<F: Float>: Debug + Clone + Default {
    /// Sets the sum back to zero
    fn reset(&mut self);

    fn add(&mut self, value: F);

    fn sub(&mut self, value: F) {
        self.add(-value);
    }

    /// Replaces the sum with `value`
    fn set(&mut self, value: F) {
        self.reset();
        self.add(value);
    }

    fn get(&self) -> F;
}

/// Uncompensated summation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NaiveSum<F> {
    sum: F,
}

impl<F: Float> Default for NaiveSum<F> {
    fn default() -> Self {
        Self { sum: F::zero() }
    }
}

impl<F: Float + Debug> Summator<F> for NaiveSum<F> {
    fn reset(&mut self) {
        self.sum = F::zero();
    }

    #[inline]
    fn add(&mut self, value: F) {
        self.sum = self.sum + value;
    }

    fn get(&self) -> F {
        self.sum
    }
}

/// Kahan–Babuška–Neumaier summation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeumaierSum<F> {
    sum: F,
    c: F,
}

impl<F: Float> Default for NeumaierSum<F> {
    fn default() -> Self {
        Self {
            sum: F::zero(),
            c: F::zero(),
        }
    }
}

impl<F: Float + Debug> Summator<F> for NeumaierSum<F> {
    fn reset(&mut self) {
        self.sum = F::zero();
        self.c = F::zero();
    }

    #[inline]
    fn add(&mut self, value: F) {
        self.sum = neumaier_step(self.sum, value, &mut self.c);
    }

    fn get(&self) -> F {
        self.sum + self.c
    }
}

/// Kahan–Babuška–Klein summation with a second-order correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KleinSum<F> {
    sum: F,
    cs: F,
    ccs: F,
}

impl<F: Float> Default for KleinSum<F> {
    fn default() -> Self {
        Self {
            sum: F::zero(),
            cs: F::zero(),
            ccs: F::zero(),
        }
    }
}

impl<F: Float + Debug> Summator<F> for KleinSum<F> {
    fn reset(&mut self) {
        self.sum = F::zero();
        self.cs = F::zero();
        self.ccs = F::zero();
    }

    #[inline]
    fn add(&mut self, value: F) {
        // first-order error of this addition only
        let mut c = F::zero();
        self.sum = neumaier_step(self.sum, value, &mut c);
        let mut cc = F::zero();
        self.cs = neumaier_step(self.cs, c, &mut cc);
        self.ccs = self.ccs + cc;
    }

    fn get(&self) -> F {
        self.sum + self.cs + self.ccs
    }
}

/// Summation strategy selectable at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummatorKind {
    Naive,
    #[default]
    Kbn,
    Kbk,
}

/// A summator whose strategy is chosen at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DynSummator<F> {
    Naive(NaiveSum<F>),
    Kbn(NeumaierSum<F>),
    Kbk(KleinSum<F>),
}

impl<F: Float> DynSummator<F> {
    pub fn new(kind: SummatorKind) -> Self {
        match kind {
            SummatorKind::Naive => DynSummator::Naive(NaiveSum::default()),
            SummatorKind::Kbn => DynSummator::Kbn(NeumaierSum::default()),
            SummatorKind::Kbk => DynSummator::Kbk(KleinSum::default()),
        }
    }

    pub fn kind(&self) -> SummatorKind {
        match self {
            DynSummator::Naive(_) => SummatorKind::Naive,
            DynSummator::Kbn(_) => SummatorKind::Kbn,
            DynSummator::Kbk(_) => SummatorKind::Kbk,
        }
    }
}

impl<F: Float> Default for DynSummator<F> {
    fn default() -> Self {
        Self::new(SummatorKind::default())
    }
}

impl<F: Float + Debug> Summator<F> for DynSummator<F> {
    fn reset(&mut self) {
        match self {
            DynSummator::Naive(s) => s.reset(),
            DynSummator::Kbn(s) => s.reset(),
            DynSummator::Kbk(s) => s.reset(),
        }
    }

    #[inline]
    fn add(&mut self, value: F) {
        match self {
            DynSummator::Naive(s) => s.add(value),
            DynSummator::Kbn(s) => s.add(value),
            DynSummator::Kbk(s) => s.add(value),
        }
    }

    fn get(&self) -> F {
        match self {
            DynSummator::Naive(s) => s.get(),
            DynSummator::Kbn(s) => s.get(),
            DynSummator::Kbk(s) => s.get(),
        }
    }
}
