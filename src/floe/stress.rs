//! Bounded stress history with an O(1) running sum.

use serde::{Deserialize, Serialize};

use crate::config::StressCalculator;
use crate::utils::math::{FloeFloat, Mat2};

/// Fixed-capacity ring buffer of 2×2 stress tensors. A running sum is kept
/// alongside the buffer: `push` subtracts the evicted tensor and adds the
/// new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressHistory<F> {
    buf: Vec<Mat2<F>>,
    capacity: usize,
    head: usize,
    sum: Mat2<F>,
}

impl<F: FloeFloat> StressHistory<F> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::new(),
            capacity: capacity.max(1),
            head: 0,
            sum: Mat2::zero(),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn push(&mut self, stress: Mat2<F>) {
        if self.buf.len() < self.capacity {
            self.buf.push(stress);
        } else {
            self.sum -= self.buf[self.head];
            self.buf[self.head] = stress;
            self.head = (self.head + 1) % self.capacity;
        }
        self.sum += stress;
    }

    pub fn sum(&self) -> Mat2<F> {
        self.sum
    }

    /// Mean over the filled part of the buffer.
    pub fn mean(&self) -> Mat2<F> {
        if self.buf.is_empty() {
            return Mat2::zero();
        }
        self.sum * (F::one() / F::from_usize(self.buf.len()).unwrap_or_else(F::one))
    }

    /// Accumulated stress under the given calculator policy, given the
    /// previous accumulator value and the newest per-step tensor.
    pub fn accumulate(
        &self,
        previous: Mat2<F>,
        newest: Mat2<F>,
        calculator: StressCalculator<F>,
    ) -> Mat2<F> {
        match calculator {
            StressCalculator::RunningAverage => self.mean(),
            StressCalculator::DecayAverage { lambda } => {
                previous * (F::one() - lambda) + newest * lambda
            }
        }
    }
}
