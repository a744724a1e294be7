// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Value distributions and the statistical snapshots taken from them.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Number of most recent values a histogram retains by default.
pub const DEFAULT_RESERVOIR_SIZE: usize = 1028;

#[derive(Debug)]
struct HistogramState {
    count: AtomicU64,
    capacity: usize,
    window: Mutex<VecDeque<i64>>,
}

/// Records a distribution of values over a sliding window.
///
/// The count covers every value ever recorded; the statistics of a
/// [`Snapshot`] cover the most recent `capacity` values.
#[derive(Debug, Clone)]
pub struct Histogram {
    state: Arc<HistogramState>,
}

impl Histogram {
    /// Creates a histogram retaining [`DEFAULT_RESERVOIR_SIZE`] values.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RESERVOIR_SIZE)
    }

    /// Creates a histogram retaining the `capacity` most recent values.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Arc::new(HistogramState {
                count: AtomicU64::new(0),
                capacity,
                window: Mutex::new(VecDeque::with_capacity(capacity)),
            }),
        }
    }

    /// Records a value.
    pub fn update(&self, value: i64) {
        let mut window = self
            .state
            .window
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if window.len() == self.state.capacity {
            window.pop_front();
        }
        window.push_back(value);
        self.state.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of values ever recorded.
    pub fn count(&self) -> u64 {
        self.state.count.load(Ordering::Relaxed)
    }

    /// Takes a consistent snapshot of the retained values.
    pub fn snapshot(&self) -> Snapshot {
        let window = self
            .state
            .window
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Snapshot::new(window.iter().copied().collect())
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// An immutable, sorted view of a distribution at one point in time.
///
/// All statistics of one snapshot derive from the same values, so they are
/// mutually consistent (`min <= median <= max`). An empty snapshot reports
/// zero for every statistic.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    values: Vec<i64>,
}

impl Snapshot {
    /// Builds a snapshot from unsorted values.
    pub fn new(mut values: Vec<i64>) -> Self {
        values.sort_unstable();
        Self { values }
    }

    /// Returns the value at `quantile` (in `[0, 1]`), interpolating linearly.
    pub fn value(&self, quantile: f64) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let quantile = quantile.clamp(0.0, 1.0);
        let n = self.values.len();
        let pos = quantile * (n as f64 + 1.0);
        if pos < 1.0 {
            return self.values[0] as f64;
        }
        if pos >= n as f64 {
            return self.values[n - 1] as f64;
        }
        let index = pos as usize;
        let lower = self.values[index - 1] as f64;
        let upper = self.values[index] as f64;
        lower + (pos - pos.floor()) * (upper - lower)
    }

    /// Returns the number of values in the snapshot.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Returns the sorted values.
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Returns the smallest value.
    pub fn min(&self) -> i64 {
        self.values.first().copied().unwrap_or(0)
    }

    /// Returns the largest value.
    pub fn max(&self) -> i64 {
        self.values.last().copied().unwrap_or(0)
    }

    /// Returns the arithmetic mean.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.values.iter().map(|&v| v as f64).sum();
        sum / self.values.len() as f64
    }

    /// Returns the sample standard deviation.
    pub fn std_dev(&self) -> f64 {
        let n = self.values.len();
        if n <= 1 {
            return 0.0;
        }
        let mean = self.mean();
        let sum_sq: f64 = self
            .values
            .iter()
            .map(|&v| {
                let diff = v as f64 - mean;
                diff * diff
            })
            .sum();
        (sum_sq / (n - 1) as f64).sqrt()
    }

    /// Returns the median.
    pub fn median(&self) -> f64 {
        self.value(0.5)
    }

    /// Returns the 75th percentile.
    pub fn p75(&self) -> f64 {
        self.value(0.75)
    }

    /// Returns the 95th percentile.
    pub fn p95(&self) -> f64 {
        self.value(0.95)
    }

    /// Returns the 98th percentile.
    pub fn p98(&self) -> f64 {
        self.value(0.98)
    }

    /// Returns the 99th percentile.
    pub fn p99(&self) -> f64 {
        self.value(0.99)
    }

    /// Returns the 99.9th percentile.
    pub fn p999(&self) -> f64 {
        self.value(0.999)
    }
}
