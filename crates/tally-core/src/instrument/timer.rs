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

//! Elapsed-time distributions with an event rate, and a scope guard to feed them.

use crate::instrument::clock::{Clock, SystemClock};
use crate::instrument::histogram::{Histogram, Snapshot};
use crate::instrument::meter::Meter;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A histogram of durations (in nanoseconds) plus a meter of timed events.
#[derive(Debug, Clone)]
pub struct Timer {
    histogram: Histogram,
    meter: Meter,
    clock: Arc<dyn Clock>,
}

impl Timer {
    /// Creates a timer on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a timer reading time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            histogram: Histogram::new(),
            meter: Meter::with_clock(clock.clone()),
            clock,
        }
    }

    /// Records one timed event of length `elapsed`.
    pub fn update(&self, elapsed: Duration) {
        let nanos = i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX);
        self.histogram.update(nanos);
        self.meter.mark();
    }

    /// Runs `f` and records how long it took.
    pub fn time<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = self.clock.now();
        let result = f();
        self.update(self.clock.now().saturating_duration_since(start));
        result
    }

    /// Starts timing a scope; the duration is recorded when the returned
    /// context is stopped or dropped.
    pub fn start(&self) -> TimerContext {
        TimerContext {
            timer: self.clone(),
            started_at: self.clock.now(),
            stopped: false,
        }
    }

    /// Returns the number of timed events.
    pub fn count(&self) -> u64 {
        self.histogram.count()
    }

    /// Takes a snapshot of the recorded durations, in nanoseconds.
    pub fn snapshot(&self) -> Snapshot {
        self.histogram.snapshot()
    }

    /// Returns the mean rate of timed events, in events per second.
    pub fn mean_rate(&self) -> f64 {
        self.meter.mean_rate()
    }

    /// Returns the one-minute rate of timed events.
    pub fn one_minute_rate(&self) -> f64 {
        self.meter.one_minute_rate()
    }

    /// Returns the five-minute rate of timed events.
    pub fn five_minute_rate(&self) -> f64 {
        self.meter.five_minute_rate()
    }

    /// Returns the fifteen-minute rate of timed events.
    pub fn fifteen_minute_rate(&self) -> f64 {
        self.meter.fifteen_minute_rate()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

/// Times a scope and records the result in its [`Timer`] when dropped.
///
/// Leverages RAII so the measurement is recorded even on early return.
#[derive(Debug)]
pub struct TimerContext {
    timer: Timer,
    started_at: Instant,
    stopped: bool,
}

impl TimerContext {
    /// Records the elapsed time now and returns it.
    pub fn stop(mut self) -> Duration {
        self.record()
    }

    fn record(&mut self) -> Duration {
        let elapsed = self
            .timer
            .clock
            .now()
            .saturating_duration_since(self.started_at);
        self.stopped = true;
        self.timer.update(elapsed);
        elapsed
    }
}

impl Drop for TimerContext {
    fn drop(&mut self) {
        if !self.stopped {
            self.record();
        }
    }
}
