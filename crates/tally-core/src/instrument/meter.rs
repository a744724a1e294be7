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

//! Event rates: a running count plus mean and exponentially weighted rates.

use crate::instrument::clock::{Clock, SystemClock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// How often the moving averages are decayed.
const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// An exponentially weighted moving average of an event rate.
///
/// Events are accumulated with [`update`](Self::update) and folded into the
/// average once per tick. Rates are reported in events per second.
#[derive(Debug, Clone)]
pub struct Ewma {
    alpha: f64,
    interval_secs: f64,
    uncounted: u64,
    rate: f64,
    initialized: bool,
}

impl Ewma {
    /// Creates an average decaying over `minutes`, ticked every `interval`.
    pub fn new(minutes: f64, interval: Duration) -> Self {
        let interval_secs = interval.as_secs_f64();
        Self {
            alpha: 1.0 - (-interval_secs / 60.0 / minutes).exp(),
            interval_secs,
            uncounted: 0,
            rate: 0.0,
            initialized: false,
        }
    }

    /// A one-minute average ticked every five seconds.
    pub fn one_minute() -> Self {
        Self::new(1.0, TICK_INTERVAL)
    }

    /// A five-minute average ticked every five seconds.
    pub fn five_minute() -> Self {
        Self::new(5.0, TICK_INTERVAL)
    }

    /// A fifteen-minute average ticked every five seconds.
    pub fn fifteen_minute() -> Self {
        Self::new(15.0, TICK_INTERVAL)
    }

    /// Records `n` events since the last tick.
    pub fn update(&mut self, n: u64) {
        self.uncounted = self.uncounted.saturating_add(n);
    }

    /// Folds the pending events into the average.
    pub fn tick(&mut self) {
        let count = std::mem::take(&mut self.uncounted);
        let instant_rate = count as f64 / self.interval_secs;
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            self.rate = instant_rate;
            self.initialized = true;
        }
    }

    /// Returns the current rate in events per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

#[derive(Debug)]
struct MovingRates {
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
    last_tick: Instant,
}

#[derive(Debug)]
struct MeterState {
    count: AtomicU64,
    start: Instant,
    clock: Arc<dyn Clock>,
    rates: Mutex<MovingRates>,
}

/// Counts occurrences and derives mean and moving rates from them.
#[derive(Debug, Clone)]
pub struct Meter {
    state: Arc<MeterState>,
}

impl Meter {
    /// Creates a meter on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a meter reading time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let start = clock.now();
        Self {
            state: Arc::new(MeterState {
                count: AtomicU64::new(0),
                start,
                clock,
                rates: Mutex::new(MovingRates {
                    m1: Ewma::one_minute(),
                    m5: Ewma::five_minute(),
                    m15: Ewma::fifteen_minute(),
                    last_tick: start,
                }),
            }),
        }
    }

    /// Records one event.
    pub fn mark(&self) {
        self.mark_n(1);
    }

    /// Records `n` events.
    pub fn mark_n(&self, n: u64) {
        let mut rates = self.lock_rates();
        self.tick_if_necessary(&mut rates);
        self.state.count.fetch_add(n, Ordering::Relaxed);
        rates.m1.update(n);
        rates.m5.update(n);
        rates.m15.update(n);
    }

    /// Returns the number of events recorded.
    pub fn count(&self) -> u64 {
        self.state.count.load(Ordering::Relaxed)
    }

    /// Returns the mean rate since creation, in events per second.
    pub fn mean_rate(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }
        let elapsed = self
            .state
            .clock
            .now()
            .saturating_duration_since(self.state.start)
            .as_secs_f64();
        if elapsed > 0.0 {
            count as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Returns the one-minute moving rate, in events per second.
    pub fn one_minute_rate(&self) -> f64 {
        self.read_rate(|rates| rates.m1.rate())
    }

    /// Returns the five-minute moving rate, in events per second.
    pub fn five_minute_rate(&self) -> f64 {
        self.read_rate(|rates| rates.m5.rate())
    }

    /// Returns the fifteen-minute moving rate, in events per second.
    pub fn fifteen_minute_rate(&self) -> f64 {
        self.read_rate(|rates| rates.m15.rate())
    }

    fn read_rate(&self, pick: impl Fn(&MovingRates) -> f64) -> f64 {
        let mut rates = self.lock_rates();
        self.tick_if_necessary(&mut rates);
        pick(&rates)
    }

    fn lock_rates(&self) -> std::sync::MutexGuard<'_, MovingRates> {
        self.state
            .rates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Catches the moving averages up with every tick that elapsed.
    fn tick_if_necessary(&self, rates: &mut MovingRates) {
        let now = self.state.clock.now();
        let age = now.saturating_duration_since(rates.last_tick);
        if age < TICK_INTERVAL {
            return;
        }
        let ticks = (age.as_nanos() / TICK_INTERVAL.as_nanos()) as u32;
        rates.last_tick += TICK_INTERVAL * ticks;
        for _ in 0..ticks {
            rates.m1.tick();
            rates.m5.tick();
            rates.m15.tick();
        }
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::clock::ManualClock;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_ewma_first_tick_takes_instant_rate() {
        let mut ewma = Ewma::one_minute();
        ewma.update(3);
        ewma.tick();
        assert_close(ewma.rate(), 0.6);
    }

    #[test]
    fn test_ewma_decays_without_events() {
        let mut ewma = Ewma::one_minute();
        ewma.update(3);
        ewma.tick();

        // Twelve idle ticks cover one minute: the rate falls by a factor of e.
        for _ in 0..12 {
            ewma.tick();
        }
        assert_close(ewma.rate(), 0.6 * (-1.0f64).exp());
    }

    #[test]
    fn test_meter_starts_empty() {
        let meter = Meter::new();
        assert_eq!(meter.count(), 0);
        assert_eq!(meter.mean_rate(), 0.0);
        assert_eq!(meter.one_minute_rate(), 0.0);
        assert_eq!(meter.five_minute_rate(), 0.0);
        assert_eq!(meter.fifteen_minute_rate(), 0.0);
    }

    #[test]
    fn test_meter_mean_rate() {
        let clock = Arc::new(ManualClock::new());
        let meter = Meter::with_clock(clock.clone());

        meter.mark_n(10);
        clock.advance(Duration::from_secs(2));

        assert_eq!(meter.count(), 10);
        assert_close(meter.mean_rate(), 5.0);
    }

    #[test]
    fn test_meter_moving_rates_tick_lazily() {
        let clock = Arc::new(ManualClock::new());
        let meter = Meter::with_clock(clock.clone());

        meter.mark_n(3);
        assert_eq!(meter.one_minute_rate(), 0.0);

        clock.advance(Duration::from_secs(5));
        assert_close(meter.one_minute_rate(), 0.6);
        assert_close(meter.five_minute_rate(), 0.6);
        assert_close(meter.fifteen_minute_rate(), 0.6);
    }
}
