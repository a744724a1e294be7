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

//! Live measurement sources that hosts update and the engine samples.
//!
//! Every instrument is a cheap handle over shared state: cloning one gives a
//! second handle to the same measurement, so the host keeps updating the
//! instrument it registered while the sampler reads it from the registry.

pub mod clock;
pub mod counter;
pub mod gauge;
pub mod histogram;
pub mod meter;
pub mod timer;

pub use self::clock::{Clock, ManualClock, SystemClock};
pub use self::counter::Counter;
pub use self::gauge::Gauge;
pub use self::histogram::{Histogram, Snapshot};
pub use self::meter::{Ewma, Meter};
pub use self::timer::{Timer, TimerContext};

use std::fmt::Display;

/// The fundamental kind of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    /// A signed count adjusted by the host.
    Counter,
    /// A value computed on read.
    Gauge,
    /// An event count with rate statistics.
    Meter,
    /// A distribution of recorded values.
    Histogram,
    /// A distribution of elapsed durations plus an event rate.
    Timer,
}

impl InstrumentKind {
    /// Every kind, in the order a sampling pass visits them.
    pub const ALL: [InstrumentKind; 5] = [
        InstrumentKind::Gauge,
        InstrumentKind::Meter,
        InstrumentKind::Histogram,
        InstrumentKind::Counter,
        InstrumentKind::Timer,
    ];
}

impl Display for InstrumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            InstrumentKind::Counter => "counter",
            InstrumentKind::Gauge => "gauge",
            InstrumentKind::Meter => "meter",
            InstrumentKind::Histogram => "histogram",
            InstrumentKind::Timer => "timer",
        };
        f.write_str(label)
    }
}

/// A registered instrument of any kind.
#[derive(Debug, Clone)]
pub enum Instrument {
    /// See [`Counter`].
    Counter(Counter),
    /// See [`Gauge`].
    Gauge(Gauge),
    /// See [`Meter`].
    Meter(Meter),
    /// See [`Histogram`].
    Histogram(Histogram),
    /// See [`Timer`].
    Timer(Timer),
}

impl Instrument {
    /// Returns the [`InstrumentKind`] of this instrument.
    pub fn kind(&self) -> InstrumentKind {
        match self {
            Instrument::Counter(_) => InstrumentKind::Counter,
            Instrument::Gauge(_) => InstrumentKind::Gauge,
            Instrument::Meter(_) => InstrumentKind::Meter,
            Instrument::Histogram(_) => InstrumentKind::Histogram,
            Instrument::Timer(_) => InstrumentKind::Timer,
        }
    }

    /// Returns the counter handle if this is a `Counter`.
    pub fn as_counter(&self) -> Option<&Counter> {
        match self {
            Instrument::Counter(counter) => Some(counter),
            _ => None,
        }
    }

    /// Returns the gauge handle if this is a `Gauge`.
    pub fn as_gauge(&self) -> Option<&Gauge> {
        match self {
            Instrument::Gauge(gauge) => Some(gauge),
            _ => None,
        }
    }

    /// Returns the meter handle if this is a `Meter`.
    pub fn as_meter(&self) -> Option<&Meter> {
        match self {
            Instrument::Meter(meter) => Some(meter),
            _ => None,
        }
    }

    /// Returns the histogram handle if this is a `Histogram`.
    pub fn as_histogram(&self) -> Option<&Histogram> {
        match self {
            Instrument::Histogram(histogram) => Some(histogram),
            _ => None,
        }
    }

    /// Returns the timer handle if this is a `Timer`.
    pub fn as_timer(&self) -> Option<&Timer> {
        match self {
            Instrument::Timer(timer) => Some(timer),
            _ => None,
        }
    }
}

impl From<Counter> for Instrument {
    fn from(counter: Counter) -> Self {
        Instrument::Counter(counter)
    }
}

impl From<Gauge> for Instrument {
    fn from(gauge: Gauge) -> Self {
        Instrument::Gauge(gauge)
    }
}

impl From<Meter> for Instrument {
    fn from(meter: Meter) -> Self {
        Instrument::Meter(meter)
    }
}

impl From<Histogram> for Instrument {
    fn from(histogram: Histogram) -> Self {
        Instrument::Histogram(histogram)
    }
}

impl From<Timer> for Instrument {
    fn from(timer: Timer) -> Self {
        Instrument::Timer(timer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_kinds() {
        assert_eq!(Instrument::from(Counter::new()).kind(), InstrumentKind::Counter);
        assert_eq!(
            Instrument::from(Gauge::new(|| 1i64.into())).kind(),
            InstrumentKind::Gauge
        );
        assert_eq!(Instrument::from(Meter::new()).kind(), InstrumentKind::Meter);
        assert_eq!(
            Instrument::from(Histogram::new()).kind(),
            InstrumentKind::Histogram
        );
        assert_eq!(Instrument::from(Timer::new()).kind(), InstrumentKind::Timer);
    }

    #[test]
    fn test_clone_shares_state() {
        let counter = Counter::new();
        let registered = Instrument::from(counter.clone());
        counter.inc_by(3);
        assert_eq!(registered.as_counter().map(Counter::count), Some(3));
        assert!(registered.as_meter().is_none());
    }

    #[test]
    fn test_all_kinds_listed_once() {
        let kinds: std::collections::HashSet<_> = InstrumentKind::ALL.into_iter().collect();
        assert_eq!(kinds.len(), 5);
        assert_eq!(InstrumentKind::Timer.to_string(), "timer");
    }
}
