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

//! Turns registered instruments into derived fields and fans them out.

use crate::metrics::registry::InstrumentRegistry;
use std::sync::Arc;
use tally_core::instrument::{Instrument, InstrumentKind, Snapshot};
use tally_core::{MetricListener, MetricValue};

/// Derives the fields one instrument emits in a sampling pass.
///
/// Gauges and counters emit their bare name. Meters always emit
/// `<name>-mean-rate`; histograms and timers always emit `<name>-count`.
/// Verbose mode adds the moving rates and count of a meter, and the
/// statistics of a histogram or timer, all taken from a single snapshot.
pub fn fields_for(name: &str, instrument: &Instrument, verbose: bool) -> Vec<(String, MetricValue)> {
    match instrument {
        Instrument::Gauge(gauge) => vec![(name.to_string(), gauge.value())],
        Instrument::Counter(counter) => vec![(name.to_string(), MetricValue::Int(counter.count()))],
        Instrument::Meter(meter) => {
            let mut fields = vec![(
                format!("{name}-mean-rate"),
                MetricValue::Float(meter.mean_rate()),
            )];
            if verbose {
                fields.push((format!("{name}-count"), MetricValue::UInt(meter.count())));
                fields.push((
                    format!("{name}-1-minute-rate"),
                    MetricValue::Float(meter.one_minute_rate()),
                ));
                fields.push((
                    format!("{name}-5-minute-rate"),
                    MetricValue::Float(meter.five_minute_rate()),
                ));
                fields.push((
                    format!("{name}-15-minute-rate"),
                    MetricValue::Float(meter.fifteen_minute_rate()),
                ));
            }
            fields
        }
        Instrument::Histogram(histogram) => {
            distribution_fields(name, histogram.count(), verbose, || histogram.snapshot())
        }
        Instrument::Timer(timer) => {
            distribution_fields(name, timer.count(), verbose, || timer.snapshot())
        }
    }
}

fn distribution_fields(
    name: &str,
    count: u64,
    verbose: bool,
    take_snapshot: impl FnOnce() -> Snapshot,
) -> Vec<(String, MetricValue)> {
    let mut fields = vec![(format!("{name}-count"), MetricValue::UInt(count))];
    if verbose {
        let snapshot = take_snapshot();
        fields.push((format!("{name}-max-value"), MetricValue::Int(snapshot.max())));
        fields.push((format!("{name}-min-value"), MetricValue::Int(snapshot.min())));
        fields.push((
            format!("{name}-mean-value"),
            MetricValue::Float(snapshot.mean()),
        ));
        fields.push((
            format!("{name}-median-value"),
            MetricValue::Float(snapshot.median()),
        ));
        fields.push((
            format!("{name}-standard-deviation-value"),
            MetricValue::Float(snapshot.std_dev()),
        ));
    }
    fields
}

/// Runs sampling passes over a registry for a fixed set of listeners.
pub struct Dispatcher<'a> {
    registry: &'a InstrumentRegistry,
    listeners: &'a [Arc<dyn MetricListener>],
    verbose: bool,
}

impl<'a> Dispatcher<'a> {
    /// Creates a dispatcher over `registry` pushing to `listeners`.
    pub fn new(
        registry: &'a InstrumentRegistry,
        listeners: &'a [Arc<dyn MetricListener>],
        verbose: bool,
    ) -> Self {
        Self {
            registry,
            listeners,
            verbose,
        }
    }

    /// Samples every instrument once and pushes each derived field to every
    /// listener, in listener order. Returns the number of fields emitted.
    pub fn dispatch_pass(&self) -> usize {
        InstrumentKind::ALL
            .into_iter()
            .map(|kind| self.dispatch_kind(kind, self.registry.names(kind)))
            .sum()
    }

    /// Dispatches the instruments of `kind` listed in `names`.
    ///
    /// Names are looked up one by one after enumeration; an instrument removed
    /// (or replaced by another kind) in between is a missed sample and is
    /// skipped for this pass.
    fn dispatch_kind(&self, kind: InstrumentKind, names: Vec<String>) -> usize {
        let mut emitted = 0;
        for name in names {
            let Some(instrument) = self.registry.get_kind(&name, kind) else {
                continue;
            };
            for (field, value) in fields_for(&name, &instrument, self.verbose) {
                for listener in self.listeners {
                    listener.update_metric(&field, &value);
                }
                emitted += 1;
            }
        }
        emitted
    }
}
