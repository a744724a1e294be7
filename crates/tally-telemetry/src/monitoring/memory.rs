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

//! Host memory figures in bytes.

use super::SystemProbe;
use tally_core::instrument::Gauge;
use tally_core::telemetry::provider::{InstrumentSet, SetEntry};
use tally_core::MetricValue;
use sysinfo::System;

/// Memory bundle: `total`, `used`, `free`, `available`, `swap.total`,
/// `swap.used` and `heap.usage` (used over total, between 0 and 1).
#[derive(Debug, Clone)]
pub struct MemoryUsageSet {
    probe: SystemProbe,
}

impl MemoryUsageSet {
    /// Creates the bundle over `probe`.
    pub fn new(probe: SystemProbe) -> Self {
        Self { probe }
    }

    fn gauge<F>(&self, read: F) -> SetEntry
    where
        F: Fn(&System) -> MetricValue + Send + Sync + 'static,
    {
        let probe = self.probe.clone();
        Gauge::new(move || probe.with_memory(&read)).into()
    }
}

struct SwapSet(MemoryUsageSet);

impl InstrumentSet for SwapSet {
    fn instruments(&self) -> Vec<(String, SetEntry)> {
        vec![
            ("total".to_string(), self.0.gauge(|s| s.total_swap().into())),
            ("used".to_string(), self.0.gauge(|s| s.used_swap().into())),
        ]
    }
}

impl InstrumentSet for MemoryUsageSet {
    fn instruments(&self) -> Vec<(String, SetEntry)> {
        vec![
            ("total".to_string(), self.gauge(|s| s.total_memory().into())),
            ("used".to_string(), self.gauge(|s| s.used_memory().into())),
            ("free".to_string(), self.gauge(|s| s.free_memory().into())),
            ("available".to_string(), self.gauge(|s| s.available_memory().into())),
            ("heap.usage".to_string(), self.gauge(|s| usage_ratio(s).into())),
            ("swap".to_string(), SetEntry::Nested(Box::new(SwapSet(self.clone())))),
        ]
    }
}

fn usage_ratio(system: &System) -> f64 {
    match system.total_memory() {
        0 => 0.0,
        total => system.used_memory() as f64 / total as f64,
    }
}
