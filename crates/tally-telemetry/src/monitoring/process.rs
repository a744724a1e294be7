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

//! Statistics of the current process.

use super::SystemProbe;
use std::time::Duration;
use sysinfo::{Pid, Process};
use tally_core::instrument::Gauge;
use tally_core::telemetry::provider::{InstrumentSet, SetEntry};
use tally_core::MetricValue;

/// How long a thread count stays valid; enumerating tasks is costly.
const THREAD_COUNT_TIMEOUT: Duration = Duration::from_secs(10);

/// Process bundle: `memory.resident`, `memory.virtual` (bytes), `cpu.usage`
/// (percent), `uptime` (seconds) and, where the platform reports tasks,
/// `threads.count`.
#[derive(Debug, Clone)]
pub struct ProcessStatsSet {
    probe: SystemProbe,
    pid: Option<Pid>,
}

impl ProcessStatsSet {
    /// Creates the bundle for the running process.
    pub fn new(probe: SystemProbe) -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                log::warn!("Process statistics unavailable: {}", e);
                None
            }
        };
        Self { probe, pid }
    }

    fn gauge<F>(&self, pid: Pid, read: F) -> SetEntry
    where
        F: Fn(&Process) -> MetricValue + Send + Sync + 'static,
    {
        let probe = self.probe.clone();
        Gauge::new(move || {
            probe.with_process(pid, |process| process.map(&read).unwrap_or(MetricValue::UInt(0)))
        })
        .into()
    }
}

impl InstrumentSet for ProcessStatsSet {
    fn instruments(&self) -> Vec<(String, SetEntry)> {
        let Some(pid) = self.pid else {
            return Vec::new();
        };
        let mut entries = vec![
            ("memory.resident".to_string(), self.gauge(pid, |p| p.memory().into())),
            ("memory.virtual".to_string(), self.gauge(pid, |p| p.virtual_memory().into())),
            ("cpu.usage".to_string(), self.gauge(pid, |p| p.cpu_usage().into())),
            ("uptime".to_string(), self.gauge(pid, |p| p.run_time().into())),
        ];

        let reports_tasks = self
            .probe
            .with_process(pid, |process| process.is_some_and(|p| p.tasks().is_some()));
        if reports_tasks {
            let probe = self.probe.clone();
            let threads = Gauge::cached(THREAD_COUNT_TIMEOUT, move || {
                probe.with_process(pid, |process| {
                    let count = process.and_then(|p| p.tasks()).map_or(0, |tasks| tasks.len());
                    MetricValue::from(count)
                })
            });
            entries.push(("threads.count".to_string(), threads.into()));
        }
        entries
    }
}
