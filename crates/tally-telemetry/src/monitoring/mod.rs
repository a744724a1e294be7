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

//! Built-in provider bundles backed by `sysinfo`.
//!
//! Both bundles share one [`SystemProbe`], which refreshes the underlying
//! `sysinfo::System` at most once per [`REFRESH_WINDOW`] so that the many
//! gauges read during a single pass cost one refresh.

pub mod memory;
pub mod process;

pub use memory::MemoryUsageSet;
pub use process::ProcessStatsSet;

use crate::metrics::registry::InstrumentRegistry;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Prefix of the memory bundle.
pub const MEMORY_PREFIX: &str = "memory";
/// Prefix of the process bundle.
pub const PROCESS_PREFIX: &str = "process";

/// Minimum time between two refreshes of the same `sysinfo` data.
pub const REFRESH_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug)]
struct ProbeState {
    system: System,
    memory_refreshed_at: Option<Instant>,
    process_refreshed_at: Option<Instant>,
}

/// Shared, rate-limited access to a `sysinfo::System`.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl SystemProbe {
    /// Creates a probe over an empty `System`; data is loaded on first read.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ProbeState {
                system: System::new(),
                memory_refreshed_at: None,
                process_refreshed_at: None,
            })),
        }
    }

    /// Runs `read` against freshly refreshed memory figures.
    pub fn with_memory<R>(&self, read: impl FnOnce(&System) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if is_stale(state.memory_refreshed_at) {
            state.system.refresh_memory();
            state.memory_refreshed_at = Some(Instant::now());
        }
        read(&state.system)
    }

    /// Runs `read` against freshly refreshed statistics of process `pid`.
    pub fn with_process<R>(&self, pid: Pid, read: impl FnOnce(Option<&sysinfo::Process>) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if is_stale(state.process_refreshed_at) {
            state.system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[pid]),
                true,
                ProcessRefreshKind::everything(),
            );
            state.process_refreshed_at = Some(Instant::now());
        }
        read(state.system.process(pid))
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn is_stale(refreshed_at: Option<Instant>) -> bool {
    refreshed_at.map_or(true, |at| at.elapsed() >= REFRESH_WINDOW)
}

/// Registers the built-in memory and process bundles.
///
/// Returns how many instruments were added.
pub fn register_builtin(registry: &InstrumentRegistry) -> usize {
    let probe = SystemProbe::new();
    let memory = registry.register_all(MEMORY_PREFIX, &MemoryUsageSet::new(probe.clone()));
    let process = registry.register_all(PROCESS_PREFIX, &ProcessStatsSet::new(probe));
    log::info!(
        "Registered built-in providers: {} memory, {} process instruments",
        memory,
        process
    );
    memory + process
}
