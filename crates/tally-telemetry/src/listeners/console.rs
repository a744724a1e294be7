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

//! Prints every update as one JSON line on standard output.

use crate::listeners::ListenerRegistration;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use tally_core::{MetricListener, MetricValue, MetricsConfig};

/// Identifier of this listener in `metric.listeners`.
pub const CONSOLE_LISTENER: &str = "console";

#[derive(Serialize)]
struct ConsoleRecord<'a> {
    timestamp: u64,
    monitor: &'a str,
    value: &'a MetricValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_id: Option<&'a str>,
}

/// The default listener: one JSON object per update.
///
/// ```text
/// {"timestamp":1718000000,"monitor":"requests","value":5,"app_id":"billing"}
/// ```
pub struct ConsoleMetricListener {
    application_id: Option<String>,
    out: Mutex<Box<dyn Write + Send>>,
    closed: AtomicBool,
}

impl ConsoleMetricListener {
    /// Creates a listener writing to standard output.
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    /// Creates a listener writing to `out`.
    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            application_id: None,
            out: Mutex::new(out),
            closed: AtomicBool::new(false),
        }
    }

    fn write_record(&self, field: &str, value: &MetricValue) -> anyhow::Result<()> {
        let record = ConsoleRecord {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            monitor: field,
            value,
            app_id: self.application_id.as_deref(),
        };
        let line = serde_json::to_string(&record)?;
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{line}")?;
        Ok(())
    }
}

impl Default for ConsoleMetricListener {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConsoleMetricListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleMetricListener")
            .field("application_id", &self.application_id)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl MetricListener for ConsoleMetricListener {
    fn name(&self) -> &str {
        CONSOLE_LISTENER
    }

    fn init(&mut self, config: MetricsConfig) -> anyhow::Result<()> {
        self.application_id = config.application_id;
        Ok(())
    }

    fn update_metric(&self, field: &str, value: &MetricValue) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        if let Err(e) = self.write_record(field, value) {
            log::warn!("[ConsoleMetricListener] Failed to write metric {}: {}", field, e);
        }
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = out.flush() {
            log::warn!("[ConsoleMetricListener] Failed to flush output: {}", e);
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn create() -> anyhow::Result<Box<dyn MetricListener>> {
    Ok(Box::new(ConsoleMetricListener::new()))
}

inventory::submit! {
    ListenerRegistration {
        id: CONSOLE_LISTENER,
        create,
    }
}
