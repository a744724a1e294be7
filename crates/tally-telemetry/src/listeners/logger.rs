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

//! Forwards every update to the `log` facade.

use crate::listeners::ListenerRegistration;
use log::Level;
use std::str::FromStr;
use tally_core::{MetricListener, MetricValue, MetricsConfig};

/// Identifier of this listener in `metric.listeners`.
pub const LOG_LISTENER: &str = "log";

/// Property selecting the level updates are logged at (default `info`).
pub const LEVEL_PROPERTY: &str = "metric.log.level";

/// Target used for every record, so hosts can route metrics separately.
pub const LOG_TARGET: &str = "tally::metrics";

/// Emits one log record per update on the [`LOG_TARGET`] target.
#[derive(Debug)]
pub struct LogMetricListener {
    level: Level,
    application_id: String,
}

impl LogMetricListener {
    /// Creates a listener logging at `info`.
    pub fn new() -> Self {
        Self {
            level: Level::Info,
            application_id: String::new(),
        }
    }

    /// Returns the level updates are logged at.
    pub fn level(&self) -> Level {
        self.level
    }
}

impl Default for LogMetricListener {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricListener for LogMetricListener {
    fn name(&self) -> &str {
        LOG_LISTENER
    }

    fn init(&mut self, config: MetricsConfig) -> anyhow::Result<()> {
        if let Some(raw) = config.property(LEVEL_PROPERTY) {
            let raw = raw
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("{LEVEL_PROPERTY} must be a string"))?;
            self.level = Level::from_str(raw)
                .map_err(|_| anyhow::anyhow!("unknown log level '{raw}'"))?;
        }
        self.application_id = config.application_id.unwrap_or_default();
        Ok(())
    }

    fn update_metric(&self, field: &str, value: &MetricValue) {
        if self.application_id.is_empty() {
            log::log!(target: LOG_TARGET, self.level, "{} = {}", field, value);
        } else {
            log::log!(
                target: LOG_TARGET,
                self.level,
                "[{}] {} = {}",
                self.application_id,
                field,
                value
            );
        }
    }

    fn close(&self) {
        log::debug!(target: LOG_TARGET, "Log metric listener closed");
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn create() -> anyhow::Result<Box<dyn MetricListener>> {
    Ok(Box::new(LogMetricListener::new()))
}

inventory::submit! {
    ListenerRegistration {
        id: LOG_LISTENER,
        create,
    }
}
