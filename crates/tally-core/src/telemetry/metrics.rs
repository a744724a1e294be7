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

//! Values reported to listeners and the error type of the metrics system.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

/// A single derived reading pushed to listeners.
///
/// Serialized untagged, so a JSON sink sees a bare number, boolean or string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// A signed integer, used for counters.
    Int(i64),
    /// An unsigned integer, used for event counts.
    UInt(u64),
    /// A floating point reading (rates, statistics, ratios).
    Float(f64),
    /// A boolean reading, typically from a gauge.
    Bool(bool),
    /// A free-form textual reading, typically from a gauge.
    Text(String),
}

impl MetricValue {
    /// Returns the value as an `f64` if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Int(v) => Some(*v as f64),
            MetricValue::UInt(v) => Some(*v as f64),
            MetricValue::Float(v) => Some(*v),
            MetricValue::Bool(_) | MetricValue::Text(_) => None,
        }
    }

    /// Returns the value as an `i64` if it is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetricValue::Int(v) => Some(*v),
            MetricValue::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns `true` for the numeric variants.
    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }
}

impl Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Int(v) => write!(f, "{v}"),
            MetricValue::UInt(v) => write!(f, "{v}"),
            MetricValue::Float(v) => write!(f, "{v}"),
            MetricValue::Bool(v) => write!(f, "{v}"),
            MetricValue::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        MetricValue::Int(value)
    }
}

impl From<i32> for MetricValue {
    fn from(value: i32) -> Self {
        MetricValue::Int(i64::from(value))
    }
}

impl From<u64> for MetricValue {
    fn from(value: u64) -> Self {
        MetricValue::UInt(value)
    }
}

impl From<usize> for MetricValue {
    fn from(value: usize) -> Self {
        MetricValue::UInt(value as u64)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Float(value)
    }
}

impl From<f32> for MetricValue {
    fn from(value: f32) -> Self {
        MetricValue::Float(f64::from(value))
    }
}

impl From<bool> for MetricValue {
    fn from(value: bool) -> Self {
        MetricValue::Bool(value)
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        MetricValue::Text(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Text(value.to_string())
    }
}

/// A specialized `Result` type for metric-related operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// An error that can occur within the metrics system.
///
/// None of these are fatal to the host: the engine logs them and degrades to
/// a no-op, so callers of the engine API never see them directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    /// An instrument with this name is already registered.
    DuplicateName(String),
    /// The name was not registered through the engine's own API.
    NotRegistered(String),
    /// The engine is not running, so the operation was refused.
    Disabled,
    /// No listener factory is known under this identifier.
    UnknownListener(String),
    /// A listener could not be constructed or initialized.
    ListenerInit {
        /// The configured listener identifier.
        listener: String,
        /// Why construction or `init` failed.
        reason: String,
    },
    /// The configuration could not be parsed or holds an invalid value.
    InvalidConfig(String),
}

impl Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::DuplicateName(name) => write!(f, "Duplicate metric name: {name}"),
            MetricsError::NotRegistered(name) => write!(f, "Metric not registered: {name}"),
            MetricsError::Disabled => write!(f, "Metrics system is disabled"),
            MetricsError::UnknownListener(id) => write!(f, "Unknown metric listener: {id}"),
            MetricsError::ListenerInit { listener, reason } => {
                write!(f, "Failed to initialize metric listener {listener}: {reason}")
            }
            MetricsError::InvalidConfig(msg) => write!(f, "Invalid metrics configuration: {msg}"),
        }
    }
}

impl std::error::Error for MetricsError {}
