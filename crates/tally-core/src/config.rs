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

//! The immutable configuration snapshot the engine is built from.
//!
//! Keys follow the dotted property names hosts already use in their
//! configuration files (`metric.enable`, `metric.interval`, ...). Any key the
//! engine does not recognize is kept in [`MetricsConfig::properties`] and
//! handed to listeners untouched, so a sink can carry its own options.

use crate::telemetry::metrics::{MetricsError, MetricsResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Sampling interval used when none is configured.
pub const DEFAULT_INTERVAL_MS: u64 = 60_000;

/// Listener identifier used when none is configured.
pub const DEFAULT_LISTENER: &str = "console";

/// Configuration of the metrics engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// When `false` the engine never samples and every mutation is a no-op.
    #[serde(rename = "metric.enable", default)]
    pub enabled: bool,
    /// Time between two sampling passes, in milliseconds.
    #[serde(
        rename = "metric.interval",
        default = "default_interval_ms",
        deserialize_with = "deserialize_interval"
    )]
    pub interval_ms: u64,
    /// Opaque application identifier forwarded to listeners.
    #[serde(
        rename = "application.id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub application_id: Option<String>,
    /// Emits extended per-instrument fields (rates, snapshot statistics).
    #[serde(rename = "metric.verbose.mode", default)]
    pub verbose: bool,
    /// Ordered listener identifiers resolved at construction.
    #[serde(rename = "metric.listeners", default = "default_listeners")]
    pub listeners: Vec<String>,
    /// Registers the built-in process and memory provider bundles.
    #[serde(rename = "metric.providers.enable", default = "default_true")]
    pub providers: bool,
    /// Every other property, passed through to listeners.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

fn default_listeners() -> Vec<String> {
    vec![DEFAULT_LISTENER.to_string()]
}

fn default_true() -> bool {
    true
}

/// Accepts the interval either as a JSON number or as a numeric string.
fn deserialize_interval<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawInterval {
        Number(u64),
        Text(String),
    }

    match RawInterval::deserialize(deserializer)? {
        RawInterval::Number(ms) => Ok(ms),
        RawInterval::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

impl MetricsConfig {
    /// Creates a configuration with every option at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> MetricsResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| MetricsError::InvalidConfig(e.to_string()))?;
        config.validate()
    }

    /// Builds a configuration from an already parsed JSON value.
    pub fn from_json_value(value: Value) -> MetricsResult<Self> {
        let config: Self =
            serde_json::from_value(value).map_err(|e| MetricsError::InvalidConfig(e.to_string()))?;
        config.validate()
    }

    fn validate(self) -> MetricsResult<Self> {
        if self.interval_ms == 0 {
            return Err(MetricsError::InvalidConfig(
                "metric.interval must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }

    /// Returns the sampling interval as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Looks up a pass-through property.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Sets the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the sampling interval, rounded up to the next whole millisecond.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = u64::try_from(interval.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX);
        self
    }

    /// Sets the application identifier.
    pub fn with_application_id(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = Some(application_id.into());
        self
    }

    /// Sets the verbose flag.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Replaces the listener identifiers.
    pub fn with_listeners<I, S>(mut self, listeners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.listeners = listeners.into_iter().map(Into::into).collect();
        self
    }

    /// Enables or disables the built-in provider bundles.
    pub fn with_providers(mut self, providers: bool) -> Self {
        self.providers = providers;
        self
    }

    /// Adds a pass-through property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: DEFAULT_INTERVAL_MS,
            application_id: None,
            verbose: false,
            listeners: default_listeners(),
            providers: true,
            properties: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.interval(), Duration::from_secs(60));
        assert!(!config.verbose);
        assert_eq!(config.listeners, vec!["console".to_string()]);
        assert!(config.application_id.is_none());
        assert!(config.providers);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = MetricsConfig::from_json_str("{}").unwrap();
        assert_eq!(config, MetricsConfig::default());
    }

    #[test]
    fn test_parse_dotted_keys() {
        let config = MetricsConfig::from_json_str(
            r#"{
                "metric.enable": true,
                "metric.interval": 1500,
                "application.id": "billing",
                "metric.verbose.mode": true,
                "metric.listeners": ["log", "memory"],
                "metric.providers.enable": false,
                "console.pretty": true
            }"#,
        )
        .unwrap();

        assert!(config.enabled);
        assert_eq!(config.interval_ms, 1500);
        assert_eq!(config.application_id.as_deref(), Some("billing"));
        assert!(config.verbose);
        assert_eq!(config.listeners, vec!["log", "memory"]);
        assert!(!config.providers);
        assert_eq!(config.property("console.pretty"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_interval_accepts_numeric_string() {
        let config = MetricsConfig::from_json_str(r#"{"metric.interval": " 250 "}"#).unwrap();
        assert_eq!(config.interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let zero = MetricsConfig::from_json_str(r#"{"metric.interval": 0}"#);
        assert!(matches!(zero, Err(MetricsError::InvalidConfig(_))));

        let garbage = MetricsConfig::from_json_str(r#"{"metric.interval": "soon"}"#);
        assert!(matches!(garbage, Err(MetricsError::InvalidConfig(_))));
    }

    #[test]
    fn test_builder() {
        let config = MetricsConfig::new()
            .with_enabled(true)
            .with_interval(Duration::from_millis(100))
            .with_application_id("app")
            .with_verbose(true)
            .with_listeners(["memory"])
            .with_property("memory.capacity", 16);

        assert!(config.enabled);
        assert_eq!(config.interval_ms, 100);
        assert_eq!(config.listeners, vec!["memory".to_string()]);
        assert_eq!(config.property("memory.capacity"), Some(&Value::from(16)));
    }

    #[test]
    fn test_sub_millisecond_interval_rounds_up() {
        let config = MetricsConfig::new().with_interval(Duration::from_micros(500));
        assert_eq!(config.interval_ms, 1);

        let config = MetricsConfig::new().with_interval(Duration::from_micros(2_500));
        assert_eq!(config.interval_ms, 3);

        let config = MetricsConfig::new().with_interval(Duration::ZERO);
        assert_eq!(config.interval_ms, 0);
    }

    #[test]
    fn test_round_trip_keeps_properties() {
        let config = MetricsConfig::new().with_property("kafka.topic", "metrics");
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["kafka.topic"], Value::from("metrics"));
        assert_eq!(MetricsConfig::from_json_value(json).unwrap(), config);
    }
}
