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

//! A listener that keeps every update in memory, for hosts that poll and for tests.

use crate::listeners::ListenerRegistration;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tally_core::{MetricListener, MetricValue, MetricsConfig};

/// Identifier of this listener in `metric.listeners`.
pub const MEMORY_LISTENER: &str = "memory";

/// Property bounding how many updates are retained.
pub const CAPACITY_PROPERTY: &str = "metric.memory.capacity";

const DEFAULT_CAPACITY: usize = 10_000;

/// Records updates in arrival order, dropping the oldest beyond its capacity.
#[derive(Debug)]
pub struct InMemoryMetricListener {
    capacity: usize,
    config: Option<MetricsConfig>,
    updates: Mutex<VecDeque<(String, MetricValue)>>,
    close_calls: AtomicUsize,
}

impl InMemoryMetricListener {
    /// Creates an empty listener with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty listener retaining at most `capacity` updates.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            config: None,
            updates: Mutex::new(VecDeque::new()),
            close_calls: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<(String, MetricValue)>> {
        self.updates.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the configuration received through `init`.
    pub fn config(&self) -> Option<&MetricsConfig> {
        self.config.as_ref()
    }

    /// Returns every retained update, oldest first.
    pub fn updates(&self) -> Vec<(String, MetricValue)> {
        self.lock().iter().cloned().collect()
    }

    /// Returns the number of retained updates.
    pub fn update_count(&self) -> usize {
        self.lock().len()
    }

    /// Returns the most recent value emitted for `field`.
    pub fn latest(&self, field: &str) -> Option<MetricValue> {
        self.lock()
            .iter()
            .rev()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.clone())
    }

    /// Returns every retained value emitted for `field`, oldest first.
    pub fn values_of(&self, field: &str) -> Vec<MetricValue> {
        self.lock()
            .iter()
            .filter(|(name, _)| name == field)
            .map(|(_, value)| value.clone())
            .collect()
    }

    /// Drops every retained update.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Returns how many times `close` was called.
    pub fn close_count(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryMetricListener {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricListener for InMemoryMetricListener {
    fn name(&self) -> &str {
        MEMORY_LISTENER
    }

    fn init(&mut self, config: MetricsConfig) -> anyhow::Result<()> {
        if let Some(raw) = config.property(CAPACITY_PROPERTY) {
            let capacity = raw
                .as_u64()
                .filter(|&capacity| capacity > 0)
                .ok_or_else(|| anyhow::anyhow!("{CAPACITY_PROPERTY} must be a positive integer"))?;
            self.capacity = usize::try_from(capacity)?;
        }
        self.config = Some(config);
        Ok(())
    }

    fn update_metric(&self, field: &str, value: &MetricValue) {
        let mut updates = self.lock();
        if updates.len() == self.capacity {
            updates.pop_front();
        }
        updates.push_back((field.to_string(), value.clone()));
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn create() -> anyhow::Result<Box<dyn MetricListener>> {
    Ok(Box::new(InMemoryMetricListener::new()))
}

inventory::submit! {
    ListenerRegistration {
        id: MEMORY_LISTENER,
        create,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let listener = InMemoryMetricListener::new();
        listener.update_metric("a", &MetricValue::Int(1));
        listener.update_metric("b", &MetricValue::Float(0.5));
        listener.update_metric("a", &MetricValue::Int(2));

        assert_eq!(listener.update_count(), 3);
        assert_eq!(listener.latest("a"), Some(MetricValue::Int(2)));
        assert_eq!(
            listener.values_of("a"),
            vec![MetricValue::Int(1), MetricValue::Int(2)]
        );
        assert!(listener.latest("c").is_none());

        listener.clear();
        assert_eq!(listener.update_count(), 0);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let listener = InMemoryMetricListener::with_capacity(2);
        for i in 0..3 {
            listener.update_metric("n", &MetricValue::Int(i));
        }
        assert_eq!(
            listener.values_of("n"),
            vec![MetricValue::Int(1), MetricValue::Int(2)]
        );
    }

    #[test]
    fn test_capacity_from_config() {
        let mut listener = InMemoryMetricListener::new();
        listener
            .init(MetricsConfig::default().with_property(CAPACITY_PROPERTY, 1))
            .unwrap();
        listener.update_metric("n", &MetricValue::Int(1));
        listener.update_metric("n", &MetricValue::Int(2));
        assert_eq!(listener.updates(), vec![("n".to_string(), MetricValue::Int(2))]);

        let mut invalid = InMemoryMetricListener::new();
        assert!(invalid
            .init(MetricsConfig::default().with_property(CAPACITY_PROPERTY, "lots"))
            .is_err());
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn test_capacity_beyond_address_space_is_rejected() {
        let mut listener = InMemoryMetricListener::new();
        let result = listener.init(MetricsConfig::default().with_property(CAPACITY_PROPERTY, u64::MAX));
        assert!(result.is_err());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_large_capacity_is_kept_exactly() {
        let mut listener = InMemoryMetricListener::new();
        let capacity = u64::from(u32::MAX) + 1;
        listener
            .init(MetricsConfig::default().with_property(CAPACITY_PROPERTY, capacity))
            .unwrap();
        assert_eq!(listener.capacity, 1 << 32);
    }

    #[test]
    fn test_close_is_counted() {
        let listener = InMemoryMetricListener::new();
        listener.close();
        assert_eq!(listener.close_count(), 1);
    }
}
