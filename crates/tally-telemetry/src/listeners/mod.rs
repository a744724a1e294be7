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

//! Listener plugin loading.
//!
//! Listener identifiers from the configuration are resolved against a
//! [`ListenerRegistry`] of named factories. Built-in listeners register
//! themselves at link time through [`inventory`]; hosts add their own with
//! [`ListenerRegistry::register_factory`].

pub mod console;
pub mod logger;
pub mod memory;

use std::collections::HashMap;
use std::sync::Arc;
use tally_core::{MetricListener, MetricsConfig, MetricsError, MetricsResult};

/// Creates a fresh, uninitialized listener.
pub type ListenerFactory =
    Arc<dyn Fn() -> anyhow::Result<Box<dyn MetricListener>> + Send + Sync>;

/// A listener factory submitted at link time.
pub struct ListenerRegistration {
    /// Identifier used in `metric.listeners`.
    pub id: &'static str,
    /// Constructs the listener.
    pub create: fn() -> anyhow::Result<Box<dyn MetricListener>>,
}

inventory::collect!(ListenerRegistration);

/// Maps listener identifiers to factories.
#[derive(Clone)]
pub struct ListenerRegistry {
    factories: HashMap<String, ListenerFactory>,
}

impl ListenerRegistry {
    /// Creates a registry with no factories at all.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Creates a registry holding every built-in listener.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for registration in inventory::iter::<ListenerRegistration> {
            let create = registration.create;
            registry.register_factory(registration.id, move || create());
        }
        registry
    }

    /// Adds or replaces the factory for `id`.
    ///
    /// Returns the factory previously registered under `id`, if any.
    pub fn register_factory<F>(&mut self, id: impl Into<String>, factory: F) -> Option<ListenerFactory>
    where
        F: Fn() -> anyhow::Result<Box<dyn MetricListener>> + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Arc::new(factory))
    }

    /// Checks if a factory is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Returns the known identifiers, sorted.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Constructs and initializes the listener registered under `id`.
    ///
    /// `init` receives its own copy of `config`.
    pub fn create(&self, id: &str, config: &MetricsConfig) -> MetricsResult<Box<dyn MetricListener>> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| MetricsError::UnknownListener(id.to_string()))?;
        let mut listener = factory().map_err(|e| MetricsError::ListenerInit {
            listener: id.to_string(),
            reason: format!("{e:#}"),
        })?;
        listener
            .init(config.clone())
            .map_err(|e| MetricsError::ListenerInit {
                listener: id.to_string(),
                reason: format!("{e:#}"),
            })?;
        Ok(listener)
    }

    /// Resolves every identifier of `config.listeners`, in order.
    ///
    /// Unknown identifiers and listeners failing construction or `init` are
    /// logged and skipped; the others are still loaded.
    pub fn load(&self, config: &MetricsConfig) -> Vec<Arc<dyn MetricListener>> {
        let mut listeners: Vec<Arc<dyn MetricListener>> = Vec::new();
        for id in &config.listeners {
            match self.create(id, config) {
                Ok(listener) => listeners.push(Arc::from(listener)),
                Err(MetricsError::UnknownListener(_)) => {
                    log::error!("Couldn't find the metric listener '{}'", id);
                }
                Err(e) => log::error!("Couldn't create the metric listener '{}': {}", id, e),
            }
        }
        listeners
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("identifiers", &self.identifiers())
            .finish()
    }
}
