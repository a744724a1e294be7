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

//! The metrics engine: configuration, listeners, registry and lifecycle.

use crate::listeners::ListenerRegistry;
use crate::metrics::dispatch::Dispatcher;
use crate::metrics::registry::InstrumentRegistry;
use crate::monitoring;
use crate::sampler::{Sampler, SamplerHandle};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::Thread;
use tally_core::instrument::Instrument;
use tally_core::telemetry::provider::InstrumentSet;
use tally_core::{MetricListener, MetricsConfig, MetricsError, MetricsResult};

/// Lifecycle state of a [`MetricsManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Disabled by configuration, or no listener could be loaded.
    Disabled,
    /// Accepting registrations and sampling.
    Running,
    /// Stopped; listeners have been closed.
    Stopped,
}

/// Owns the instrument registry and the active listeners.
///
/// A manager is `Running` as soon as it is built with metrics enabled and at
/// least one listener; sampling starts with [`start`](Self::start). It never
/// returns to `Running` once stopped.
pub struct MetricsManager {
    config: MetricsConfig,
    registry: InstrumentRegistry,
    listeners: Vec<Arc<dyn MetricListener>>,
    disabled: bool,
    running: AtomicBool,
    sampler: Mutex<Option<Thread>>,
}

impl MetricsManager {
    /// Creates a manager using the built-in listener factories.
    pub fn new(config: MetricsConfig) -> Self {
        Self::with_listener_registry(config, &ListenerRegistry::with_builtins())
    }

    /// Creates a manager resolving listeners through `factories`.
    pub fn with_listener_registry(config: MetricsConfig, factories: &ListenerRegistry) -> Self {
        let registry = InstrumentRegistry::new();
        if !config.enabled {
            log::info!("Metrics are disabled");
            return Self::from_parts(config, registry, Vec::new());
        }
        if config.interval_ms == 0 {
            log::error!("metric.interval must be greater than zero, metrics are disabled");
            return Self::from_parts(config, registry, Vec::new());
        }

        let listeners = factories.load(&config);
        if listeners.is_empty() {
            log::warn!("No metric listener could be loaded, metrics are disabled");
            return Self::from_parts(config, registry, listeners);
        }

        let names: Vec<&str> = listeners.iter().map(|l| l.name()).collect();
        log::info!("Active metric listeners: {}", names.join(", "));

        if config.providers {
            monitoring::register_builtin(&registry);
        }
        Self::from_parts(config, registry, listeners)
    }

    fn from_parts(
        config: MetricsConfig,
        registry: InstrumentRegistry,
        listeners: Vec<Arc<dyn MetricListener>>,
    ) -> Self {
        let disabled = !config.enabled || config.interval_ms == 0 || listeners.is_empty();
        Self {
            config,
            registry,
            listeners,
            disabled,
            running: AtomicBool::new(!disabled),
            sampler: Mutex::new(None),
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> EngineState {
        if self.disabled {
            EngineState::Disabled
        } else if self.running.load(Ordering::Acquire) {
            EngineState::Running
        } else {
            EngineState::Stopped
        }
    }

    /// Returns `true` while the manager accepts registrations and samples.
    pub fn is_running(&self) -> bool {
        self.state() == EngineState::Running
    }

    /// Spawns the sampler thread.
    ///
    /// The handle is inert unless the manager is running and no sampler was
    /// started before.
    pub fn start(self: &Arc<Self>) -> SamplerHandle {
        Sampler::start(Arc::clone(self))
    }

    /// Stops sampling and closes every listener.
    ///
    /// Only the first call has an effect. An in-flight pass is not awaited, so
    /// a listener may still receive updates concurrently with `close()`.
    pub fn stop(&self) {
        if self
            .running
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        for listener in &self.listeners {
            listener.close();
        }
        if let Some(thread) = self.lock_sampler().as_ref() {
            thread.unpark();
        }
        log::info!("Metrics engine stopped");
    }

    /// Locks the slot holding the sampler thread. A filled slot means a
    /// sampler has already been started for this manager.
    pub(crate) fn lock_sampler(&self) -> MutexGuard<'_, Option<Thread>> {
        self.sampler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_running(&self) -> MetricsResult<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(MetricsError::Disabled)
        }
    }

    /// Registers a named instrument.
    ///
    /// Returns `false`, with a warning, when the manager is not running or the
    /// name is already taken; the existing instrument is kept.
    pub fn register(&self, name: &str, instrument: impl Into<Instrument>) -> bool {
        let registered = self
            .ensure_running()
            .and_then(|()| self.registry.register(name, instrument.into()));
        match registered {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Metric registration of {} rejected: {}", name, e);
                false
            }
        }
    }

    /// Removes an instrument previously added through [`register`](Self::register).
    pub fn remove(&self, name: &str) -> bool {
        match self.ensure_running().and_then(|()| self.registry.remove(name)) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Removal of metric {} ignored: {}", name, e);
                false
            }
        }
    }

    /// Removes every instrument added through [`register`](Self::register).
    ///
    /// Bundle instruments stay registered.
    pub fn clean(&self) -> usize {
        let removed = self.registry.clean();
        log::debug!("Removed {} registered metrics", removed);
        removed
    }

    /// Registers a bundle under `prefix`; its instruments are never cleaned.
    pub fn register_set(&self, prefix: &str, set: &dyn InstrumentSet) -> usize {
        if let Err(e) = self.ensure_running() {
            log::warn!("Cannot register metric set {}: {}", prefix, e);
            return 0;
        }
        self.registry.register_all(prefix, set)
    }

    /// Runs one sampling pass and returns the number of fields emitted.
    ///
    /// A panic raised by an instrument or listener is logged and ends the pass
    /// early; the sampler keeps running.
    pub fn dispatch_pass(&self) -> usize {
        let dispatcher = Dispatcher::new(&self.registry, &self.listeners, self.config.verbose);
        match panic::catch_unwind(AssertUnwindSafe(|| dispatcher.dispatch_pass())) {
            Ok(emitted) => {
                log::trace!("Sampling pass emitted {} fields", emitted);
                emitted
            }
            Err(_) => {
                log::error!("Sampling pass aborted by a panic");
                0
            }
        }
    }

    /// Returns the configuration the manager was built with.
    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Returns the instrument registry.
    pub fn registry(&self) -> &InstrumentRegistry {
        &self.registry
    }

    /// Returns the active listeners, in configuration order.
    pub fn listeners(&self) -> &[Arc<dyn MetricListener>] {
        &self.listeners
    }

    /// Returns the first active listener named `name`.
    pub fn listener(&self, name: &str) -> Option<&Arc<dyn MetricListener>> {
        self.listeners.iter().find(|l| l.name() == name)
    }
}

impl Drop for MetricsManager {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for MetricsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsManager")
            .field("state", &self.state())
            .field("instruments", &self.registry.len())
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}
