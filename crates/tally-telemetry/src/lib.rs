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

//! # Tally Telemetry
//!
//! The collection engine. A [`MetricsManager`] owns the instrument registry
//! and the listeners resolved from configuration; a [`Sampler`] thread walks
//! the registry every interval and pushes derived fields to each listener.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tally_core::{Counter, MetricsConfig};
//! use tally_telemetry::MetricsManager;
//!
//! let config = MetricsConfig::default().with_enabled(true);
//! let manager = Arc::new(MetricsManager::new(config));
//! let requests = Counter::new();
//! manager.register("requests", requests.clone());
//! let sampler = manager.start();
//! requests.inc();
//! drop(sampler);
//! ```

#![warn(missing_docs)]

pub mod listeners;
pub mod logging;
pub mod metrics;
pub mod monitoring;
pub mod sampler;
pub mod service;

pub use listeners::{ListenerFactory, ListenerRegistration, ListenerRegistry};
pub use metrics::dispatch::{fields_for, Dispatcher};
pub use metrics::registry::InstrumentRegistry;
pub use sampler::{Sampler, SamplerHandle};
pub use service::{EngineState, MetricsManager};
