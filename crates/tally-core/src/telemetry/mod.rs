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

//! Provides the foundational contracts for metric export.
//!
//! This module defines the "common language" between the collection engine and
//! everything around it: the values pushed to sinks, the [`MetricListener`]
//! capability that every sink implements, and the [`InstrumentSet`] contract
//! used by provider bundles to contribute groups of named instruments.
//!
//! The engine itself (registry, ledger, sampler and dispatcher) lives in
//! `tally-telemetry`.

pub mod listener;
pub mod metrics;
pub mod provider;

pub use self::listener::MetricListener;
pub use self::metrics::{MetricValue, MetricsError, MetricsResult};
pub use self::provider::{InstrumentSet, SetEntry};
