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

//! # Tally Core
//!
//! Foundational crate containing the instrument types, the listener contract
//! and the configuration snapshot shared by the collection engine and by the
//! host applications that feed it.

#![warn(missing_docs)]

pub mod config;
pub mod instrument;
pub mod telemetry;

pub use config::MetricsConfig;
pub use instrument::{
    Counter, Gauge, Histogram, Instrument, InstrumentKind, Meter, Snapshot, Timer, TimerContext,
};
pub use telemetry::{
    InstrumentSet, MetricListener, MetricValue, MetricsError, MetricsResult, SetEntry,
};
