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

//! The capability contract every metric sink implements.

use crate::config::MetricsConfig;
use crate::telemetry::metrics::MetricValue;
use std::fmt::Debug;

/// The core trait for a metric listener.
///
/// A `MetricListener` is a sink that receives every derived field the engine
/// emits on each sampling pass. Listeners are constructed by a factory, given
/// their own copy of the engine configuration through [`init`](Self::init),
/// and then shared between the engine and its sampler thread.
///
/// `update_metric` and `close` take `&self`: the engine does not wait for an
/// in-flight pass before closing, so an implementation must tolerate `close`
/// running concurrently with a last `update_metric` call.
pub trait MetricListener: Send + Sync + Debug + 'static {
    /// Returns a stable identifier for this listener, used in logs.
    fn name(&self) -> &str;

    /// One-time setup with a private copy of the engine configuration.
    ///
    /// A failure drops this listener from the engine; other listeners are
    /// unaffected.
    fn init(&mut self, config: MetricsConfig) -> anyhow::Result<()>;

    /// Emits one derived field.
    ///
    /// `field` is the instrument name, optionally suffixed (`-count`,
    /// `-mean-rate`, `-max-value`, ...).
    fn update_metric(&self, field: &str, value: &MetricValue);

    /// Releases resources. Invoked exactly once, when the engine stops.
    fn close(&self);

    /// Allows downcasting to a concrete `MetricListener` type.
    fn as_any(&self) -> &dyn std::any::Any;
}
