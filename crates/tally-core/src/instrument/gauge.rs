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

//! A value computed on read.

use crate::telemetry::metrics::MetricValue;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

type ValueFn = dyn Fn() -> MetricValue + Send + Sync;

/// A point-in-time reading produced by a host closure.
#[derive(Clone)]
pub struct Gauge {
    read: Arc<ValueFn>,
}

impl Gauge {
    /// Creates a gauge that calls `read` on every sample.
    pub fn new<F>(read: F) -> Self
    where
        F: Fn() -> MetricValue + Send + Sync + 'static,
    {
        Self {
            read: Arc::new(read),
        }
    }

    /// Creates a gauge that recomputes its value at most once per `timeout`.
    ///
    /// Suited to readings that are expensive to take, such as a refresh of
    /// process statistics.
    pub fn cached<F>(timeout: Duration, read: F) -> Self
    where
        F: Fn() -> MetricValue + Send + Sync + 'static,
    {
        let cache: Mutex<Option<(Instant, MetricValue)>> = Mutex::new(None);
        Self::new(move || {
            let mut cached = cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some((taken_at, value)) = cached.as_ref() {
                if taken_at.elapsed() < timeout {
                    return value.clone();
                }
            }
            let value = read();
            *cached = Some((Instant::now(), value.clone()));
            value
        })
    }

    /// Returns the current value.
    pub fn value(&self) -> MetricValue {
        (self.read)()
    }
}

impl Debug for Gauge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gauge").finish_non_exhaustive()
    }
}
