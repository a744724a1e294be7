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

//! Background thread driving periodic sampling passes.

use crate::service::MetricsManager;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Name given to the sampling thread.
pub const SAMPLER_THREAD_NAME: &str = "tally-sampler";

/// Spawns the sampling thread of a [`MetricsManager`].
pub struct Sampler;

impl Sampler {
    /// Starts sampling `engine` every configured interval.
    ///
    /// The first pass runs one interval after this call. Only the first call
    /// on a running engine spawns a thread; otherwise the returned handle is
    /// inert and never stops the engine.
    pub fn start(engine: Arc<MetricsManager>) -> SamplerHandle {
        if !engine.is_running() {
            log::debug!("Sampler not started: engine is {:?}", engine.state());
            return SamplerHandle::inert(engine);
        }

        let spawned = {
            let mut slot = engine.lock_sampler();
            if slot.is_some() {
                log::warn!("Sampler already started for this engine");
                None
            } else {
                let worker = Arc::clone(&engine);
                match thread::Builder::new()
                    .name(SAMPLER_THREAD_NAME.to_string())
                    .spawn(move || run(&worker))
                {
                    Ok(handle) => {
                        // Published before `stop()` can take the slot to unpark.
                        *slot = Some(handle.thread().clone());
                        Some(handle)
                    }
                    Err(e) => {
                        log::error!("Failed to spawn sampler thread: {}", e);
                        None
                    }
                }
            }
        };

        match spawned {
            Some(handle) => SamplerHandle {
                engine,
                handle: Some(handle),
            },
            None => SamplerHandle::inert(engine),
        }
    }
}

fn run(engine: &MetricsManager) {
    let interval = engine.config().interval();
    log::info!("Sampler started with interval {:?}", interval);

    'sampling: loop {
        let deadline = Instant::now() + interval;
        loop {
            if !engine.is_running() {
                break 'sampling;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::park_timeout(deadline - now);
        }
        engine.dispatch_pass();
    }

    log::info!("Sampler stopped");
}

/// Handle on a running sampler.
///
/// Dropping the handle that owns the sampling thread stops the engine and
/// joins the thread. Dropping an inert handle does nothing.
pub struct SamplerHandle {
    engine: Arc<MetricsManager>,
    handle: Option<JoinHandle<()>>,
}

impl SamplerHandle {
    fn inert(engine: Arc<MetricsManager>) -> Self {
        Self { engine, handle: None }
    }

    /// Stops the engine; the thread exits at its next wake-up.
    pub fn request_stop(&self) {
        self.engine.stop();
    }

    /// Waits for the sampling thread to exit. Returns immediately when inert.
    pub fn await_stopped(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Sampler thread panicked");
            }
        }
    }

    /// Returns `true` once the thread has exited, or if none was spawned.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Returns `true` if a sampling thread was spawned and is still alive.
    pub fn is_active(&self) -> bool {
        !self.is_finished()
    }

    /// Returns the engine being sampled.
    pub fn engine(&self) -> &Arc<MetricsManager> {
        &self.engine
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.request_stop();
            self.await_stopped();
        }
    }
}

impl std::fmt::Debug for SamplerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplerHandle")
            .field("state", &self.engine.state())
            .field("active", &self.is_active())
            .finish()
    }
}
