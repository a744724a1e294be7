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

use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tally_core::{Counter, MetricValue, MetricsConfig};
use tally_telemetry::listeners::memory::InMemoryMetricListener;
use tally_telemetry::{EngineState, MetricsManager};

const INTERVAL: Duration = Duration::from_millis(100);

fn recording_config() -> MetricsConfig {
    MetricsConfig::default()
        .with_enabled(true)
        .with_interval(INTERVAL)
        .with_listeners(["memory"])
        .with_providers(false)
}

fn recorder(manager: &MetricsManager) -> &InMemoryMetricListener {
    manager
        .listener("memory")
        .and_then(|listener| listener.as_any().downcast_ref::<InMemoryMetricListener>())
        .expect("memory listener should be active")
}

#[test]
fn test_first_pass_reports_counter_once() {
    tally_telemetry::logging::init_test();

    // --- 1. ARRANGE ---
    let manager = Arc::new(MetricsManager::new(recording_config()));
    let requests = Counter::new();
    requests.inc_by(5);
    assert!(manager.register("requests", requests));

    // --- 2. ACT ---
    let mut sampler = manager.start();
    thread::sleep(Duration::from_millis(150));

    // --- 3. ASSERT ---
    let updates = recorder(&manager).updates();
    assert_eq!(
        updates,
        vec![("requests".to_string(), MetricValue::Int(5))],
        "Exactly one pass should have run after one and a half intervals"
    );

    sampler.request_stop();
    sampler.await_stopped();
}

#[test]
fn test_disabled_engine_never_samples() {
    let manager = Arc::new(MetricsManager::new(
        recording_config().with_enabled(false),
    ));
    assert_eq!(manager.state(), EngineState::Disabled);
    assert!(!manager.register("requests", Counter::new()));

    let sampler = manager.start();
    thread::sleep(INTERVAL * 3);

    assert!(sampler.is_finished(), "No sampler thread should exist");
    assert!(manager.listeners().is_empty());
}

#[test]
fn test_unresolvable_listeners_disable_engine() {
    let manager = Arc::new(MetricsManager::new(
        recording_config().with_listeners(["missing", "also-missing"]),
    ));

    assert_eq!(manager.state(), EngineState::Disabled);
    assert!(manager.config().enabled);
    assert!(manager.start().is_finished());
}

#[test]
fn test_stop_closes_listeners_and_halts_sampling() {
    tally_telemetry::logging::init_test();

    let manager = Arc::new(MetricsManager::new(
        recording_config().with_listeners(["memory", "log"]),
    ));
    let ticks = Counter::new();
    manager.register("ticks", ticks.clone());

    let mut sampler = manager.start();
    thread::sleep(INTERVAL * 2 + INTERVAL / 2);
    sampler.request_stop();
    sampler.await_stopped();

    let recorded = recorder(&manager).update_count();
    assert!(recorded >= 1, "At least one pass should have run before stop");
    assert_eq!(recorder(&manager).close_count(), 1);
    assert_eq!(manager.state(), EngineState::Stopped);

    ticks.inc();
    thread::sleep(INTERVAL * 2);
    assert_eq!(
        recorder(&manager).update_count(),
        recorded,
        "No update may arrive once the engine is stopped"
    );

    manager.stop();
    assert_eq!(recorder(&manager).close_count(), 1, "close() runs exactly once");
}

#[test]
fn test_values_follow_instrument_between_passes() {
    let manager = Arc::new(MetricsManager::new(recording_config()));
    let pending = Counter::new();
    manager.register("pending", pending.clone());

    let mut sampler = manager.start();
    pending.inc_by(2);
    thread::sleep(INTERVAL + INTERVAL / 2);
    pending.dec();
    thread::sleep(INTERVAL);
    sampler.request_stop();
    sampler.await_stopped();

    let values = recorder(&manager).values_of("pending");
    assert!(values.len() >= 2);
    assert_eq!(values[0], MetricValue::Int(2));
    assert_eq!(values[1], MetricValue::Int(1));
}

#[test]
fn test_repeated_start_keeps_a_single_sampler() {
    let manager = Arc::new(MetricsManager::new(recording_config()));
    let requests = Counter::new();
    requests.inc();
    manager.register("requests", requests);

    let mut first = manager.start();
    let second = manager.start();
    thread::sleep(Duration::from_millis(150));

    assert!(first.is_active());
    assert!(second.is_finished(), "Only the first start spawns a sampler");
    assert_eq!(
        recorder(&manager).updates(),
        vec![("requests".to_string(), MetricValue::Int(1))],
        "One pass per interval, whatever the number of start calls"
    );

    drop(second);
    assert!(manager.is_running());
    first.request_stop();
    first.await_stopped();
}

#[test]
fn test_sub_millisecond_interval_still_paces_passes() {
    let config = recording_config().with_interval(Duration::from_micros(500));
    assert_eq!(config.interval_ms, 1);

    let manager = Arc::new(MetricsManager::new(config));
    manager.register("requests", Counter::new());

    let mut sampler = manager.start();
    thread::sleep(Duration::from_millis(50));
    sampler.request_stop();
    sampler.await_stopped();

    let passes = recorder(&manager).update_count();
    assert!(passes >= 1);
    assert!(passes <= 60, "Passes must be spaced by the interval, got {passes}");
}
