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
use tally_core::{Counter, InstrumentSet, MetricValue, MetricsConfig, SetEntry};
use tally_telemetry::listeners::memory::{InMemoryMetricListener, CAPACITY_PROPERTY};
use tally_telemetry::MetricsManager;

const INTERVAL: Duration = Duration::from_millis(5);
const WORKERS: i64 = 4;
const ROUNDS: i64 = 150;

struct HeartbeatSet(Counter);

impl InstrumentSet for HeartbeatSet {
    fn instruments(&self) -> Vec<(String, SetEntry)> {
        vec![("beats".to_string(), self.0.clone().into())]
    }
}

fn recorder(manager: &MetricsManager) -> &InMemoryMetricListener {
    manager
        .listener("memory")
        .and_then(|listener| listener.as_any().downcast_ref::<InMemoryMetricListener>())
        .expect("memory listener should be active")
}

fn heartbeats(manager: &MetricsManager) -> usize {
    recorder(manager).values_of("heartbeat.beats").len()
}

#[test]
fn test_host_churn_while_sampling() {
    tally_telemetry::logging::init_test();

    // --- 1. ARRANGE ---
    let manager = Arc::new(MetricsManager::new(
        MetricsConfig::default()
            .with_enabled(true)
            .with_interval(INTERVAL)
            .with_listeners(["memory"])
            .with_providers(false)
            .with_property(CAPACITY_PROPERTY, 1_000_000),
    ));
    // Bundle instruments survive clean(), so the heartbeat is reported on every pass.
    assert_eq!(manager.register_set("heartbeat", &HeartbeatSet(Counter::new())), 1);
    let mut sampler = manager.start();

    // --- 2. ACT ---
    let workers: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for round in 0..ROUNDS {
                    let counter = Counter::new();
                    counter.inc_by(worker * ROUNDS + round);
                    let name = format!("churn.{worker}.{round}");
                    manager.register(&name, counter);
                    if round % 3 == 0 {
                        thread::sleep(Duration::from_millis(1));
                    }
                    manager.remove(&name);
                    if worker == 0 && round % 50 == 49 {
                        manager.clean();
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    let beats_after_churn = heartbeats(&manager);
    thread::sleep(INTERVAL * 10);

    // --- 3. ASSERT ---
    assert!(sampler.is_active(), "The sampler must survive concurrent churn");
    assert!(
        heartbeats(&manager) > beats_after_churn,
        "Passes must keep running after the churn"
    );

    for (field, value) in recorder(&manager).updates() {
        if field == "heartbeat.beats" {
            assert_eq!(value, MetricValue::Int(0));
            continue;
        }
        let parts: Vec<i64> = field
            .strip_prefix("churn.")
            .unwrap_or_else(|| panic!("unexpected field {field}"))
            .split('.')
            .map(|part| part.parse().unwrap())
            .collect();
        let (worker, round) = (parts[0], parts[1]);
        assert_eq!(
            value,
            MetricValue::Int(worker * ROUNDS + round),
            "{field} must carry the value of the instrument registered under that name"
        );
    }

    // Churned instruments are gone; only the bundle remains.
    assert_eq!(manager.registry().tracked_count(), 0);
    assert_eq!(manager.registry().len(), 1);

    sampler.request_stop();
    sampler.await_stopped();
    assert_eq!(recorder(&manager).close_count(), 1);
}
