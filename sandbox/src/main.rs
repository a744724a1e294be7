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
use tally_core::{Counter, Gauge, Histogram, Meter, MetricValue, MetricsConfig, Timer};
use tally_telemetry::MetricsManager;

fn main() -> anyhow::Result<()> {
    tally_telemetry::logging::init();

    let config = MetricsConfig::from_json_value(serde_json::json!({
        "metric.enable": true,
        "metric.interval": "500",
        "application.id": "sandbox",
        "metric.verbose.mode": true,
        "metric.listeners": ["console", "log"],
    }))?;
    let manager = Arc::new(MetricsManager::new(config));

    let requests = Counter::new();
    let hits = Meter::new();
    let sizes = Histogram::new();
    let work = Timer::new();
    manager.register("requests", requests.clone());
    manager.register("hits", hits.clone());
    manager.register("payload.size", sizes.clone());
    manager.register("work", work.clone());
    manager.register("mode", Gauge::new(|| MetricValue::from("demo")));

    let mut sampler = manager.start();
    for round in 0..20_i64 {
        requests.inc();
        hits.mark_n(3);
        sizes.update(round * 16);
        work.time(|| thread::sleep(Duration::from_millis(10)));
        thread::sleep(Duration::from_millis(100));
    }

    log::info!("Cleaned {} sandbox metrics", manager.clean());
    sampler.request_stop();
    sampler.await_stopped();
    Ok(())
}
