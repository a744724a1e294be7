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

//! Registry of named instruments and the ledger of engine-made registrations.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tally_core::instrument::{Instrument, InstrumentKind};
use tally_core::telemetry::provider::{flatten, InstrumentSet};
use tally_core::{MetricsError, MetricsResult};

#[derive(Debug, Default)]
struct RegistryState {
    instruments: HashMap<String, Instrument>,
    /// Names added through [`InstrumentRegistry::register`]. Always a subset
    /// of the keys of `instruments`.
    ledger: HashSet<String>,
}

/// Thread-safe registry of instruments keyed by name.
///
/// The registry and the registration ledger live behind one `RwLock`, so a
/// sampling pass never observes a half-applied mutation. Names are unique
/// across kinds: a gauge and a counter cannot share a name.
///
/// Instruments registered through [`register_untracked`](Self::register_untracked)
/// or [`register_all`](Self::register_all) (provider bundles) are not recorded
/// in the ledger. They can never be removed through [`remove`](Self::remove)
/// or [`clean`](Self::clean); this is a known limitation kept as-is because
/// hosts rely on bundles surviving a `clean()`.
#[derive(Debug, Default)]
pub struct InstrumentRegistry {
    state: RwLock<RegistryState>,
}

impl InstrumentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers an instrument and records its name in the ledger.
    ///
    /// Fails with [`MetricsError::DuplicateName`] if any instrument, tracked
    /// or not, already uses `name`; the existing instrument is kept.
    pub fn register(&self, name: &str, instrument: Instrument) -> MetricsResult<()> {
        let mut state = self.write();
        if state.instruments.contains_key(name) {
            return Err(MetricsError::DuplicateName(name.to_string()));
        }
        state.instruments.insert(name.to_string(), instrument);
        state.ledger.insert(name.to_string());
        Ok(())
    }

    /// Registers an instrument without recording it in the ledger.
    pub fn register_untracked(&self, name: &str, instrument: Instrument) -> MetricsResult<()> {
        let mut state = self.write();
        if state.instruments.contains_key(name) {
            return Err(MetricsError::DuplicateName(name.to_string()));
        }
        state.instruments.insert(name.to_string(), instrument);
        Ok(())
    }

    /// Registers every instrument of a bundle under `prefix`, flattening
    /// nested groups into dotted names. Bypasses the ledger.
    ///
    /// Returns how many instruments were added; names already in use are
    /// skipped with a warning.
    pub fn register_all(&self, prefix: &str, set: &dyn InstrumentSet) -> usize {
        let mut added = 0;
        for (name, instrument) in flatten(prefix, set) {
            match self.register_untracked(&name, instrument) {
                Ok(()) => added += 1,
                Err(e) => log::warn!("Skipping bundle instrument: {}", e),
            }
        }
        added
    }

    /// Removes an instrument registered through [`register`](Self::register).
    ///
    /// Untracked instruments are left in place and reported as
    /// [`MetricsError::NotRegistered`].
    pub fn remove(&self, name: &str) -> MetricsResult<Instrument> {
        let mut state = self.write();
        if !state.ledger.remove(name) {
            return Err(MetricsError::NotRegistered(name.to_string()));
        }
        state
            .instruments
            .remove(name)
            .ok_or_else(|| MetricsError::NotRegistered(name.to_string()))
    }

    /// Removes every tracked instrument and empties the ledger.
    ///
    /// Returns the number of instruments removed.
    pub fn clean(&self) -> usize {
        let mut state = self.write();
        let ledger = std::mem::take(&mut state.ledger);
        let mut removed = 0;
        for name in ledger {
            if state.instruments.remove(&name).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Returns a handle to the instrument registered under `name`.
    pub fn get(&self, name: &str) -> Option<Instrument> {
        self.read().instruments.get(name).cloned()
    }

    /// Returns the instrument under `name` only if it is of `kind`.
    pub fn get_kind(&self, name: &str, kind: InstrumentKind) -> Option<Instrument> {
        self.read()
            .instruments
            .get(name)
            .filter(|instrument| instrument.kind() == kind)
            .cloned()
    }

    /// Returns the sorted names of every instrument of `kind`.
    pub fn names(&self, kind: InstrumentKind) -> Vec<String> {
        let mut names: Vec<String> = self
            .read()
            .instruments
            .iter()
            .filter(|(_, instrument)| instrument.kind() == kind)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort_unstable();
        names
    }

    /// Checks if an instrument uses `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.read().instruments.contains_key(name)
    }

    /// Checks if `name` was registered through the ledger.
    pub fn is_tracked(&self, name: &str) -> bool {
        self.read().ledger.contains(name)
    }

    /// Returns the total number of instruments.
    pub fn len(&self) -> usize {
        self.read().instruments.len()
    }

    /// Returns `true` if no instrument is registered.
    pub fn is_empty(&self) -> bool {
        self.read().instruments.is_empty()
    }

    /// Returns the number of ledger entries.
    pub fn tracked_count(&self) -> usize {
        self.read().ledger.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tally_core::instrument::{Counter, Gauge, Histogram, Meter};
    use tally_core::telemetry::provider::SetEntry;

    struct BufferSet;

    impl InstrumentSet for BufferSet {
        fn instruments(&self) -> Vec<(String, SetEntry)> {
            vec![
                ("direct.count".to_string(), Gauge::new(|| 2i64.into()).into()),
                ("mapped.count".to_string(), Gauge::new(|| 0i64.into()).into()),
            ]
        }
    }

    #[test]
    fn test_registry_creation() {
        let registry = InstrumentRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.tracked_count(), 0);
    }

    #[test]
    fn test_duplicate_register_keeps_original() {
        let registry = InstrumentRegistry::new();
        let original = Counter::new();
        original.inc_by(7);

        registry.register("requests", original.into()).unwrap();
        let result = registry.register("requests", Counter::new().into());

        assert_eq!(
            result,
            Err(MetricsError::DuplicateName("requests".to_string()))
        );
        assert_eq!(registry.tracked_count(), 1);
        let kept = registry.get("requests").unwrap();
        assert_eq!(kept.as_counter().map(Counter::count), Some(7));
    }

    #[test]
    fn test_names_are_kind_agnostic() {
        let registry = InstrumentRegistry::new();
        registry
            .register("x", Gauge::new(|| 1i64.into()).into())
            .unwrap();

        assert!(registry.register("x", Counter::new().into()).is_err());
        assert_eq!(
            registry.get("x").map(|i| i.kind()),
            Some(InstrumentKind::Gauge)
        );
    }

    #[test]
    fn test_remove_untracked_name_is_rejected() {
        let registry = InstrumentRegistry::new();
        registry
            .register_untracked("memory.used", Gauge::new(|| 1i64.into()).into())
            .unwrap();

        assert_eq!(
            registry.remove("memory.used").unwrap_err(),
            MetricsError::NotRegistered("memory.used".to_string())
        );
        assert_eq!(
            registry.remove("missing").unwrap_err(),
            MetricsError::NotRegistered("missing".to_string())
        );
        assert!(registry.contains("memory.used"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_tracked() {
        let registry = InstrumentRegistry::new();
        registry.register("latency", Histogram::new().into()).unwrap();

        let removed = registry.remove("latency").unwrap();
        assert_eq!(removed.kind(), InstrumentKind::Histogram);
        assert!(!registry.contains("latency"));
        assert!(!registry.is_tracked("latency"));
    }

    #[test]
    fn test_clean_only_removes_tracked() {
        let registry = InstrumentRegistry::new();
        registry.register("a", Counter::new().into()).unwrap();
        registry.register("b", Meter::new().into()).unwrap();
        assert_eq!(registry.register_all("buffers", &BufferSet), 2);

        assert_eq!(registry.clean(), 2);
        assert_eq!(registry.tracked_count(), 0);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("buffers.direct.count"));
        assert!(registry.contains("buffers.mapped.count"));
    }

    #[test]
    fn test_bundle_names_block_tracked_duplicates() {
        let registry = InstrumentRegistry::new();
        registry.register_all("buffers", &BufferSet);

        assert!(registry
            .register("buffers.direct.count", Counter::new().into())
            .is_err());
        // A second bundle registration skips names already taken.
        assert_eq!(registry.register_all("buffers", &BufferSet), 0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_names_by_kind() {
        let registry = InstrumentRegistry::new();
        registry.register("c1", Counter::new().into()).unwrap();
        registry.register("c2", Counter::new().into()).unwrap();
        registry.register("m1", Meter::new().into()).unwrap();

        let mut counters = registry.names(InstrumentKind::Counter);
        counters.sort();
        assert_eq!(counters, vec!["c1", "c2"]);
        assert_eq!(registry.names(InstrumentKind::Meter), vec!["m1"]);
        assert!(registry.names(InstrumentKind::Timer).is_empty());
        assert!(registry.get_kind("m1", InstrumentKind::Counter).is_none());
        assert!(registry.get_kind("m1", InstrumentKind::Meter).is_some());
    }

    #[test]
    fn test_concurrent_registration_keeps_one_per_name() {
        let registry = Arc::new(InstrumentRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    (0..50)
                        .filter(|i| {
                            registry
                                .register(&format!("metric-{i}"), Counter::new().into())
                                .is_ok()
                        })
                        .count()
                })
            })
            .collect();

        let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(accepted, 50);
        assert_eq!(registry.len(), 50);
        assert_eq!(registry.tracked_count(), 50);
    }
}
