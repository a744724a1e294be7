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

//! Contract for provider bundles contributing groups of named instruments.

use crate::instrument::{Counter, Gauge, Histogram, Instrument, Meter, Timer};

/// One entry of an [`InstrumentSet`]: either a live instrument or a nested
/// group whose names are flattened under the parent key.
pub enum SetEntry {
    /// A single instrument.
    Instrument(Instrument),
    /// A nested group, registered as `<prefix>.<key>.<child>`.
    Nested(Box<dyn InstrumentSet>),
}

impl From<Instrument> for SetEntry {
    fn from(instrument: Instrument) -> Self {
        SetEntry::Instrument(instrument)
    }
}

macro_rules! impl_set_entry_from {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for SetEntry {
                fn from(instrument: $ty) -> Self {
                    SetEntry::Instrument(instrument.into())
                }
            }
        )*
    };
}

impl_set_entry_from!(Counter, Gauge, Meter, Histogram, Timer);

/// A bundle of named instruments contributed at startup.
///
/// Bundles bypass the engine's registration ledger: they are registered
/// straight into the registry and are never removed by `clean()`.
pub trait InstrumentSet: Send + Sync {
    /// Returns the bundle's entries keyed by their local (unprefixed) name.
    fn instruments(&self) -> Vec<(String, SetEntry)>;
}

/// Recursively flattens a set into `(dotted_name, instrument)` pairs.
///
/// Nested groups are joined with `.`; an empty prefix yields bare keys.
pub fn flatten(prefix: &str, set: &dyn InstrumentSet) -> Vec<(String, Instrument)> {
    let mut flattened = Vec::new();
    for (key, entry) in set.instruments() {
        let name = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };
        match entry {
            SetEntry::Instrument(instrument) => flattened.push((name, instrument)),
            SetEntry::Nested(nested) => flattened.extend(flatten(&name, nested.as_ref())),
        }
    }
    flattened
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PoolSet;

    impl InstrumentSet for PoolSet {
        fn instruments(&self) -> Vec<(String, SetEntry)> {
            vec![
                ("used".to_string(), Gauge::new(|| 3i64.into()).into()),
                ("capacity".to_string(), Gauge::new(|| 8i64.into()).into()),
            ]
        }
    }

    struct RootSet;

    impl InstrumentSet for RootSet {
        fn instruments(&self) -> Vec<(String, SetEntry)> {
            vec![
                ("allocations".to_string(), Counter::new().into()),
                ("pool".to_string(), SetEntry::Nested(Box::new(PoolSet))),
            ]
        }
    }

    #[test]
    fn test_flatten_joins_nested_groups() {
        let mut names: Vec<String> = flatten("buffers", &RootSet)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "buffers.allocations",
                "buffers.pool.capacity",
                "buffers.pool.used"
            ]
        );
    }

    #[test]
    fn test_flatten_without_prefix() {
        let names: Vec<String> = flatten("", &PoolSet)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["used", "capacity"]);
    }
}
