//! Player-owned machines, aggregated by composite key.
//!
//! Many identical units are modeled as one entry with an integer `count`
//! rather than per-unit state. The book is pre-populated with every legal
//! `(machine type, recept-or-idle)` combination at player creation, so
//! command handling never inserts keys and a missing key always signals a
//! broken catalog/state contract.

use crate::catalog::Catalog;
use crate::id::MachineKey;
use std::collections::BTreeMap;

/// An aggregate of `count` identical parallel units of one machine type
/// running one recept (or idling). All units run in lockstep at one shared
/// throttle fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Machine {
    pub key: MachineKey,
    pub count: u32,
}

/// The per-player machine book: one entry per key, in deterministic key
/// order so settlement iterates machines the same way every tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineBook {
    entries: BTreeMap<MachineKey, Machine>,
}

impl MachineBook {
    /// Pre-populate one zero-count entry per machine type for each available
    /// recept plus the idle entry.
    pub fn seeded(catalog: &Catalog) -> Self {
        let mut entries = BTreeMap::new();
        for machine_type in catalog.machine_ids() {
            let mut insert = |key: MachineKey| {
                entries.insert(key, Machine { key, count: 0 });
            };
            insert(MachineKey::idle(machine_type));
            if let Some(def) = catalog.machine(machine_type) {
                for recept in &def.available {
                    insert(MachineKey::new(machine_type, Some(*recept)));
                }
            }
        }
        Self { entries }
    }

    pub fn get(&self, key: MachineKey) -> Option<&Machine> {
        self.entries.get(&key)
    }

    pub fn get_mut(&mut self, key: MachineKey) -> Option<&mut Machine> {
        self.entries.get_mut(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Machine> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
