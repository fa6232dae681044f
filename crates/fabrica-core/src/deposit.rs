//! Depletable extraction nodes and the zones that own them.

use crate::fixed::Fixed64;
use crate::id::ResourceTypeId;
use std::collections::BTreeMap;

/// A depletable, slot-limited extraction source for one resource type.
///
/// Yield degrades linearly with depletion and never recovers. Slot claims
/// are per-tick scratch state: reset to zero at the start of every tick,
/// then overwritten by miner steps during settlement.
#[derive(Debug, Clone, PartialEq)]
pub struct Deposit {
    resource: ResourceTypeId,
    /// Remaining extractable stock. Mutated by miner steps.
    pub count: Fixed64,
    first_count: Fixed64,
    begin_performance: Fixed64,
    slots: u32,
    used_slots: u32,
}

impl Deposit {
    pub fn new(
        resource: ResourceTypeId,
        count: Fixed64,
        begin_performance: Fixed64,
        slots: u32,
    ) -> Self {
        Self {
            resource,
            count,
            first_count: count,
            begin_performance,
            slots,
            used_slots: 0,
        }
    }

    pub fn resource(&self) -> ResourceTypeId {
        self.resource
    }

    pub fn first_count(&self) -> Fixed64 {
        self.first_count
    }

    pub fn begin_performance(&self) -> Fixed64 {
        self.begin_performance
    }

    pub fn slots(&self) -> u32 {
        self.slots
    }

    pub fn used_slots(&self) -> u32 {
        self.used_slots
    }

    pub fn free_slots(&self) -> u32 {
        self.slots - self.used_slots
    }

    /// Current yield multiplier: `count / first_count × begin_performance`,
    /// floored at 10% of the base yield.
    pub fn performance(&self) -> Fixed64 {
        let floor = self.begin_performance / Fixed64::from_num(10);
        if self.first_count <= Fixed64::from_num(0) {
            return floor;
        }
        let scaled = self.count / self.first_count * self.begin_performance;
        scaled.max(floor)
    }

    /// Overwrite the slot claim for this tick, capped at capacity. Multiple
    /// machine entries targeting one deposit overwrite rather than
    /// accumulate; the last writer wins.
    pub(crate) fn claim_slots(&mut self, units: u32) {
        self.used_slots = units.min(self.slots);
    }

    pub(crate) fn reset_slots(&mut self) {
        self.used_slots = 0;
    }
}

/// A zone: the set of deposits a bound player's miners can reach.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Zone {
    deposits: BTreeMap<ResourceTypeId, Deposit>,
}

impl Zone {
    pub fn new(deposits: impl IntoIterator<Item = Deposit>) -> Self {
        Self {
            deposits: deposits.into_iter().map(|d| (d.resource(), d)).collect(),
        }
    }

    pub fn deposit(&self, resource: ResourceTypeId) -> Option<&Deposit> {
        self.deposits.get(&resource)
    }

    pub fn deposit_mut(&mut self, resource: ResourceTypeId) -> Option<&mut Deposit> {
        self.deposits.get_mut(&resource)
    }

    pub fn deposits(&self) -> impl Iterator<Item = &Deposit> {
        self.deposits.values()
    }

    /// Start-of-tick reset of all per-tick slot claims.
    pub fn reset_slots(&mut self) {
        for deposit in self.deposits.values_mut() {
            deposit.reset_slots();
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
