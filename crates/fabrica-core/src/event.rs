//! Outbound events and snapshot view models.
//!
//! Every mutation a player cares about is answered with a typed event
//! pushed onto that player's outbound FIFO; the transport layer drains the
//! queue and serializes whatever it finds. View models carry plain ids and
//! amounts so the wire format never depends on engine internals.

use crate::catalog::{Catalog, MachineKind, ReceptPart};
use crate::deposit::Zone;
use crate::fixed::Fixed64;
use crate::id::{MachineKey, MachineTypeId, ReceptId, ResourceTypeId};
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------

/// Stable machine-readable codes for expected command failures. Rejected
/// commands mutate nothing; the code is the whole story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A build cost exceeds current stock.
    InsufficientResources,
    /// Building would exceed the size or weight budget.
    CapacityExceeded,
    /// Destroying or idling an entry whose count is already zero.
    MachineNotBuilt,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InsufficientResources => "insufficient_resources",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::MachineNotBuilt => "machine_not_built",
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot view models
// ---------------------------------------------------------------------------

/// One resource container, resolved for the wire.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResourceState {
    pub resource: ResourceTypeId,
    pub count: Fixed64,
    pub max_count: Fixed64,
}

/// One deposit, including derived yield and current slot claims.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DepositState {
    pub resource: ResourceTypeId,
    pub count: Fixed64,
    pub first_count: Fixed64,
    pub performance: Fixed64,
    pub begin_performance: Fixed64,
    pub slots: u32,
    pub used_slots: u32,
}

/// Periodic post-reconciliation state: resource levels, deposit levels,
/// and size/weight usage.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StateSnapshot {
    pub resources: Vec<ResourceState>,
    pub deposits: Vec<DepositState>,
    pub size_used: Fixed64,
    pub weight_used: Fixed64,
    pub size_max: Fixed64,
    pub weight_max: Fixed64,
}

/// A recept, resolved for the wire.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReceptView {
    pub id: ReceptId,
    pub name: String,
    pub inputs: Vec<ReceptPart>,
    pub outputs: Vec<ReceptPart>,
}

/// A machine type, resolved for the wire.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MachineTypeView {
    pub id: MachineTypeId,
    pub name: String,
    pub kind: MachineKind,
    pub available: Vec<ReceptId>,
    pub cost: Vec<(ResourceTypeId, Fixed64)>,
    pub size: Fixed64,
    pub weight: Fixed64,
}

/// One machine entry and its unit count.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MachineView {
    pub key: MachineKey,
    pub count: u32,
}

/// Everything a (re)joining client needs: catalog views plus current state.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JoinSnapshot {
    pub resources: Vec<ResourceState>,
    pub recepts: Vec<ReceptView>,
    pub machine_types: Vec<MachineTypeView>,
    pub machines: Vec<MachineView>,
    pub deposits: Vec<DepositState>,
}

/// Build the deposit views for a zone.
pub(crate) fn deposit_states(zone: &Zone) -> Vec<DepositState> {
    zone.deposits()
        .map(|d| DepositState {
            resource: d.resource(),
            count: d.count,
            first_count: d.first_count(),
            performance: d.performance(),
            begin_performance: d.begin_performance(),
            slots: d.slots(),
            used_slots: d.used_slots(),
        })
        .collect()
}

/// Build the catalog-side views shared by every join snapshot.
pub(crate) fn catalog_views(catalog: &Catalog) -> (Vec<ReceptView>, Vec<MachineTypeView>) {
    let recepts = catalog
        .recept_ids()
        .filter_map(|id| {
            catalog.recept(id).map(|def| ReceptView {
                id,
                name: def.name.clone(),
                inputs: def.inputs.clone(),
                outputs: def.outputs.clone(),
            })
        })
        .collect();
    let machine_types = catalog
        .machine_ids()
        .filter_map(|id| {
            catalog.machine(id).map(|def| MachineTypeView {
                id,
                name: def.name.clone(),
                kind: def.kind,
                available: def.available.clone(),
                cost: def.cost.clone(),
                size: def.size,
                weight: def.weight,
            })
        })
        .collect();
    (recepts, machine_types)
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A typed outbound event.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Event {
    /// One unit was added to the entry.
    MachineBuilt { key: MachineKey },
    /// One unit was removed from the entry.
    MachineDestroyed { key: MachineKey },
    /// One unit moved between recept entries of one machine type.
    MachineSwapped {
        machine_type: MachineTypeId,
        from: Option<ReceptId>,
        to: Option<ReceptId>,
    },
    /// An expected command failure; nothing was mutated.
    CommandRejected { code: ErrorCode },
    /// Periodic post-tick state.
    State(StateSnapshot),
}

/// Per-player outbound FIFO drained by the transport layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutboundQueue {
    events: VecDeque<Event>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push_back(event);
    }

    /// Drain all queued events in FIFO order.
    pub fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::MachineTypeId;

    fn built(n: u32) -> Event {
        Event::MachineBuilt {
            key: MachineKey::idle(MachineTypeId(n)),
        }
    }

    #[test]
    fn queue_drains_in_fifo_order() {
        let mut q = OutboundQueue::new();
        q.push(built(0));
        q.push(built(1));
        q.push(Event::CommandRejected {
            code: ErrorCode::MachineNotBuilt,
        });
        assert_eq!(q.len(), 3);

        let drained = q.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0], built(0));
        assert_eq!(drained[1], built(1));
        assert!(q.is_empty());
    }

    #[test]
    fn drain_on_empty_queue_is_empty() {
        let mut q = OutboundQueue::new();
        assert!(q.drain().is_empty());
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(ErrorCode::InsufficientResources.as_str(), "insufficient_resources");
        assert_eq!(ErrorCode::CapacityExceeded.as_str(), "capacity_exceeded");
        assert_eq!(ErrorCode::MachineNotBuilt.as_str(), "machine_not_built");
    }
}
