//! Player commands submitted by the transport layer.
//!
//! Commands are queued per player and applied at tick boundaries under the
//! instance lock, so no command ever observes or interleaves with a
//! half-completed tick.

use crate::fixed::Fixed64;
use crate::id::{MachineTypeId, ReceptId, ResourceTypeId};

/// A single player command.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Command {
    /// Build one unit of the given entry, paying the type's cost.
    BuildMachine {
        machine_type: MachineTypeId,
        recept: Option<ReceptId>,
    },
    /// Tear down one unit of the given entry. The cost is not refunded.
    DestroyMachine {
        machine_type: MachineTypeId,
        recept: Option<ReceptId>,
    },
    /// Move one unit from the recept entry to the idle entry.
    IdleMachine {
        machine_type: MachineTypeId,
        recept: ReceptId,
    },
    /// Move one unit from the idle entry to the recept entry.
    ComeToWorkMachine {
        machine_type: MachineTypeId,
        recept: ReceptId,
    },
    /// Set the storage ceiling for one resource.
    SetResourceCeiling {
        resource: ResourceTypeId,
        max: Fixed64,
    },
}
