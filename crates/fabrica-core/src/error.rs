use crate::id::{MachineKey, MachineTypeId, PlayerId, ReceptId, ResourceTypeId, ZoneId};

/// Unrecoverable defects: catalog and player state must be mutually
/// consistent by construction, so a failed id lookup means corrupted state
/// rather than bad input. Callers abort the affected instance instead of
/// continuing with partial state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    #[error("unknown resource type {0:?}")]
    UnknownResource(ResourceTypeId),
    #[error("unknown recept {0:?}")]
    UnknownRecept(ReceptId),
    #[error("unknown machine type {0:?}")]
    UnknownMachineType(MachineTypeId),
    #[error("no machine entry for {0:?}")]
    UnknownMachineEntry(MachineKey),
    #[error("zone {0:?} does not exist")]
    MissingZone(ZoneId),
    #[error("unknown player {0:?}")]
    UnknownPlayer(PlayerId),
}
