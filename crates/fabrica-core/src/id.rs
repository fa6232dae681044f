use serde::{Deserialize, Serialize};

/// Identifies a resource type in the catalog. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceTypeId(pub u32);

/// Identifies a recept (recipe) in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReceptId(pub u32);

/// Identifies a machine type in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MachineTypeId(pub u32);

/// Composite identity of a machine entry: the machine type plus the recept
/// it currently runs (`None` = idle).
///
/// A player holds at most one entry per key; changing a machine's recipe is
/// modeled as decrementing one entry and incrementing another, so entries
/// are never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MachineKey {
    pub machine_type: MachineTypeId,
    pub recept: Option<ReceptId>,
}

impl MachineKey {
    pub fn new(machine_type: MachineTypeId, recept: Option<ReceptId>) -> Self {
        Self {
            machine_type,
            recept,
        }
    }

    /// The idle entry for a machine type (no current recept).
    pub fn idle(machine_type: MachineTypeId) -> Self {
        Self {
            machine_type,
            recept: None,
        }
    }
}

/// Identifies a player within a game instance. Assigned by the transport
/// layer at join time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub String);

/// Index of a zone within a game instance. Players bind to one zone at
/// creation, permanently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_key_ordering_groups_by_type() {
        let a = MachineKey::idle(MachineTypeId(0));
        let b = MachineKey::new(MachineTypeId(0), Some(ReceptId(3)));
        let c = MachineKey::idle(MachineTypeId(1));
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ResourceTypeId(0), "iron_ore");
        map.insert(ResourceTypeId(1), "iron_plate");
        assert_eq!(map[&ResourceTypeId(0)], "iron_ore");
    }
}
