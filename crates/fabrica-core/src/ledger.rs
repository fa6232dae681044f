//! Per-player resource accounting.
//!
//! A [`Ledger`] holds one [`ResourceContainer`] per catalog resource. During
//! a tick the orchestrator derives a *transient* ledger from it: zero stock,
//! ceiling equal to the pre-tick spare capacity. The settlement loop runs
//! entirely against the transient ledger, and reconciliation folds the net
//! flow back into the persistent one.

use crate::catalog::Catalog;
use crate::fixed::Fixed64;
use crate::id::ResourceTypeId;
use std::collections::BTreeMap;

/// A per-resource stock with a storage ceiling.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResourceContainer {
    pub resource: ResourceTypeId,
    pub count: Fixed64,
    pub max_count: Fixed64,
}

impl ResourceContainer {
    pub fn new(resource: ResourceTypeId, count: Fixed64, max_count: Fixed64) -> Self {
        Self {
            resource,
            count,
            max_count,
        }
    }

    /// Remaining storage headroom. Negative when the ceiling was lowered
    /// below current stock; throttle math clamps that to zero flow.
    pub fn headroom(&self) -> Fixed64 {
        self.max_count - self.count
    }

    /// At or over the ceiling. A full container hard-stalls every machine
    /// configured to output into it.
    pub fn is_full(&self) -> bool {
        self.count >= self.max_count
    }
}

/// A player's resource book: one container per catalog resource, in
/// deterministic id order.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    containers: BTreeMap<ResourceTypeId, ResourceContainer>,
}

impl Ledger {
    /// One container per catalog resource, each with the given stock and
    /// ceiling.
    pub fn seeded(catalog: &Catalog, count: Fixed64, max_count: Fixed64) -> Self {
        let containers = catalog
            .resource_ids()
            .map(|id| (id, ResourceContainer::new(id, count, max_count)))
            .collect();
        Self { containers }
    }

    pub fn get(&self, id: ResourceTypeId) -> Option<&ResourceContainer> {
        self.containers.get(&id)
    }

    pub fn get_mut(&mut self, id: ResourceTypeId) -> Option<&mut ResourceContainer> {
        self.containers.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceTypeId, &ResourceContainer)> {
        self.containers.iter().map(|(id, c)| (*id, c))
    }

    /// The Phase A settlement ledger: zero stock, ceiling initialized to
    /// this ledger's pre-tick spare capacity. It tracks net flow bounded by
    /// headroom, not absolute stock.
    pub fn transient(&self) -> Ledger {
        let containers = self
            .containers
            .iter()
            .map(|(id, c)| {
                (
                    *id,
                    ResourceContainer::new(*id, Fixed64::from_num(0), c.headroom()),
                )
            })
            .collect();
        Self { containers }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogBuilder, ResourceFormat};

    fn two_resource_catalog() -> Catalog {
        let mut b = CatalogBuilder::new();
        b.register_resource("iron_ore", ResourceFormat::Particulate);
        let drone = b.register_resource("drone", ResourceFormat::Unit);
        b.set_logistics(drone);
        b.build().unwrap()
    }

    #[test]
    fn seeded_covers_every_resource() {
        let catalog = two_resource_catalog();
        let ledger = Ledger::seeded(&catalog, Fixed64::from_num(300), Fixed64::from_num(5000));
        assert_eq!(ledger.iter().count(), 2);
        let ore = ledger.get(ResourceTypeId(0)).unwrap();
        assert_eq!(ore.count, Fixed64::from_num(300));
        assert_eq!(ore.max_count, Fixed64::from_num(5000));
    }

    #[test]
    fn headroom_and_full() {
        let c = ResourceContainer::new(
            ResourceTypeId(0),
            Fixed64::from_num(4),
            Fixed64::from_num(10),
        );
        assert_eq!(c.headroom(), Fixed64::from_num(6));
        assert!(!c.is_full());

        let full = ResourceContainer::new(
            ResourceTypeId(0),
            Fixed64::from_num(10),
            Fixed64::from_num(10),
        );
        assert!(full.is_full());
    }

    #[test]
    fn lowered_ceiling_gives_negative_headroom() {
        let c = ResourceContainer::new(
            ResourceTypeId(0),
            Fixed64::from_num(12),
            Fixed64::from_num(10),
        );
        assert!(c.headroom() < Fixed64::from_num(0));
        assert!(c.is_full());
    }

    #[test]
    fn transient_tracks_spare_capacity() {
        let catalog = two_resource_catalog();
        let mut ledger = Ledger::seeded(&catalog, Fixed64::from_num(300), Fixed64::from_num(5000));
        ledger.get_mut(ResourceTypeId(0)).unwrap().count = Fixed64::from_num(4800);

        let transient = ledger.transient();
        let ore = transient.get(ResourceTypeId(0)).unwrap();
        assert_eq!(ore.count, Fixed64::from_num(0));
        assert_eq!(ore.max_count, Fixed64::from_num(200));

        let drone = transient.get(ResourceTypeId(1)).unwrap();
        assert_eq!(drone.max_count, Fixed64::from_num(4700));
    }
}
