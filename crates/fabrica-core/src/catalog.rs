//! The immutable game catalog: resource types, recepts, and machine types.
//!
//! Built once at startup through [`CatalogBuilder`] and frozen by `build()`,
//! which validates every cross-reference. After that point lookups cannot
//! fail for well-formed ids, which is why the simulation treats a failed
//! lookup as a contract violation rather than a recoverable error.

use crate::fixed::Fixed64;
use crate::id::{MachineKey, MachineTypeId, ReceptId, ResourceTypeId};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Physical form of a resource. Selects whether goods of this form ride the
/// logistics fleet during reconciliation or move locally (see
/// [`ResourceFormat::is_mobile`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ResourceFormat {
    Particulate,
    Plate,
    Gas,
    Liquid,
    Heat,
    Energy,
    Radiance,
    Interference,
    /// Bare unit-count goods, e.g. the logistics drones themselves.
    Unit,
}

impl ResourceFormat {
    /// Whether goods of this format are carried by the logistics fleet
    /// between machines. Plates, heat, and energy move locally and are not
    /// counted against transport capacity.
    pub fn is_mobile(self) -> bool {
        matches!(self, Self::Particulate | Self::Liquid | Self::Unit)
    }
}

/// A resource type definition.
#[derive(Debug, Clone)]
pub struct ResourceTypeDef {
    pub name: String,
    pub format: ResourceFormat,
}

/// One side entry of a recept: a resource and its amount per full-power
/// unit per tick.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReceptPart {
    pub resource: ResourceTypeId,
    pub rate: Fixed64,
}

/// A recipe definition: what one full-power unit consumes and produces per
/// tick. Resource ids are unique within each side (validated at build).
#[derive(Debug, Clone)]
pub struct ReceptDef {
    pub name: String,
    pub inputs: Vec<ReceptPart>,
    pub outputs: Vec<ReceptPart>,
}

/// Selects the throttle path a machine type runs through each micro-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MachineKind {
    /// Extracts from a zone deposit; capped by deposit slots and scaled by
    /// deposit performance.
    Miner,
    /// Transforms ledger stock to ledger stock.
    Production,
}

/// A machine type definition.
#[derive(Debug, Clone)]
pub struct MachineTypeDef {
    pub name: String,
    pub kind: MachineKind,
    /// Recepts this machine type may run. The idle entry (`None`) always
    /// exists implicitly.
    pub available: Vec<ReceptId>,
    /// Build cost per unit.
    pub cost: Vec<(ResourceTypeId, Fixed64)>,
    pub size: Fixed64,
    pub weight: Fixed64,
}

/// What a freshly joined player starts with.
#[derive(Debug, Clone)]
pub struct StartProfile {
    /// Initial stock per resource.
    pub stock: Fixed64,
    /// Initial storage ceiling per resource.
    pub stock_max: Fixed64,
    /// Size and weight budgets for built machines.
    pub size_max: Fixed64,
    pub weight_max: Fixed64,
    /// A machine entry pre-built at count 1, typically the logistics core.
    pub machine: Option<MachineKey>,
}

impl Default for StartProfile {
    fn default() -> Self {
        Self {
            stock: Fixed64::from_num(0),
            stock_max: Fixed64::from_num(1000),
            size_max: Fixed64::from_num(10000),
            weight_max: Fixed64::from_num(10000),
            machine: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("recept '{recept}' references unknown resource {resource:?}")]
    UnknownResourceRef {
        recept: String,
        resource: ResourceTypeId,
    },
    #[error("recept '{recept}' lists resource {resource:?} twice on one side")]
    DuplicateReceptResource {
        recept: String,
        resource: ResourceTypeId,
    },
    #[error("machine type '{machine}' references unknown recept {recept:?}")]
    UnknownReceptRef { machine: String, recept: ReceptId },
    #[error("machine type '{machine}' cost references unknown resource {resource:?}")]
    UnknownCostRef {
        machine: String,
        resource: ResourceTypeId,
    },
    #[error("miner type '{machine}' recept '{recept}' must have exactly one output and no inputs")]
    MinerReceptShape { machine: String, recept: String },
    #[error("no logistics resource designated")]
    MissingLogistics,
    #[error("start profile references unknown machine entry {key:?}")]
    UnknownStartMachine { key: MachineKey },
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for constructing an immutable [`Catalog`].
/// Two-phase lifecycle: registration, then validating finalization.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    resources: Vec<ResourceTypeDef>,
    resource_name_to_id: HashMap<String, ResourceTypeId>,
    recepts: Vec<ReceptDef>,
    recept_name_to_id: HashMap<String, ReceptId>,
    machines: Vec<MachineTypeDef>,
    machine_name_to_id: HashMap<String, MachineTypeId>,
    logistics: Option<ResourceTypeId>,
    start: StartProfile,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource type. Returns its id.
    pub fn register_resource(&mut self, name: &str, format: ResourceFormat) -> ResourceTypeId {
        let id = ResourceTypeId(self.resources.len() as u32);
        self.resources.push(ResourceTypeDef {
            name: name.to_string(),
            format,
        });
        self.resource_name_to_id.insert(name.to_string(), id);
        id
    }

    /// Register a recept. Returns its id.
    pub fn register_recept(
        &mut self,
        name: &str,
        inputs: Vec<ReceptPart>,
        outputs: Vec<ReceptPart>,
    ) -> ReceptId {
        let id = ReceptId(self.recepts.len() as u32);
        self.recepts.push(ReceptDef {
            name: name.to_string(),
            inputs,
            outputs,
        });
        self.recept_name_to_id.insert(name.to_string(), id);
        id
    }

    /// Register a machine type. Returns its id.
    pub fn register_machine(
        &mut self,
        name: &str,
        kind: MachineKind,
        available: Vec<ReceptId>,
        cost: Vec<(ResourceTypeId, Fixed64)>,
        size: Fixed64,
        weight: Fixed64,
    ) -> MachineTypeId {
        let id = MachineTypeId(self.machines.len() as u32);
        self.machines.push(MachineTypeDef {
            name: name.to_string(),
            kind,
            available,
            cost,
            size,
            weight,
        });
        self.machine_name_to_id.insert(name.to_string(), id);
        id
    }

    /// Designate the logistics-capacity resource.
    pub fn set_logistics(&mut self, resource: ResourceTypeId) {
        self.logistics = Some(resource);
    }

    /// Set the start profile handed to every joining player.
    pub fn set_start_profile(&mut self, start: StartProfile) {
        self.start = start;
    }

    pub fn resource_id(&self, name: &str) -> Option<ResourceTypeId> {
        self.resource_name_to_id.get(name).copied()
    }

    pub fn recept_id(&self, name: &str) -> Option<ReceptId> {
        self.recept_name_to_id.get(name).copied()
    }

    pub fn machine_id(&self, name: &str) -> Option<MachineTypeId> {
        self.machine_name_to_id.get(name).copied()
    }

    /// Validate every cross-reference and freeze the catalog.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let resource_count = self.resources.len() as u32;

        for recept in &self.recepts {
            for side in [&recept.inputs, &recept.outputs] {
                let mut seen = Vec::with_capacity(side.len());
                for part in side {
                    if part.resource.0 >= resource_count {
                        return Err(CatalogError::UnknownResourceRef {
                            recept: recept.name.clone(),
                            resource: part.resource,
                        });
                    }
                    if seen.contains(&part.resource) {
                        return Err(CatalogError::DuplicateReceptResource {
                            recept: recept.name.clone(),
                            resource: part.resource,
                        });
                    }
                    seen.push(part.resource);
                }
            }
        }

        for machine in &self.machines {
            for recept_id in &machine.available {
                let Some(recept) = self.recepts.get(recept_id.0 as usize) else {
                    return Err(CatalogError::UnknownReceptRef {
                        machine: machine.name.clone(),
                        recept: *recept_id,
                    });
                };
                if machine.kind == MachineKind::Miner
                    && (recept.outputs.len() != 1 || !recept.inputs.is_empty())
                {
                    return Err(CatalogError::MinerReceptShape {
                        machine: machine.name.clone(),
                        recept: recept.name.clone(),
                    });
                }
            }
            for (resource, _) in &machine.cost {
                if resource.0 >= resource_count {
                    return Err(CatalogError::UnknownCostRef {
                        machine: machine.name.clone(),
                        resource: *resource,
                    });
                }
            }
        }

        let logistics = self.logistics.ok_or(CatalogError::MissingLogistics)?;
        if logistics.0 >= resource_count {
            return Err(CatalogError::UnknownResourceRef {
                recept: "<logistics>".to_string(),
                resource: logistics,
            });
        }

        if let Some(key) = self.start.machine {
            let valid = self
                .machines
                .get(key.machine_type.0 as usize)
                .is_some_and(|m| match key.recept {
                    None => true,
                    Some(r) => m.available.contains(&r),
                });
            if !valid {
                return Err(CatalogError::UnknownStartMachine { key });
            }
        }

        Ok(Catalog {
            resources: self.resources,
            resource_name_to_id: self.resource_name_to_id,
            recepts: self.recepts,
            recept_name_to_id: self.recept_name_to_id,
            machines: self.machines,
            machine_name_to_id: self.machine_name_to_id,
            logistics,
            start: self.start,
        })
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable catalog. Frozen after build(). Thread-safe to share.
#[derive(Debug)]
pub struct Catalog {
    resources: Vec<ResourceTypeDef>,
    resource_name_to_id: HashMap<String, ResourceTypeId>,
    recepts: Vec<ReceptDef>,
    recept_name_to_id: HashMap<String, ReceptId>,
    machines: Vec<MachineTypeDef>,
    machine_name_to_id: HashMap<String, MachineTypeId>,
    logistics: ResourceTypeId,
    start: StartProfile,
}

impl Catalog {
    pub fn resource(&self, id: ResourceTypeId) -> Option<&ResourceTypeDef> {
        self.resources.get(id.0 as usize)
    }

    pub fn recept(&self, id: ReceptId) -> Option<&ReceptDef> {
        self.recepts.get(id.0 as usize)
    }

    pub fn machine(&self, id: MachineTypeId) -> Option<&MachineTypeDef> {
        self.machines.get(id.0 as usize)
    }

    pub fn resource_id(&self, name: &str) -> Option<ResourceTypeId> {
        self.resource_name_to_id.get(name).copied()
    }

    pub fn recept_id(&self, name: &str) -> Option<ReceptId> {
        self.recept_name_to_id.get(name).copied()
    }

    pub fn machine_id(&self, name: &str) -> Option<MachineTypeId> {
        self.machine_name_to_id.get(name).copied()
    }

    /// All resource ids in registration order.
    pub fn resource_ids(&self) -> impl Iterator<Item = ResourceTypeId> + '_ {
        (0..self.resources.len() as u32).map(ResourceTypeId)
    }

    /// All recept ids in registration order.
    pub fn recept_ids(&self) -> impl Iterator<Item = ReceptId> + '_ {
        (0..self.recepts.len() as u32).map(ReceptId)
    }

    /// All machine type ids in registration order.
    pub fn machine_ids(&self) -> impl Iterator<Item = MachineTypeId> + '_ {
        (0..self.machines.len() as u32).map(MachineTypeId)
    }

    /// The resource whose stock caps total mobile throughput per tick.
    pub fn logistics(&self) -> ResourceTypeId {
        self.logistics
    }

    pub fn start_profile(&self) -> &StartProfile {
        &self.start
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn recept_count(&self) -> usize {
        self.recepts.len()
    }

    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
