//! Serde structs for the on-disk game pack format.
//!
//! A pack is one RON document naming resources, recepts, machine types, the
//! logistics resource, the start profile, and the world's zones. Everything
//! cross-references by name; the loader resolves names to ids and hands the
//! result to the catalog builder for validation.

use fabrica_core::catalog::{MachineKind, ResourceFormat};
use serde::Deserialize;

/// The top-level pack document.
#[derive(Debug, Clone, Deserialize)]
pub struct PackData {
    pub resources: Vec<ResourceData>,
    pub recepts: Vec<ReceptData>,
    pub machines: Vec<MachineData>,
    /// Name of the resource whose stock caps transported flow per tick.
    pub logistics: String,
    #[serde(default)]
    pub start: StartData,
    pub zones: Vec<ZoneData>,
}

/// A resource type definition.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceData {
    pub name: String,
    pub format: ResourceFormat,
}

/// A recept definition. Rates are per tick for one machine unit.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceptData {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<(String, f64)>,
    pub outputs: Vec<(String, f64)>,
}

/// A machine type definition.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineData {
    pub name: String,
    pub kind: MachineKind,
    /// Names of the recepts this type may run.
    pub recepts: Vec<String>,
    #[serde(default)]
    pub cost: Vec<(String, f64)>,
    pub size: f64,
    pub weight: f64,
}

/// What a joining player starts with.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StartData {
    pub stock: f64,
    pub stock_max: f64,
    pub size_max: f64,
    pub weight_max: f64,
    pub machine: Option<StartMachineData>,
}

impl Default for StartData {
    fn default() -> Self {
        Self {
            stock: 0.0,
            stock_max: 1000.0,
            size_max: 10000.0,
            weight_max: 10000.0,
            machine: None,
        }
    }
}

/// A machine entry pre-built at count 1 for every new player.
#[derive(Debug, Clone, Deserialize)]
pub struct StartMachineData {
    pub machine: String,
    #[serde(default)]
    pub recept: Option<String>,
}

/// A zone and its deposits.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneData {
    pub deposits: Vec<DepositData>,
}

/// A depletable deposit.
#[derive(Debug, Clone, Deserialize)]
pub struct DepositData {
    pub resource: String,
    pub count: f64,
    pub begin_performance: f64,
    pub slots: u32,
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_pack_parses() {
        let pack: PackData = ron::from_str(
            r#"(
                resources: [
                    (name: "iron_ore", format: Particulate),
                    (name: "drone", format: Unit),
                ],
                recepts: [
                    (name: "mine_iron_ore", outputs: [("iron_ore", 1.0)]),
                ],
                machines: [
                    (name: "miner", kind: Miner, recepts: ["mine_iron_ore"], size: 1.0, weight: 1.0),
                ],
                logistics: "drone",
                zones: [
                    (deposits: [
                        (resource: "iron_ore", count: 10000.0, begin_performance: 0.7, slots: 3),
                    ]),
                ],
            )"#,
        )
        .unwrap();

        assert_eq!(pack.resources.len(), 2);
        assert!(pack.recepts[0].inputs.is_empty());
        assert!(pack.machines[0].cost.is_empty());
        // Defaulted start profile.
        assert_eq!(pack.start.stock, 0.0);
        assert!(pack.start.machine.is_none());
    }

    #[test]
    fn start_profile_parses() {
        let start: StartData = ron::from_str(
            r#"(
                stock: 300.0,
                stock_max: 5000.0,
                machine: Some((machine: "core", recept: Some("unpack_supplies"))),
            )"#,
        )
        .unwrap();
        assert_eq!(start.stock, 300.0);
        // Unspecified fields keep their defaults.
        assert_eq!(start.size_max, 10000.0);
        assert_eq!(start.machine.unwrap().recept.as_deref(), Some("unpack_supplies"));
    }
}
