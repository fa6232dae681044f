//! Resolution pipeline: parse a pack document, resolve name references,
//! build the catalog and zones.

use crate::schema::{PackData, StartMachineData};
use fabrica_core::catalog::{Catalog, CatalogBuilder, CatalogError, ReceptPart, StartProfile};
use fabrica_core::deposit::{Deposit, Zone};
use fabrica_core::fixed::f64_to_fixed64;
use fabrica_core::id::MachineKey;
use std::path::Path;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading a game pack.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The document is not valid RON for the pack schema.
    #[error("parse error: {detail}")]
    Parse { detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}'")]
    UnresolvedRef {
        name: String,
        expected_kind: &'static str,
    },

    /// The resolved definitions failed catalog validation.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Loading
// ===========================================================================

/// A fully resolved game pack: the immutable catalog plus the world's
/// initial zones.
#[derive(Debug)]
pub struct GamePack {
    pub catalog: Catalog,
    pub zones: Vec<Zone>,
}

/// Load a pack from a RON document.
pub fn load_str(content: &str) -> Result<GamePack, DataLoadError> {
    let data: PackData = ron::from_str(content).map_err(|e| DataLoadError::Parse {
        detail: e.to_string(),
    })?;
    resolve(data)
}

/// Load a pack from a RON file on disk.
pub fn load_path(path: &Path) -> Result<GamePack, DataLoadError> {
    load_str(&std::fs::read_to_string(path)?)
}

fn resolve(data: PackData) -> Result<GamePack, DataLoadError> {
    let mut builder = CatalogBuilder::new();

    for resource in &data.resources {
        builder.register_resource(&resource.name, resource.format);
    }
    for recept in &data.recepts {
        let inputs = resolve_parts(&builder, &recept.inputs)?;
        let outputs = resolve_parts(&builder, &recept.outputs)?;
        builder.register_recept(&recept.name, inputs, outputs);
    }
    for machine in &data.machines {
        let recepts = machine
            .recepts
            .iter()
            .map(|name| resolve_recept(&builder, name))
            .collect::<Result<Vec<_>, _>>()?;
        let cost = machine
            .cost
            .iter()
            .map(|(name, amount)| Ok((resolve_resource(&builder, name)?, f64_to_fixed64(*amount))))
            .collect::<Result<Vec<_>, DataLoadError>>()?;
        builder.register_machine(
            &machine.name,
            machine.kind,
            recepts,
            cost,
            f64_to_fixed64(machine.size),
            f64_to_fixed64(machine.weight),
        );
    }

    let logistics = resolve_resource(&builder, &data.logistics)?;
    builder.set_logistics(logistics);
    builder.set_start_profile(StartProfile {
        stock: f64_to_fixed64(data.start.stock),
        stock_max: f64_to_fixed64(data.start.stock_max),
        size_max: f64_to_fixed64(data.start.size_max),
        weight_max: f64_to_fixed64(data.start.weight_max),
        machine: data
            .start
            .machine
            .as_ref()
            .map(|m| resolve_start_machine(&builder, m))
            .transpose()?,
    });

    let zones = data
        .zones
        .iter()
        .map(|zone| {
            let deposits = zone
                .deposits
                .iter()
                .map(|d| {
                    Ok(Deposit::new(
                        resolve_resource(&builder, &d.resource)?,
                        f64_to_fixed64(d.count),
                        f64_to_fixed64(d.begin_performance),
                        d.slots,
                    ))
                })
                .collect::<Result<Vec<_>, DataLoadError>>()?;
            Ok(Zone::new(deposits))
        })
        .collect::<Result<Vec<_>, DataLoadError>>()?;

    let catalog = builder.build()?;
    Ok(GamePack { catalog, zones })
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

fn resolve_resource(
    builder: &CatalogBuilder,
    name: &str,
) -> Result<fabrica_core::id::ResourceTypeId, DataLoadError> {
    builder
        .resource_id(name)
        .ok_or_else(|| DataLoadError::UnresolvedRef {
            name: name.to_string(),
            expected_kind: "resource",
        })
}

fn resolve_recept(
    builder: &CatalogBuilder,
    name: &str,
) -> Result<fabrica_core::id::ReceptId, DataLoadError> {
    builder
        .recept_id(name)
        .ok_or_else(|| DataLoadError::UnresolvedRef {
            name: name.to_string(),
            expected_kind: "recept",
        })
}

fn resolve_parts(
    builder: &CatalogBuilder,
    parts: &[(String, f64)],
) -> Result<Vec<ReceptPart>, DataLoadError> {
    parts
        .iter()
        .map(|(name, rate)| {
            Ok(ReceptPart {
                resource: resolve_resource(builder, name)?,
                rate: f64_to_fixed64(*rate),
            })
        })
        .collect()
}

fn resolve_start_machine(
    builder: &CatalogBuilder,
    data: &StartMachineData,
) -> Result<MachineKey, DataLoadError> {
    let machine_type =
        builder
            .machine_id(&data.machine)
            .ok_or_else(|| DataLoadError::UnresolvedRef {
                name: data.machine.clone(),
                expected_kind: "machine",
            })?;
    let recept = data
        .recept
        .as_deref()
        .map(|name| resolve_recept(builder, name))
        .transpose()?;
    Ok(MachineKey::new(machine_type, recept))
}

// ===========================================================================
// Tests
// ===========================================================================
