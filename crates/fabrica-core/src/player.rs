//! A player aggregate and the two-phase turn orchestrator.
//!
//! `turn()` is the per-player tick: Phase A settles all machines against a
//! transient ledger over [`STEPS_PER_TICK`] micro-steps, Phase B reconciles
//! the net flow into persistent storage through the shared logistics
//! throttle and emits a state snapshot. The computation never fails for
//! well-formed state: scarcity degrades flow to zero instead of erroring.

use crate::catalog::{Catalog, MachineKind, MachineTypeDef};
use crate::command::Command;
use crate::deposit::Zone;
use crate::error::ContractViolation;
use crate::event::{
    self, ErrorCode, Event, JoinSnapshot, MachineView, OutboundQueue, ResourceState, StateSnapshot,
};
use crate::fixed::Fixed64;
use crate::flow::{self, STEPS_PER_TICK};
use crate::id::{MachineKey, MachineTypeId, PlayerId, ReceptId, ZoneId};
use crate::ledger::Ledger;
use crate::machine::MachineBook;

/// One player: resource ledger, machine book, zone binding, and the
/// outbound event queue.
#[derive(Debug)]
pub struct Player {
    id: PlayerId,
    zone: ZoneId,
    ledger: Ledger,
    machines: MachineBook,
    size_used: Fixed64,
    weight_used: Fixed64,
    size_max: Fixed64,
    weight_max: Fixed64,
    outbound: OutboundQueue,
    pending: Vec<Command>,
}

impl Player {
    /// Create a player seeded from the catalog's start profile, bound to
    /// `zone` permanently.
    pub fn new(catalog: &Catalog, id: PlayerId, zone: ZoneId) -> Self {
        let start = catalog.start_profile();
        let mut machines = MachineBook::seeded(catalog);
        if let Some(key) = start.machine
            && let Some(entry) = machines.get_mut(key)
        {
            entry.count = 1;
        }
        Self {
            id,
            zone,
            ledger: Ledger::seeded(catalog, start.stock, start.stock_max),
            machines,
            size_used: Fixed64::from_num(0),
            weight_used: Fixed64::from_num(0),
            size_max: start.size_max,
            weight_max: start.weight_max,
            outbound: OutboundQueue::new(),
            pending: Vec::new(),
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn zone(&self) -> ZoneId {
        self.zone
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn machines(&self) -> &MachineBook {
        &self.machines
    }

    /// Queue a command for the next tick boundary.
    pub fn enqueue(&mut self, command: Command) {
        self.pending.push(command);
    }

    /// Drain the outbound event FIFO.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.outbound.drain()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Apply all queued commands in submission order.
    pub fn apply_pending(&mut self, catalog: &Catalog) -> Result<(), ContractViolation> {
        let pending: Vec<Command> = self.pending.drain(..).collect();
        for command in pending {
            self.apply(catalog, command)?;
        }
        Ok(())
    }

    /// Apply one command. Expected failures emit a [`Event::CommandRejected`]
    /// and mutate nothing; unknown ids are contract violations.
    pub fn apply(&mut self, catalog: &Catalog, command: Command) -> Result<(), ContractViolation> {
        match command {
            Command::BuildMachine {
                machine_type,
                recept,
            } => self.build_machine(catalog, machine_type, recept),
            Command::DestroyMachine {
                machine_type,
                recept,
            } => self.destroy_machine(catalog, machine_type, recept),
            Command::IdleMachine {
                machine_type,
                recept,
            } => self.swap_machine(machine_type, Some(recept), None),
            Command::ComeToWorkMachine {
                machine_type,
                recept,
            } => self.swap_machine(machine_type, None, Some(recept)),
            Command::SetResourceCeiling { resource, max } => {
                self.ledger
                    .get_mut(resource)
                    .ok_or(ContractViolation::UnknownResource(resource))?
                    .max_count = max;
                Ok(())
            }
        }
    }

    fn reject(&mut self, code: ErrorCode) {
        self.outbound.push(Event::CommandRejected { code });
    }

    fn machine_def<'c>(
        &self,
        catalog: &'c Catalog,
        machine_type: MachineTypeId,
    ) -> Result<&'c MachineTypeDef, ContractViolation> {
        catalog
            .machine(machine_type)
            .ok_or(ContractViolation::UnknownMachineType(machine_type))
    }

    fn build_machine(
        &mut self,
        catalog: &Catalog,
        machine_type: MachineTypeId,
        recept: Option<ReceptId>,
    ) -> Result<(), ContractViolation> {
        let key = MachineKey::new(machine_type, recept);
        if self.machines.get(key).is_none() {
            return Err(ContractViolation::UnknownMachineEntry(key));
        }
        let def = self.machine_def(catalog, machine_type)?;

        for (resource, amount) in &def.cost {
            let stock = self
                .ledger
                .get(*resource)
                .ok_or(ContractViolation::UnknownResource(*resource))?
                .count;
            if stock < *amount {
                self.reject(ErrorCode::InsufficientResources);
                return Ok(());
            }
        }
        if self.size_used + def.size > self.size_max
            || self.weight_used + def.weight > self.weight_max
        {
            self.reject(ErrorCode::CapacityExceeded);
            return Ok(());
        }

        let (size, weight, cost) = (def.size, def.weight, def.cost.clone());
        for (resource, amount) in cost {
            self.ledger
                .get_mut(resource)
                .ok_or(ContractViolation::UnknownResource(resource))?
                .count -= amount;
        }
        self.size_used += size;
        self.weight_used += weight;
        self.machines
            .get_mut(key)
            .ok_or(ContractViolation::UnknownMachineEntry(key))?
            .count += 1;
        self.outbound.push(Event::MachineBuilt { key });
        Ok(())
    }

    fn destroy_machine(
        &mut self,
        catalog: &Catalog,
        machine_type: MachineTypeId,
        recept: Option<ReceptId>,
    ) -> Result<(), ContractViolation> {
        let key = MachineKey::new(machine_type, recept);
        let def = self.machine_def(catalog, machine_type)?;
        let (size, weight) = (def.size, def.weight);
        let entry = self
            .machines
            .get_mut(key)
            .ok_or(ContractViolation::UnknownMachineEntry(key))?;
        if entry.count == 0 {
            self.reject(ErrorCode::MachineNotBuilt);
            return Ok(());
        }
        entry.count -= 1;
        self.size_used -= size;
        self.weight_used -= weight;
        self.outbound.push(Event::MachineDestroyed { key });
        Ok(())
    }

    /// The decrement-one/increment-other recipe swap. Entries stay
    /// near-immutable: only counts move.
    fn swap_machine(
        &mut self,
        machine_type: MachineTypeId,
        from: Option<ReceptId>,
        to: Option<ReceptId>,
    ) -> Result<(), ContractViolation> {
        let from_key = MachineKey::new(machine_type, from);
        let to_key = MachineKey::new(machine_type, to);
        // Both entries must exist before anything moves.
        if self.machines.get(to_key).is_none() {
            return Err(ContractViolation::UnknownMachineEntry(to_key));
        }
        let source = self
            .machines
            .get_mut(from_key)
            .ok_or(ContractViolation::UnknownMachineEntry(from_key))?;
        if source.count == 0 {
            self.reject(ErrorCode::MachineNotBuilt);
            return Ok(());
        }
        source.count -= 1;
        self.machines
            .get_mut(to_key)
            .ok_or(ContractViolation::UnknownMachineEntry(to_key))?
            .count += 1;
        self.outbound.push(Event::MachineSwapped {
            machine_type,
            from,
            to,
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Turn
    // -----------------------------------------------------------------------

    /// Run one tick for this player against its bound zone.
    pub fn turn(&mut self, catalog: &Catalog, zone: &mut Zone) -> Result<(), ContractViolation> {
        // Phase A: settle all machines against a transient ledger.
        let mut transient = self.ledger.transient();
        zone.reset_slots();
        for _ in 0..STEPS_PER_TICK {
            for machine in self.machines.iter() {
                let def = catalog
                    .machine(machine.key.machine_type)
                    .ok_or(ContractViolation::UnknownMachineType(machine.key.machine_type))?;
                match def.kind {
                    MachineKind::Miner => {
                        flow::miner_step(machine, catalog, &mut transient, zone)?;
                    }
                    MachineKind::Production => {
                        flow::production_step(machine, catalog, &mut transient)?;
                    }
                }
            }
        }

        // Phase B: clamp total mobile flow by logistics capacity, then fold
        // every transient delta into persistent stock at one shared factor.
        let zero = Fixed64::from_num(0);
        let mut sum = zero;
        for (id, container) in transient.iter() {
            let def = catalog
                .resource(id)
                .ok_or(ContractViolation::UnknownResource(id))?;
            if def.format.is_mobile() {
                sum += container.count;
            }
        }
        let logistics = catalog.logistics();
        let drones = self
            .ledger
            .get(logistics)
            .ok_or(ContractViolation::UnknownResource(logistics))?
            .count;
        let factor = flow::reconciliation_factor(drones, sum);
        for (id, container) in transient.iter() {
            self.ledger
                .get_mut(id)
                .ok_or(ContractViolation::UnknownResource(id))?
                .count += container.count * factor;
        }

        let snapshot = self.state_snapshot(zone);
        self.outbound.push(Event::State(snapshot));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    fn resource_states(&self) -> Vec<ResourceState> {
        self.ledger
            .iter()
            .map(|(resource, c)| ResourceState {
                resource,
                count: c.count,
                max_count: c.max_count,
            })
            .collect()
    }

    /// The periodic post-reconciliation snapshot.
    pub fn state_snapshot(&self, zone: &Zone) -> StateSnapshot {
        StateSnapshot {
            resources: self.resource_states(),
            deposits: event::deposit_states(zone),
            size_used: self.size_used,
            weight_used: self.weight_used,
            size_max: self.size_max,
            weight_max: self.weight_max,
        }
    }

    /// The full on-demand snapshot for a (re)joining client.
    pub fn join_snapshot(&self, catalog: &Catalog, zone: &Zone) -> JoinSnapshot {
        let (recepts, machine_types) = event::catalog_views(catalog);
        JoinSnapshot {
            resources: self.resource_states(),
            recepts,
            machine_types,
            machines: self
                .machines
                .iter()
                .map(|m| MachineView {
                    key: m.key,
                    count: m.count,
                })
                .collect(),
            deposits: event::deposit_states(zone),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
