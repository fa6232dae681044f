//! One game world: a shared catalog, its zones, and every joined player.
//!
//! The instance is a plain synchronous state machine. Whoever owns it (a
//! scheduler task, a test) calls [`GameInstance::advance_tick`] at whatever
//! cadence it likes; determinism comes from the fixed iteration orders
//! inside, not from timing.

use crate::catalog::Catalog;
use crate::command::Command;
use crate::deposit::Zone;
use crate::error::ContractViolation;
use crate::event::{Event, JoinSnapshot};
use crate::fixed::Ticks;
use crate::id::{PlayerId, ZoneId};
use crate::player::Player;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A running game world.
#[derive(Debug)]
pub struct GameInstance {
    catalog: Arc<Catalog>,
    zones: Vec<Zone>,
    players: BTreeMap<PlayerId, Player>,
    tick: Ticks,
}

impl GameInstance {
    pub fn new(catalog: Arc<Catalog>, zones: Vec<Zone>) -> Self {
        Self {
            catalog,
            zones,
            players: BTreeMap::new(),
            tick: 0,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn tick(&self) -> Ticks {
        self.tick
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Join a player, or rejoin an existing one. Either way the caller gets
    /// the full join snapshot for the player's current state.
    pub fn add_player(&mut self, id: PlayerId) -> Result<JoinSnapshot, ContractViolation> {
        if self.zones.is_empty() {
            return Err(ContractViolation::MissingZone(ZoneId(0)));
        }
        if !self.players.contains_key(&id) {
            // TODO: spread players across zones once worlds carry more than
            // one; every player binds to zone 0 for now.
            let player = Player::new(&self.catalog, id.clone(), ZoneId(0));
            self.players.insert(id.clone(), player);
        }
        self.join_snapshot(&id)
    }

    /// Queue a command for a player; it applies at the next tick boundary.
    pub fn submit(&mut self, id: &PlayerId, command: Command) -> Result<(), ContractViolation> {
        self.players
            .get_mut(id)
            .ok_or_else(|| ContractViolation::UnknownPlayer(id.clone()))?
            .enqueue(command);
        Ok(())
    }

    /// Run one tick: apply every player's queued commands, then run every
    /// player's turn against their bound zone. Players are visited in id
    /// order both times.
    pub fn advance_tick(&mut self) -> Result<(), ContractViolation> {
        let Self {
            catalog,
            zones,
            players,
            tick,
        } = self;
        for player in players.values_mut() {
            player.apply_pending(catalog)?;
        }
        for player in players.values_mut() {
            let zone_id = player.zone();
            let zone = zones
                .get_mut(zone_id.0 as usize)
                .ok_or(ContractViolation::MissingZone(zone_id))?;
            player.turn(catalog, zone)?;
        }
        *tick += 1;
        Ok(())
    }

    /// Drain a player's outbound events.
    pub fn drain_events(&mut self, id: &PlayerId) -> Result<Vec<Event>, ContractViolation> {
        Ok(self
            .players
            .get_mut(id)
            .ok_or_else(|| ContractViolation::UnknownPlayer(id.clone()))?
            .drain_events())
    }

    /// Full snapshot for a (re)joining client.
    pub fn join_snapshot(&self, id: &PlayerId) -> Result<JoinSnapshot, ContractViolation> {
        let player = self
            .players
            .get(id)
            .ok_or_else(|| ContractViolation::UnknownPlayer(id.clone()))?;
        let zone = self
            .zones
            .get(player.zone().0 as usize)
            .ok_or(ContractViolation::MissingZone(player.zone()))?;
        Ok(player.join_snapshot(&self.catalog, zone))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
