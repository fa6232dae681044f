//! The instance registry and its per-instance tick tasks.

use fabrica_core::command::Command;
use fabrica_core::error::ContractViolation;
use fabrica_core::event::{Event, JoinSnapshot};
use fabrica_core::fixed::Ticks;
use fabrica_core::id::PlayerId;
use fabrica_core::instance::GameInstance;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

// ===========================================================================
// Configuration
// ===========================================================================

/// Runtime tuning knobs.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Wall-clock duration of one simulation tick.
    pub tick_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
        }
    }
}

/// Registry key for one hosted instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceId(pub String);

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry-level errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("instance '{0}' is already registered")]
    DuplicateInstance(InstanceId),
    #[error("instance '{0}' is not registered")]
    UnknownInstance(InstanceId),
}

// ===========================================================================
// Handles
// ===========================================================================

/// A clonable reference to one hosted instance. Every operation takes the
/// instance lock, so callers always see tick-boundary state.
#[derive(Debug, Clone)]
pub struct InstanceHandle {
    shared: Arc<Mutex<GameInstance>>,
}

impl InstanceHandle {
    /// Join (or rejoin) a player and get the full snapshot.
    pub async fn join(&self, player: PlayerId) -> Result<JoinSnapshot, ContractViolation> {
        self.shared.lock().await.add_player(player)
    }

    /// Queue a command; it applies at the next tick boundary.
    pub async fn submit(
        &self,
        player: &PlayerId,
        command: Command,
    ) -> Result<(), ContractViolation> {
        self.shared.lock().await.submit(player, command)
    }

    /// Drain a player's outbound events.
    pub async fn drain_events(&self, player: &PlayerId) -> Result<Vec<Event>, ContractViolation> {
        self.shared.lock().await.drain_events(player)
    }

    /// Full snapshot of a player's current state.
    pub async fn snapshot(&self, player: &PlayerId) -> Result<JoinSnapshot, ContractViolation> {
        self.shared.lock().await.join_snapshot(player)
    }

    /// Ticks elapsed since the instance started.
    pub async fn tick(&self) -> Ticks {
        self.shared.lock().await.tick()
    }
}

// ===========================================================================
// Registry
// ===========================================================================

struct Entry {
    handle: InstanceHandle,
    driver: JoinHandle<()>,
}

/// Owns every hosted instance and the task that ticks it.
pub struct InstanceRegistry {
    config: RuntimeConfig,
    entries: HashMap<InstanceId, Entry>,
}

impl InstanceRegistry {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register an instance and start ticking it. The returned handle (and
    /// any clone of it) stays valid until [`deregister`](Self::deregister).
    pub fn register(
        &mut self,
        id: InstanceId,
        instance: GameInstance,
    ) -> Result<InstanceHandle, RegistryError> {
        if self.entries.contains_key(&id) {
            return Err(RegistryError::DuplicateInstance(id));
        }
        let shared = Arc::new(Mutex::new(instance));
        let handle = InstanceHandle {
            shared: Arc::clone(&shared),
        };
        let driver = tokio::spawn(drive(id.clone(), shared, self.config.tick_interval));
        tracing::info!(instance = %id, "instance registered");
        self.entries.insert(
            id,
            Entry {
                handle: handle.clone(),
                driver,
            },
        );
        Ok(handle)
    }

    /// Look up the handle of a registered instance.
    pub fn handle(&self, id: &InstanceId) -> Option<InstanceHandle> {
        self.entries.get(id).map(|e| e.handle.clone())
    }

    /// Stop ticking an instance and drop it from the registry. Outstanding
    /// handles keep the state alive but nothing advances it anymore.
    pub fn deregister(&mut self, id: &InstanceId) -> Result<(), RegistryError> {
        let entry = self
            .entries
            .remove(id)
            .ok_or_else(|| RegistryError::UnknownInstance(id.clone()))?;
        entry.driver.abort();
        tracing::info!(instance = %id, "instance deregistered");
        Ok(())
    }
}

impl Drop for InstanceRegistry {
    fn drop(&mut self) {
        for entry in self.entries.values() {
            entry.driver.abort();
        }
    }
}

/// The per-instance tick loop. A failed tick means corrupted instance state,
/// so the driver logs and stops rather than retrying.
async fn drive(id: InstanceId, shared: Arc<Mutex<GameInstance>>, tick_interval: Duration) {
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first interval fire is immediate; skip it so tick 1 lands one
    // full interval after registration.
    interval.tick().await;
    loop {
        interval.tick().await;
        let mut instance = shared.lock().await;
        let started = std::time::Instant::now();
        if let Err(error) = instance.advance_tick() {
            tracing::error!(instance = %id, error = %error, "tick failed, halting instance");
            return;
        }
        tracing::trace!(
            instance = %id,
            tick = instance.tick(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "tick complete"
        );
    }
}

// ===========================================================================
// Tests
// ===========================================================================
