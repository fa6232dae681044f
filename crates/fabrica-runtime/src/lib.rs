//! Async hosting for game instances.
//!
//! The core engine is a synchronous state machine; this crate owns the
//! clock. An [`InstanceRegistry`] holds every live [`fabrica_core::instance::GameInstance`]
//! behind an async mutex and drives each one from its own interval task, so
//! transports talk to instances through cheap clonable [`InstanceHandle`]s
//! and never observe a half-finished tick.

mod registry;

pub use registry::{InstanceHandle, InstanceId, InstanceRegistry, RegistryError, RuntimeConfig};
