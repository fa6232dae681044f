//! Deterministic production-flow engine for factory worlds.
//!
//! The engine settles each player's factory once per tick in two phases.
//! Phase A derives a transient ledger (zero stock, ceilings set to spare
//! capacity) and runs every machine for 100 micro-steps against it, so
//! producer output becomes consumer input within the same tick and scarcity
//! throttles flow proportionally instead of starving whoever ran last.
//! Phase B sums the net flow of mobile resources, clamps it by the player's
//! logistics stock, and folds every transient delta into persistent storage
//! at that one shared factor.
//!
//! All quantities are Q32.32 fixed-point ([`fixed::Fixed64`]) and every
//! collection iterates in a deterministic order, so identical command
//! streams yield identical worlds.

pub mod catalog;
pub mod command;
pub mod deposit;
pub mod error;
pub mod event;
pub mod fixed;
pub mod flow;
pub mod id;
pub mod instance;
pub mod ledger;
pub mod machine;
pub mod player;
