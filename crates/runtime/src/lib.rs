//! Stateful services over the pure content rules.
//!
//! This crate owns everything that outlives a single call: the reloadable
//! registries, the signal bus that announces their changes, the explicit
//! [`ContentContext`] bundling them, and [`BattleSession`], which runs
//! registry-driven encounters.
//!
//! Modules are organized by responsibility:
//! - [`registry`] hosts the generic [`Registry`] and its kind-specific queries
//! - [`events`] provides the synchronous [`SignalBus`]
//! - [`context`] wires registries, bus, and variant generator together
//! - [`battle`] resolves abilities and status effects inside encounters
//! - [`database`] bootstraps the SQLite content mirror
pub mod battle;
pub mod context;
#[cfg(feature = "sqlite")]
pub mod database;
pub mod events;
pub mod registry;

pub use battle::{AbilityOutcome, BattleError, BattleSession};
pub use context::{ContentContext, ContentSources, ContextReport, ENTITY_TARGET, WEAPON_TARGET};
#[cfg(feature = "sqlite")]
pub use database::initialize_database;
pub use events::{Signal, SignalBus, SignalHandler, SignalRecord, SubscriptionId};
pub use registry::{LoadReport, Registry, RegistryTable};
