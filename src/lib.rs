// === Public Modules (The Canonical Paths) ===
pub mod config;
pub mod error;
pub mod model;
pub mod plugin;
pub mod simulator;

// === Private Implementation Details ===
mod generated;
mod macros;

// === Facades (Re-exporting internals) ===
// Expose the common entry points without forcing deep paths on users.
pub use crate::config::Scenario;
pub use crate::model::builder::{Simulation, SimulationBuilder};
pub use crate::simulator::environment::Environment;
