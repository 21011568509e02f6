use thiserror::Error;

use crate::simulator::entity::{EntityKind, EntityName};
use crate::simulator::stock::StockName;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    System(#[from] SystemError),
}

impl SimError {
    /// Soft errors are annotated into the trace and the run continues.
    /// Everything else terminates the run.
    pub fn is_soft(&self) -> bool {
        matches!(self, SimError::Stock(_) | SimError::Plugin(_))
    }
}

/// Errors rejecting a scenario document before anything runs.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Missing {0}")]
    Missing(&'static str),

    #[error("Simulation duration must be positive, got {0}")]
    NonPositiveDuration(String),

    #[error("Tick interval {tick} exceeds simulation duration {duration}")]
    TickIntervalTooLong { tick: String, duration: String },

    #[error("Invalid traffic profile: {0}")]
    InvalidTraffic(String),

    #[error("Invalid cluster config: {0}")]
    InvalidCluster(String),

    #[error("Invalid autoscaler config: {0}")]
    InvalidAutoscaler(String),

    #[error("Failed to parse scenario document")]
    Parse(#[from] serde_json::Error),
}

/// Errors in the scheduler core. These are fatal: the run terminates.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Movement '{kind}' scheduled at {occurs_at}, which is before sim time {sim_time}")]
    ScheduledInPast {
        kind: String,
        occurs_at: String,
        sim_time: String,
    },

    #[error("Cannot schedule '{0}': simulation has terminated")]
    Terminated(String),

    #[error("Invalid lifecycle transition '{event}' in state {state}")]
    LifecycleTransition { event: String, state: String },
}

/// Errors raised by stocks. Recorded as trace notes; the movement is dropped
/// and the simulation continues.
#[derive(Debug, Error)]
pub enum StockError {
    #[error("Stock '{stock}' stocks {expected} entities, rejected {actual} '{entity}'")]
    KindMismatch {
        stock: StockName,
        expected: EntityKind,
        actual: EntityKind,
        entity: EntityName,
    },

    #[error("Cannot remove from empty stock '{0}'")]
    RemoveFromEmpty(StockName),

    #[error("Cannot remove from sink stock '{0}'")]
    RemoveFromSink(StockName),

    #[error("Cannot add to source stock '{0}'")]
    AddToSource(StockName),

    #[error("Entity '{entity}' not found in stock '{stock}'")]
    NoSuchEntity {
        stock: StockName,
        entity: EntityName,
    },
}

/// Errors from the autoscaler policy plugin. Recorded as tick notes; that
/// tick's reconciliation is skipped and the next tick retries.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Plugin handshake failed: {0}")]
    Handshake(String),

    #[error("Failed to launch plugin process")]
    Launch(#[from] std::io::Error),

    #[error("Plugin RPC failed: {0}")]
    Rpc(String),

    #[error("Malformed plugin response: {0}")]
    MalformedResponse(String),

    #[error("Plugin does not support capability: {0}")]
    Unsupported(String),
}

/// Errors related to the plugin transport (gRPC channel).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Invalid plugin address: '{0}'")]
    InvalidAddress(String),
}

/// Errors related to internal invariants and bugs.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("No stock registered for handle {0}")]
    MissingStock(usize),

    #[error("Failed timestamp conversion: {0}")]
    TimeConversion(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}
