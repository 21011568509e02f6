use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use chrono::{DateTime, TimeDelta, Utc};
use strum_macros::Display;
use tracing::trace;

use crate::{
    error::{SchedulerError, SimResult},
    simulator::movement::{
        Movement, MovementId, MovementKind, QueuedMovement, START_SIMULATION, TERMINATE_SIMULATION,
    },
};

/// Lifecycle of one simulation run.
///
/// ```md
/// Current State        | Movement               | Next State
/// ---------------------|------------------------|---------------------
/// SimulationStarting   | start_simulation       | SimulationRunning
/// SimulationRunning    | terminate_simulation   | SimulationTerminated
/// ```
///
/// Any other lifecycle movement is a [`SchedulerError::LifecycleTransition`];
/// scheduling anything in `SimulationTerminated` is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SimulationState {
    #[strum(serialize = "SimulationStarting")]
    Starting,

    #[strum(serialize = "SimulationRunning")]
    Running,

    #[strum(serialize = "SimulationTerminated")]
    Terminated,
}

/// The master clock: logical time plus the min-heap of pending movements.
///
/// The heap is keyed by `(occurs_at, seq)`. Movements scheduled past the
/// halt time are diverted to the ignored list and reported at the end of the
/// trace; scheduling strictly before `sim_time` is a fatal error.
#[derive(Debug)]
pub struct Scheduler {
    sim_time: DateTime<Utc>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    current_movement_time: DateTime<Utc>,
    heap: BinaryHeap<Reverse<QueuedMovement>>,
    next_seq: u64,
    canceled: HashSet<u64>,
    ignored: Vec<Movement>,
    state: SimulationState,
}

impl Scheduler {
    pub fn new(begin: DateTime<Utc>, run_for: TimeDelta) -> Self {
        Self {
            sim_time: begin,
            start_time: begin,
            end_time: begin + run_for,
            current_movement_time: begin,
            heap: BinaryHeap::new(),
            next_seq: 0,
            canceled: HashSet::new(),
            ignored: Vec::new(),
            state: SimulationState::Starting,
        }
    }

    pub fn sim_time(&self) -> DateTime<Utc> {
        self.sim_time
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn halt_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    /// The `occurs_at` of the movement currently executing. Stable for the
    /// whole duration of that movement's add/remove side-effects, even when
    /// those side-effects schedule further movements.
    pub fn current_movement_time(&self) -> DateTime<Utc> {
        self.current_movement_time
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn pending(&self) -> usize {
        self.heap.len()
    }

    /// Inserts a movement into the heap.
    ///
    /// Returns `Ok(None)` when the movement falls past the halt time: it is
    /// appended to the ignored list instead of the heap. Scheduling at
    /// exactly `sim_time` is allowed and fires after everything already
    /// queued at that instant.
    pub fn schedule(&mut self, movement: Movement) -> SimResult<Option<MovementId>> {
        if self.state == SimulationState::Terminated {
            return Err(SchedulerError::Terminated(movement.kind.to_string()).into());
        }
        if movement.occurs_at < self.sim_time {
            return Err(SchedulerError::ScheduledInPast {
                kind: movement.kind.to_string(),
                occurs_at: movement.occurs_at.to_rfc3339(),
                sim_time: self.sim_time.to_rfc3339(),
            }
            .into());
        }
        if movement.occurs_at > self.end_time {
            trace!(kind = %movement.kind, occurs_at = %movement.occurs_at, "movement past halt, ignored");
            self.ignored.push(movement);
            return Ok(None);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        trace!(kind = %movement.kind, occurs_at = %movement.occurs_at, seq, "scheduled");
        self.heap.push(Reverse(QueuedMovement { seq, movement }));
        Ok(Some(MovementId(seq)))
    }

    /// Marks a scheduled movement as canceled; it will be discarded silently
    /// when popped.
    pub fn cancel(&mut self, id: MovementId) {
        self.canceled.insert(id.0);
    }

    /// Pops the earliest live movement and advances the clock to it.
    pub(crate) fn next(&mut self) -> Option<QueuedMovement> {
        loop {
            let Reverse(queued) = self.heap.pop()?;
            if self.canceled.remove(&queued.seq) {
                continue;
            }
            self.sim_time = queued.movement.occurs_at;
            self.current_movement_time = queued.movement.occurs_at;
            return Some(queued);
        }
    }

    /// Applies the lifecycle FSM for the given movement kind. Returns the
    /// `(from, to)` states for lifecycle movements, `None` otherwise.
    pub(crate) fn transition(
        &mut self,
        kind: &MovementKind,
    ) -> SimResult<Option<(SimulationState, SimulationState)>> {
        let next = match (*kind, self.state) {
            (START_SIMULATION, SimulationState::Starting) => SimulationState::Running,
            (TERMINATE_SIMULATION, SimulationState::Running) => SimulationState::Terminated,
            (START_SIMULATION | TERMINATE_SIMULATION, state) => {
                return Err(SchedulerError::LifecycleTransition {
                    event: kind.to_string(),
                    state: state.to_string(),
                }
                .into());
            }
            _ => return Ok(None),
        };
        let previous = self.state;
        self.state = next;
        Ok(Some((previous, next)))
    }

    /// Empties the heap after termination. Whatever is left was scheduled at
    /// the halt instant behind the terminate movement and never executed.
    pub(crate) fn drain_remaining(&mut self) -> Vec<Movement> {
        let mut remaining: Vec<Movement> = Vec::new();
        while let Some(Reverse(queued)) = self.heap.pop() {
            if self.canceled.remove(&queued.seq) {
                continue;
            }
            remaining.push(queued.movement);
        }
        remaining
    }

    pub(crate) fn take_ignored(&mut self) -> Vec<Movement> {
        std::mem::take(&mut self.ignored)
    }

    pub fn ignored(&self) -> &[Movement] {
        &self.ignored
    }
}
