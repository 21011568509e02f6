use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use smallvec::SmallVec;

use crate::simulator::{entity::EntityName, stock::StockId};

/// Movement kind fired when the environment enters `SimulationRunning`.
pub const START_SIMULATION: MovementKind = MovementKind("start_simulation");

/// Movement kind closing the heap and ending the run.
pub const TERMINATE_SIMULATION: MovementKind = MovementKind("terminate_simulation");

/// Label of a movement, shown in the trace (e.g. `"autoscaler_tick"`,
/// `"send_to_replica"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MovementKind(pub &'static str);

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Handle to a scheduled movement, usable to cancel it before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MovementId(pub(crate) u64);

/// An edge of the flow graph: at `occurs_at`, move one entity from `from`
/// to `to`.
///
/// `from` and `to` may name the same stock; such self-loops ("ticktocks")
/// drive periodic side-effects. Without an explicit `entity`, the source
/// stock decides which entity leaves (insertion order, or a freshly
/// generated one for source stocks).
#[derive(Debug, Clone)]
pub struct Movement {
    pub kind: MovementKind,
    pub occurs_at: DateTime<Utc>,
    pub from: StockId,
    pub to: StockId,
    pub entity: Option<EntityName>,
    pub notes: SmallVec<[String; 1]>,
}

impl Movement {
    pub fn new(kind: MovementKind, occurs_at: DateTime<Utc>, from: StockId, to: StockId) -> Self {
        Self {
            kind,
            occurs_at,
            from,
            to,
            entity: None,
            notes: SmallVec::new(),
        }
    }

    /// Targets a specific entity instead of leaving the choice to the stock.
    pub fn carrying(mut self, entity: impl Into<EntityName>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Attaches a note that will appear on this movement's trace line.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// A movement inside the heap, stamped with its scheduling sequence number.
///
/// The heap is keyed by `(occurs_at, seq)`: within one instant, movements
/// fire in the order they were scheduled.
#[derive(Debug, Clone)]
pub(crate) struct QueuedMovement {
    pub seq: u64,
    pub movement: Movement,
}

impl PartialEq for QueuedMovement {
    fn eq(&self, other: &Self) -> bool {
        self.movement.occurs_at == other.movement.occurs_at && self.seq == other.seq
    }
}

impl Eq for QueuedMovement {}

impl PartialOrd for QueuedMovement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedMovement {
    fn cmp(&self, other: &Self) -> Ordering {
        self.movement
            .occurs_at
            .cmp(&other.movement.occurs_at)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Reverse;
    use std::collections::BinaryHeap;

    use chrono::TimeDelta;

    use super::*;

    fn at(nanos: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::nanoseconds(nanos)
    }

    fn queued(seq: u64, nanos: i64) -> QueuedMovement {
        QueuedMovement {
            seq,
            movement: Movement::new(MovementKind("test"), at(nanos), StockId(0), StockId(1)),
        }
    }

    #[test]
    fn heap_pops_in_time_order() {
        let mut heap = BinaryHeap::new();
        heap.push(Reverse(queued(0, 300)));
        heap.push(Reverse(queued(1, 100)));
        heap.push(Reverse(queued(2, 200)));

        let order: Vec<u64> = std::iter::from_fn(|| heap.pop().map(|Reverse(q)| q.seq)).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn equal_timestamps_fire_in_scheduling_order() {
        let mut heap = BinaryHeap::new();
        for seq in [3u64, 1, 4, 2] {
            heap.push(Reverse(queued(seq, 500)));
        }

        let order: Vec<u64> = std::iter::from_fn(|| heap.pop().map(|Reverse(q)| q.seq)).collect();
        assert_eq!(order, vec![1, 2, 3, 4]);
    }
}
