use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::{
    error::{SimResult, SystemError},
    plugin::bridge::Plugin,
    simulator::{
        entity::{Entity, EntityKind, EntityName, TickToken},
        movement::{
            Movement, MovementId, QueuedMovement, START_SIMULATION, TERMINATE_SIMULATION,
        },
        scheduler::{Scheduler, SimulationState},
        stock::{Stock, StockId, StockSet},
        trace::{CpuUtilizationLog, Trace, TraceLine},
    },
};

/// Mutable view of the environment handed to stock hooks.
///
/// Hooks run while the environment is mid-movement; this context is the only
/// way they touch the world, which keeps the borrow discipline in one place.
pub struct EnvCtx<'a> {
    pub scheduler: &'a mut Scheduler,
    pub stocks: &'a mut StockSet,
    pub plugin: &'a mut dyn Plugin,
    pub rng: &'a mut StdRng,
    pub utilization: &'a mut CpuUtilizationLog,
    /// Notes appended here land on the current movement's trace line.
    pub notes: &'a mut Vec<String>,
}

/// Side-effects attached to a stock.
///
/// A stock with hooks is what the flow model calls a hook-stock: arrivals
/// and departures may schedule further movements through the context.
/// Multiple hooks per stock compose; they run in registration order.
pub trait StockHook {
    fn on_add(
        &mut self,
        ctx: &mut EnvCtx<'_>,
        movement: &Movement,
        entity: &EntityName,
    ) -> SimResult<()> {
        let _ = (ctx, movement, entity);
        Ok(())
    }

    fn on_remove(
        &mut self,
        ctx: &mut EnvCtx<'_>,
        movement: &Movement,
        entity: &EntityName,
    ) -> SimResult<()> {
        let _ = (ctx, movement, entity);
        Ok(())
    }
}

enum HookPoint {
    Add,
    Remove,
}

/// The environment owns the master clock, the stock arena, the hook
/// registry, the plugin handle and the run log. `run()` drains the heap in
/// `(occurs_at, seq)` order on a single thread; determinism in logical time
/// is the defining correctness property.
pub struct Environment {
    scheduler: Scheduler,
    stocks: StockSet,
    hooks: HashMap<StockId, Vec<Box<dyn StockHook>>>,
    plugin: Box<dyn Plugin>,
    rng: StdRng,
    utilization: CpuUtilizationLog,
    trace: Trace,
}

impl Environment {
    /// Creates an environment spanning `[begin, begin + run_for]` and seeds
    /// the `start_simulation` / `terminate_simulation` movements.
    pub fn new(
        begin: DateTime<Utc>,
        run_for: TimeDelta,
        plugin: Box<dyn Plugin>,
        seed: u64,
    ) -> SimResult<Self> {
        let mut stocks = StockSet::new();
        let mut env_stock_inner = Stock::through("Environment", EntityKind::Simulation);
        env_stock_inner
            .add(Entity::Token(TickToken::new(
                "simulation",
                EntityKind::Simulation,
            )))
            .map_err(|e| SystemError::InvariantViolation(e.to_string()))?;
        let env_stock = stocks.insert(env_stock_inner);

        let mut scheduler = Scheduler::new(begin, run_for);
        scheduler.schedule(
            Movement::new(START_SIMULATION, begin, env_stock, env_stock).carrying("simulation"),
        )?;
        scheduler.schedule(
            Movement::new(TERMINATE_SIMULATION, begin + run_for, env_stock, env_stock)
                .carrying("simulation"),
        )?;

        Ok(Self {
            scheduler,
            stocks,
            hooks: HashMap::new(),
            plugin,
            rng: StdRng::seed_from_u64(seed),
            utilization: CpuUtilizationLog::new(),
            trace: Trace::new(),
        })
    }

    // ========================================================================
    // Wiring
    // ========================================================================

    pub fn add_stock(&mut self, stock: Stock) -> StockId {
        self.stocks.insert(stock)
    }

    pub fn register_hook(&mut self, stock: StockId, hook: Box<dyn StockHook>) {
        self.hooks.entry(stock).or_default().push(hook);
    }

    pub fn schedule(&mut self, movement: Movement) -> SimResult<Option<MovementId>> {
        self.scheduler.schedule(movement)
    }

    pub fn cancel(&mut self, id: MovementId) {
        self.scheduler.cancel(id);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn stock(&self, id: StockId) -> SimResult<&Stock> {
        self.stocks.get(id)
    }

    pub fn stock_mut(&mut self, id: StockId) -> SimResult<&mut Stock> {
        self.stocks.get_mut(id)
    }

    pub fn sim_time(&self) -> DateTime<Utc> {
        self.scheduler.sim_time()
    }

    pub fn current_movement_time(&self) -> DateTime<Utc> {
        self.scheduler.current_movement_time()
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.scheduler.start_time()
    }

    pub fn halt_time(&self) -> DateTime<Utc> {
        self.scheduler.halt_time()
    }

    pub fn state(&self) -> SimulationState {
        self.scheduler.state()
    }

    pub fn plugin(&mut self) -> &mut dyn Plugin {
        self.plugin.as_mut()
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn utilization(&self) -> &CpuUtilizationLog {
        &self.utilization
    }

    // ========================================================================
    // The Run Loop
    // ========================================================================

    /// Drains the heap until the terminate movement fires or the heap runs
    /// dry, executing one movement at a time.
    ///
    /// Soft failures (stock rejections, plugin errors) are annotated into
    /// the trace and the run continues; scheduler errors abort.
    #[tracing::instrument(skip(self), fields(halt = %self.scheduler.halt_time()))]
    pub fn run(&mut self) -> SimResult<()> {
        info!(start = %self.scheduler.start_time(), "simulation starting");

        while let Some(queued) = self.scheduler.next() {
            let terminated = self.execute(queued)?;
            if terminated {
                break;
            }
        }

        // Movements the scheduler refused to queue, then whatever was still
        // pending behind the terminate movement.
        for movement in self.scheduler.take_ignored() {
            self.trace.record_ignored(
                nanos_of(movement.occurs_at),
                movement.kind.to_string(),
            );
        }
        for movement in self.scheduler.drain_remaining() {
            self.trace.record_ignored(
                nanos_of(movement.occurs_at),
                movement.kind.to_string(),
            );
        }

        info!(
            executed = self.trace.lines().len(),
            ignored = self.trace.ignored().len(),
            "simulation terminated"
        );
        Ok(())
    }

    fn execute(&mut self, queued: QueuedMovement) -> SimResult<bool> {
        let QueuedMovement { movement, .. } = queued;
        let mut notes: Vec<String> = movement.notes.to_vec();

        // Lifecycle movements drive the FSM and log states, not stocks.
        if let Some((from_state, to_state)) = self.scheduler.transition(&movement.kind)? {
            let terminated = to_state == SimulationState::Terminated;
            notes.push(if terminated {
                "Reached termination event".to_string()
            } else {
                "Started simulation".to_string()
            });
            self.trace.record(TraceLine {
                at_nanos: nanos_of(movement.occurs_at),
                identifier: "Environment".to_string(),
                kind: movement.kind.to_string(),
                from: from_state.to_string(),
                to: to_state.to_string(),
                notes,
            });
            return Ok(terminated);
        }

        let identifier = match self.transfer(&movement, &mut notes) {
            Ok(name) => name.to_string(),
            Err(e) if e.is_soft() => {
                warn!(kind = %movement.kind, error = %e, "movement dropped");
                notes.push(format!("dropped: {e}"));
                movement
                    .entity
                    .as_ref()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".to_string())
            }
            Err(e) => return Err(e),
        };

        self.trace.record(TraceLine {
            at_nanos: nanos_of(movement.occurs_at),
            identifier,
            kind: movement.kind.to_string(),
            from: self.stocks.name(movement.from).to_string(),
            to: self.stocks.name(movement.to).to_string(),
            notes,
        });
        Ok(false)
    }

    /// Performs the remove → add transfer and runs the hooks on both sides.
    ///
    /// The destination is checked before the source is touched, so a
    /// rejected movement leaves the entity where it was.
    fn transfer(&mut self, movement: &Movement, notes: &mut Vec<String>) -> SimResult<EntityName> {
        let from = self.stocks.get(movement.from)?;
        let from_kind = from.kind_stocked();
        let source_kind = from.source_kind();

        let probe = movement
            .entity
            .clone()
            .unwrap_or_else(|| EntityName::from("?"));
        self.stocks.get(movement.to)?.accepts(from_kind, &probe)?;

        let entity = match source_kind {
            Some(kind) => {
                let seq = self.stocks.get_mut(movement.from)?.bump_generated();
                kind.synthesize(seq, self.scheduler.current_movement_time(), &mut self.stocks)
            }
            None => self
                .stocks
                .get_mut(movement.from)?
                .remove(movement.entity.as_ref())?,
        };
        let name = entity.name().clone();
        debug!(kind = %movement.kind, entity = %name, "executing movement");

        self.run_hooks(HookPoint::Remove, movement.from, movement, &name, notes)?;

        self.stocks
            .get_mut(movement.to)?
            .add(entity)
            .map_err(|e| SystemError::InvariantViolation(e.to_string()))?;

        self.run_hooks(HookPoint::Add, movement.to, movement, &name, notes)?;
        Ok(name)
    }

    fn run_hooks(
        &mut self,
        point: HookPoint,
        stock: StockId,
        movement: &Movement,
        entity: &EntityName,
        notes: &mut Vec<String>,
    ) -> SimResult<()> {
        let Some(mut hooks) = self.hooks.remove(&stock) else {
            return Ok(());
        };

        let mut outcome = Ok(());
        {
            let mut ctx = EnvCtx {
                scheduler: &mut self.scheduler,
                stocks: &mut self.stocks,
                plugin: self.plugin.as_mut(),
                rng: &mut self.rng,
                utilization: &mut self.utilization,
                notes,
            };
            for hook in hooks.iter_mut() {
                let result = match point {
                    HookPoint::Add => hook.on_add(&mut ctx, movement, entity),
                    HookPoint::Remove => hook.on_remove(&mut ctx, movement, entity),
                };
                if let Err(e) = result {
                    if e.is_soft() {
                        warn!(stock = %ctx.stocks.name(stock), error = %e, "hook failed");
                        ctx.notes.push(e.to_string());
                    } else {
                        outcome = Err(e);
                        break;
                    }
                }
            }
        }

        self.hooks.insert(stock, hooks);
        outcome
    }
}

pub(crate) fn nanos_of(at: DateTime<Utc>) -> i64 {
    at.timestamp_nanos_opt().unwrap_or_default()
}
