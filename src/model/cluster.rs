use chrono::TimeDelta;
use tracing::debug;

use crate::{
    config::{Scenario, to_delta},
    error::SimResult,
    model::{
        kind::{
            DECREASE_DESIRED, FINISH_LAUNCHING, FINISH_TERMINATING, INCREASE_DESIRED,
            START_REPLICA, TERMINATE_REPLICA,
        },
        replica::{PodInformerHook, ReplicaTemplate},
        request::{RequestRoutingHook, RequestTemplate},
    },
    plugin::bridge::{ObjectEvent, Partition, PodState},
    simulator::{
        entity::{EntityKind, EntityName},
        environment::{EnvCtx, Environment, StockHook},
        movement::{Movement, MovementKind},
        stock::{SourceKind, Stock, StockId},
    },
};

/// Handles to the cluster's stock graph:
///
/// ```text
/// ReplicaSource → ReplicasLaunching → ReplicasActive → ReplicasTerminating → ReplicasTerminated
///                    (launch delay)                      (terminate delay)
///
/// TrafficSource → RequestsBuffered → <replica>-RequestsProcessing → <replica>-RequestsComplete
///                        ↓
///                  RequestsFailed
///
/// DesiredSource → ReplicasDesired → DesiredSink
/// ```
///
/// `ReplicasDesired` is the ledger: its count is the desired replica count,
/// and token arrivals/departures launch and terminate replicas.
#[derive(Debug, Clone, Copy)]
pub struct ClusterModel {
    pub traffic_source: StockId,
    pub requests_buffered: StockId,
    pub requests_failed: StockId,

    pub replica_source: StockId,
    pub replicas_launching: StockId,
    pub replicas_active: StockId,
    pub replicas_terminating: StockId,
    pub replicas_terminated: StockId,

    pub desired_source: StockId,
    pub replicas_desired: StockId,
    pub desired_sink: StockId,
}

impl ClusterModel {
    /// Builds the stock graph into the environment, registers the lifecycle
    /// hooks and requests the initial replicas.
    pub fn install(
        env: &mut Environment,
        scenario: &Scenario,
        partition: &Partition,
    ) -> SimResult<Self> {
        let cluster = &scenario.cluster;
        let request_template = RequestTemplate {
            cpu_demand_millis: cluster.cpu_demand_per_request_millis,
            service_time: to_delta(cluster.request_service_time)?,
        };
        let replica_template = ReplicaTemplate {
            cpu_capacity_millis: cluster.cpu_capacity_per_replica_millis,
            max_rps: cluster.max_rps_per_replica,
        };

        let traffic_source = env.add_stock(Stock::source(
            "TrafficSource",
            EntityKind::Request,
            SourceKind::Traffic(request_template),
        ));
        let requests_buffered = env.add_stock(Stock::through("RequestsBuffered", EntityKind::Request));
        let requests_failed = env.add_stock(Stock::sink("RequestsFailed", EntityKind::Request));

        let replica_source = env.add_stock(Stock::source(
            "ReplicaSource",
            EntityKind::Replica,
            SourceKind::Replica(replica_template),
        ));
        let replicas_launching =
            env.add_stock(Stock::through("ReplicasLaunching", EntityKind::Replica));
        let replicas_active = env.add_stock(Stock::through("ReplicasActive", EntityKind::Replica));
        let replicas_terminating =
            env.add_stock(Stock::through("ReplicasTerminating", EntityKind::Replica));
        let replicas_terminated =
            env.add_stock(Stock::sink("ReplicasTerminated", EntityKind::Replica));

        let desired_source = env.add_stock(Stock::source(
            "DesiredSource",
            EntityKind::Desired,
            SourceKind::Desired,
        ));
        let replicas_desired =
            env.add_stock(Stock::through("ReplicasDesired", EntityKind::Desired));
        let desired_sink = env.add_stock(Stock::sink("DesiredSink", EntityKind::Desired));

        let model = Self {
            traffic_source,
            requests_buffered,
            requests_failed,
            replica_source,
            replicas_launching,
            replicas_active,
            replicas_terminating,
            replicas_terminated,
            desired_source,
            replicas_desired,
            desired_sink,
        };

        env.register_hook(
            requests_buffered,
            Box::new(RequestRoutingHook {
                buffered: requests_buffered,
                failed: requests_failed,
                replicas_active,
                retry_interval: to_delta(cluster.request_retry_interval)?,
                max_retries: cluster.request_max_retries,
            }),
        );
        env.register_hook(
            replicas_desired,
            Box::new(DesiredLedgerHook {
                cluster: model,
            }),
        );
        env.register_hook(
            replicas_launching,
            Box::new(TransitDelayHook {
                kind: FINISH_LAUNCHING,
                from: replicas_launching,
                to: replicas_active,
                delay: to_delta(cluster.launch_delay)?,
            }),
        );
        env.register_hook(
            replicas_terminating,
            Box::new(TransitDelayHook {
                kind: FINISH_TERMINATING,
                from: replicas_terminating,
                to: replicas_terminated,
                delay: to_delta(cluster.terminate_delay)?,
            }),
        );
        env.register_hook(
            replicas_active,
            Box::new(PodInformerHook {
                partition: partition.clone(),
                event: ObjectEvent::Create,
                state: PodState::Active,
            }),
        );
        env.register_hook(
            replicas_terminated,
            Box::new(PodInformerHook {
                partition: partition.clone(),
                event: ObjectEvent::Delete,
                state: PodState::Terminated,
            }),
        );

        // The initial population goes through the same ledger as every later
        // scale decision.
        let begin = env.start_time();
        for _ in 0..cluster.initial_replicas {
            env.schedule(Movement::new(
                INCREASE_DESIRED,
                begin,
                desired_source,
                replicas_desired,
            ))?;
        }

        Ok(model)
    }

    /// `|launching| + |active|`, the population the desired ledger compares
    /// against.
    pub fn scalable_population(&self, env: &Environment) -> SimResult<u64> {
        Ok(env.stock(self.replicas_launching)?.count() + env.stock(self.replicas_active)?.count())
    }

    /// `|launching| + |active| + |terminating|`, the live replica population.
    pub fn live_population(&self, env: &Environment) -> SimResult<u64> {
        Ok(self.scalable_population(env)? + env.stock(self.replicas_terminating)?.count())
    }
}

// ================================================================================================
// Desired Ledger
// ================================================================================================

/// Reconciles the replica population against the desired count.
///
/// One token in, at most one replica launched; one token out, at most one
/// replica terminated. Scale-down picks the active replica with the fewest
/// in-flight requests so that idle replicas drain first.
struct DesiredLedgerHook {
    cluster: ClusterModel,
}

impl StockHook for DesiredLedgerHook {
    fn on_add(
        &mut self,
        ctx: &mut EnvCtx<'_>,
        _movement: &Movement,
        _entity: &EntityName,
    ) -> SimResult<()> {
        let now = ctx.scheduler.current_movement_time();
        let desired = ctx.stocks.get(self.cluster.replicas_desired)?.count();
        let population = self.population(ctx)?;

        if population < desired {
            debug!(desired, population, "launching replica");
            ctx.scheduler.schedule(Movement::new(
                START_REPLICA,
                now,
                self.cluster.replica_source,
                self.cluster.replicas_launching,
            ))?;
        }
        Ok(())
    }

    fn on_remove(
        &mut self,
        ctx: &mut EnvCtx<'_>,
        _movement: &Movement,
        _entity: &EntityName,
    ) -> SimResult<()> {
        let now = ctx.scheduler.current_movement_time();
        let desired = ctx.stocks.get(self.cluster.replicas_desired)?.count();

        // Replicas already picked this instant are still in the active stock
        // (their terminate_replica fires later in the tick); the draining
        // flag keeps them from being picked or counted twice.
        let mut draining = 0u64;
        let mut candidates: Vec<(EntityName, u64)> = Vec::new();
        for e in ctx.stocks.get(self.cluster.replicas_active)?.entities() {
            if let Some(replica) = e.as_replica() {
                if replica.draining {
                    draining += 1;
                    continue;
                }
                let in_flight = ctx.stocks.get(replica.requests_processing())?.count();
                candidates.push((replica.name().clone(), in_flight));
            }
        }

        let population = self.population(ctx)? - draining;
        if population <= desired {
            return Ok(());
        }

        let Some((victim, in_flight)) = candidates.into_iter().min_by_key(|(_, n)| *n) else {
            ctx.notes.push("no active replica to terminate".to_string());
            return Ok(());
        };

        if let Some(replica) = ctx
            .stocks
            .get_mut(self.cluster.replicas_active)?
            .entity_mut(&victim)
            .and_then(|e| e.as_replica_mut())
        {
            replica.draining = true;
        }

        debug!(desired, population, %victim, in_flight, "terminating replica");
        ctx.scheduler.schedule(
            Movement::new(
                TERMINATE_REPLICA,
                now,
                self.cluster.replicas_active,
                self.cluster.replicas_terminating,
            )
            .carrying(victim),
        )?;
        Ok(())
    }
}

impl DesiredLedgerHook {
    fn population(&self, ctx: &EnvCtx<'_>) -> SimResult<u64> {
        Ok(ctx.stocks.get(self.cluster.replicas_launching)?.count()
            + ctx.stocks.get(self.cluster.replicas_active)?.count())
    }
}

// ================================================================================================
// Delayed Transit
// ================================================================================================

/// Holds each arriving entity for a fixed delay, then forwards it.
///
/// Models the launch and terminate latencies of the replica lifecycle.
struct TransitDelayHook {
    kind: MovementKind,
    from: StockId,
    to: StockId,
    delay: TimeDelta,
}

impl StockHook for TransitDelayHook {
    fn on_add(
        &mut self,
        ctx: &mut EnvCtx<'_>,
        _movement: &Movement,
        entity: &EntityName,
    ) -> SimResult<()> {
        let now = ctx.scheduler.current_movement_time();
        ctx.scheduler.schedule(
            Movement::new(self.kind, now + self.delay, self.from, self.to)
                .carrying(entity.clone()),
        )?;
        Ok(())
    }
}

/// Schedules `delta` desired-ledger movements at `now`, scaling toward
/// `target`. Used by the autoscaler's horizontal reconciliation.
pub(crate) fn reconcile_desired(
    ctx: &mut EnvCtx<'_>,
    cluster: &ClusterModel,
    target: u64,
) -> SimResult<i64> {
    let now = ctx.scheduler.current_movement_time();
    let current = ctx.stocks.get(cluster.replicas_desired)?.count();
    let delta = target as i64 - current as i64;

    if delta > 0 {
        for _ in 0..delta {
            ctx.scheduler.schedule(Movement::new(
                INCREASE_DESIRED,
                now,
                cluster.desired_source,
                cluster.replicas_desired,
            ))?;
        }
    } else {
        for _ in 0..delta.unsigned_abs() {
            ctx.scheduler.schedule(Movement::new(
                DECREASE_DESIRED,
                now,
                cluster.replicas_desired,
                cluster.desired_sink,
            ))?;
        }
    }
    Ok(delta)
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use crate::{
        config::{ClusterConfig, Scenario},
        plugin::fixtures::FixedHorizontalPlugin,
        simulator::movement::MovementKind,
    };

    use super::*;

    fn installed() -> (Environment, ClusterModel) {
        let mut env = Environment::new(
            DateTime::UNIX_EPOCH,
            TimeDelta::hours(1),
            Box::new(FixedHorizontalPlugin::new(0)),
            7,
        )
        .unwrap();
        let scenario = Scenario {
            cluster: ClusterConfig {
                initial_replicas: 2,
                launch_delay: std::time::Duration::from_secs(10),
                ..ClusterConfig::default()
            },
            ..Scenario::default()
        };
        let cluster = ClusterModel::install(&mut env, &scenario, &Partition::from("cluster-1")).unwrap();
        (env, cluster)
    }

    #[test]
    fn initial_replicas_launch_and_activate() {
        let (mut env, cluster) = installed();
        env.run().unwrap();

        assert_eq!(env.stock(cluster.replicas_active).unwrap().count(), 2);
        assert_eq!(env.stock(cluster.replicas_launching).unwrap().count(), 0);
        assert_eq!(env.stock(cluster.replicas_desired).unwrap().count(), 2);

        // Two start_replica at t0, two finish_launching at t0 + 10s.
        assert_eq!(env.trace().lines_of_kind("start_replica").count(), 2);
        let finishes: Vec<i64> = env
            .trace()
            .lines_of_kind("finish_launching")
            .map(|l| l.at_nanos)
            .collect();
        assert_eq!(finishes, vec![10_000_000_000, 10_000_000_000]);
    }

    #[test]
    fn population_counts_cover_the_lifecycle_stocks() {
        let (mut env, cluster) = installed();
        env.run().unwrap();

        assert_eq!(cluster.scalable_population(&env).unwrap(), 2);
        assert_eq!(cluster.live_population(&env).unwrap(), 2);
    }

    #[test]
    fn desired_tokens_drive_launches_one_for_one() {
        let (mut env, cluster) = installed();
        let begin = env.start_time();
        env.schedule(Movement::new(
            MovementKind("increase_desired"),
            begin + TimeDelta::seconds(30),
            cluster.desired_source,
            cluster.replicas_desired,
        ))
        .unwrap();
        env.run().unwrap();

        assert_eq!(env.stock(cluster.replicas_active).unwrap().count(), 3);
        assert_eq!(env.stock(cluster.replica_source).unwrap().generated_count(), 3);
    }
}
