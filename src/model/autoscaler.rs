use chrono::TimeDelta;
use rand::Rng;
use tracing::{debug, info};

use crate::{
    config::{AutoscalerKind, Scenario, StatSource, to_delta},
    error::SimResult,
    model::{cluster::{ClusterModel, reconcile_desired}, kind::AUTOSCALER_TICK, replica::ReplicaStat},
    plugin::bridge::{AutoscalerSpec, ObjectEvent, Partition, PluginObject, PluginStat},
    simulator::{
        entity::{Entity, EntityKind, EntityName, TickToken},
        environment::{EnvCtx, Environment, StockHook, nanos_of},
        movement::Movement,
        stock::{Stock, StockId},
    },
};

/// The autoscaler ticktock: a self-loop stock whose arrivals each run one
/// policy iteration (scrape → report → decide → reconcile).
pub struct AutoscalerModel {
    pub ticktock: StockId,
    pub partition: Partition,
}

impl AutoscalerModel {
    /// Announces the autoscaler to the plugin and pre-schedules every tick.
    ///
    /// Ticks land at `start + k * tick_interval + 1ns` for all `k` with a
    /// tick strictly before the halt time. The 1ns offset makes ticks sort
    /// after any movement scheduled exactly on the interval boundary.
    pub fn install(
        env: &mut Environment,
        scenario: &Scenario,
        cluster: &ClusterModel,
        partition: &Partition,
    ) -> SimResult<Self> {
        let ticktock = env.add_stock(Stock::through("Autoscaler Ticktock", EntityKind::Autoscaler));
        env.stock_mut(ticktock)?
            .add(Entity::Token(TickToken::new(
                "autoscaler",
                EntityKind::Autoscaler,
            )))
            .map_err(crate::error::SimError::from)?;

        let begin = env.start_time();
        env.plugin().event(
            partition,
            nanos_of(begin),
            ObjectEvent::Create,
            &PluginObject::Autoscaler(AutoscalerSpec {
                kind: scenario.autoscaler.kind.plugin_type_id().to_string(),
                yaml: scenario.autoscaler.yaml.clone(),
            }),
        )?;
        info!(kind = %scenario.autoscaler.kind, %partition, "autoscaler registered with plugin");

        env.register_hook(
            ticktock,
            Box::new(AutoscalerTicktockHook {
                partition: partition.clone(),
                cluster: *cluster,
                kind: scenario.autoscaler.kind,
                stat_source: scenario.autoscaler.stat_source,
            }),
        );

        let tick_interval = to_delta(scenario.simulation.tick_interval)?;
        let offset = TimeDelta::nanoseconds(1);
        let mut at = begin + tick_interval + offset;
        while at < env.halt_time() {
            env.schedule(
                Movement::new(AUTOSCALER_TICK, at, ticktock, ticktock).carrying("autoscaler"),
            )?;
            at += tick_interval;
        }

        Ok(Self {
            ticktock,
            partition: partition.clone(),
        })
    }
}

/// One policy iteration, run by each `autoscaler_tick` arrival.
///
/// The policy's view of the cluster is whatever this tick scrapes; between
/// ticks it is frozen, matching the periodic sampling of production
/// autoscalers. A plugin failure aborts the iteration (recorded as a tick
/// note) and the next tick retries.
struct AutoscalerTicktockHook {
    partition: Partition,
    cluster: ClusterModel,
    kind: AutoscalerKind,
    stat_source: StatSource,
}

impl StockHook for AutoscalerTicktockHook {
    fn on_add(
        &mut self,
        ctx: &mut EnvCtx<'_>,
        _movement: &Movement,
        _entity: &EntityName,
    ) -> SimResult<()> {
        let now = ctx.scheduler.current_movement_time();
        let at_nanos = nanos_of(now);

        let stats = self.scrape(ctx)?;
        ctx.plugin.stat(&self.partition, &stats)?;

        if self.kind.is_vertical() {
            let recommendations = ctx
                .plugin
                .vertical_recommendation(&self.partition, at_nanos)?;
            let mut resized = 0usize;
            for rec in &recommendations {
                let target = EntityName::from(rec.pod_name.as_str());
                if let Some(replica) = ctx
                    .stocks
                    .get_mut(self.cluster.replicas_active)?
                    .entity_mut(&target)
                    .and_then(|e| e.as_replica_mut())
                {
                    replica.total_cpu_capacity_millis = f64::from(rec.target_millis);
                    resized += 1;
                }
            }
            debug!(recommended = recommendations.len(), resized, "vertical reconciliation");
            ctx.notes.push(format!("resized {resized} replicas"));
        } else {
            let desired = ctx
                .plugin
                .horizontal_recommendation(&self.partition, at_nanos)?;
            let delta = reconcile_desired(ctx, &self.cluster, desired as u64)?;
            debug!(desired, delta, "horizontal reconciliation");
            ctx.notes.push(format!("desired = {desired}"));
        }
        Ok(())
    }
}

impl AutoscalerTicktockHook {
    /// Reads stats from the active replicas: all of them, or one chosen
    /// uniformly at random as a proxy for the whole.
    fn scrape(&self, ctx: &mut EnvCtx<'_>) -> SimResult<Vec<PluginStat>> {
        let now = ctx.scheduler.current_movement_time();

        let mut snapshots: Vec<ReplicaStat> = Vec::new();
        for e in ctx.stocks.get(self.cluster.replicas_active)?.entities() {
            if let Some(replica) = e.as_replica() {
                snapshots.push(replica.stat(ctx.stocks, now)?);
            }
        }

        let chosen: Vec<ReplicaStat> = match self.stat_source {
            StatSource::AllReplicas => snapshots,
            StatSource::RandomReplica => {
                if snapshots.is_empty() {
                    Vec::new()
                } else {
                    let index = ctx.rng.random_range(0..snapshots.len());
                    vec![snapshots.swap_remove(index)]
                }
            }
        };

        Ok(chosen.iter().flat_map(ReplicaStat::to_plugin_stats).collect())
    }
}
