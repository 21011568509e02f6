use chrono::TimeDelta;

use crate::{
    config::{Scenario, to_delta},
    error::SimResult,
    model::{cluster::ClusterModel, kind::CPU_UTILIZATION_TICK},
    simulator::{
        entity::{Entity, EntityKind, EntityName, TickToken},
        environment::{EnvCtx, Environment, StockHook},
        movement::Movement,
        stock::{Stock, StockId},
        trace::CpuUtilizationSample,
    },
};

/// The CPU sampling ticktock: each arrival appends the mean utilization
/// across the active replicas to the environment's utilization log.
pub struct CpuMonitorModel {
    pub ticktock: StockId,
}

impl CpuMonitorModel {
    pub fn install(
        env: &mut Environment,
        scenario: &Scenario,
        cluster: &ClusterModel,
    ) -> SimResult<Self> {
        let ticktock = env.add_stock(Stock::through(
            "Cpu Utilization Ticktock",
            EntityKind::CpuMonitor,
        ));
        env.stock_mut(ticktock)?
            .add(Entity::Token(TickToken::new(
                "cpu-monitor",
                EntityKind::CpuMonitor,
            )))
            .map_err(crate::error::SimError::from)?;

        env.register_hook(
            ticktock,
            Box::new(CpuUtilizationHook { cluster: *cluster }),
        );

        let interval = to_delta(
            scenario
                .autoscaler
                .cpu_sample_interval
                .unwrap_or(scenario.simulation.tick_interval),
        )?;
        let offset = TimeDelta::nanoseconds(1);
        let mut at = env.start_time() + interval + offset;
        while at < env.halt_time() {
            env.schedule(
                Movement::new(CPU_UTILIZATION_TICK, at, ticktock, ticktock).carrying("cpu-monitor"),
            )?;
            at += interval;
        }

        Ok(Self { ticktock })
    }
}

struct CpuUtilizationHook {
    cluster: ClusterModel,
}

impl StockHook for CpuUtilizationHook {
    fn on_add(
        &mut self,
        ctx: &mut EnvCtx<'_>,
        _movement: &Movement,
        _entity: &EntityName,
    ) -> SimResult<()> {
        let now = ctx.scheduler.current_movement_time();

        let mut total_percent = 0.0;
        let mut active = 0u32;
        for e in ctx.stocks.get(self.cluster.replicas_active)?.entities() {
            if let Some(replica) = e.as_replica() {
                total_percent += replica.stat(ctx.stocks, now)?.cpu_utilization_percent();
                active += 1;
            }
        }

        if active > 0 {
            ctx.utilization.append(CpuUtilizationSample {
                cpu_percent: total_percent / f64::from(active),
                calculated_at: now,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use crate::{
        config::{ClusterConfig, SimulationConfig},
        plugin::bridge::Partition,
        plugin::fixtures::FixedHorizontalPlugin,
    };

    use super::*;

    #[test]
    fn samples_mean_utilization_only_while_replicas_are_active() {
        let mut env = Environment::new(
            DateTime::UNIX_EPOCH,
            TimeDelta::seconds(120),
            Box::new(FixedHorizontalPlugin::new(0)),
            7,
        )
        .unwrap();
        let scenario = Scenario {
            simulation: SimulationConfig {
                duration: std::time::Duration::from_secs(120),
                tick_interval: std::time::Duration::from_secs(30),
                random_seed: 7,
            },
            cluster: ClusterConfig {
                initial_replicas: 1,
                launch_delay: std::time::Duration::from_secs(45),
                ..ClusterConfig::default()
            },
            ..Scenario::default()
        };
        let partition = Partition::from("cluster-1");
        let cluster = ClusterModel::install(&mut env, &scenario, &partition).unwrap();
        let monitor = CpuMonitorModel::install(&mut env, &scenario, &cluster).unwrap();
        env.run().unwrap();

        assert!(env.stock(monitor.ticktock).unwrap().count() == 1);
        // Ticks at 30s and 60s and 90s; the replica activates at 45s, so the
        // 30s sample sees an empty cluster and is skipped.
        let samples = env.utilization().samples();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].cpu_percent, 0.0);
        assert_eq!(
            samples[0].calculated_at,
            DateTime::UNIX_EPOCH + TimeDelta::seconds(60) + TimeDelta::nanoseconds(1)
        );
    }
}
