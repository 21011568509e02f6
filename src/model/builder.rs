use chrono::{DateTime, Utc};

use crate::{
    config::{Scenario, to_delta},
    error::{ScenarioError, SimResult},
    model::{
        autoscaler::AutoscalerModel, cluster::ClusterModel, cpu_utilization::CpuMonitorModel,
        traffic,
    },
    plugin::bridge::{Partition, Plugin},
    simulator::environment::Environment,
};

/// Assembles a runnable simulation from a validated scenario and a policy.
///
/// ```no_run
/// # use scalesim::{Scenario, SimulationBuilder};
/// # use scalesim::plugin::fixtures::FixedHorizontalPlugin;
/// let mut simulation = SimulationBuilder::new()
///     .with_scenario(Scenario::default())
///     .with_plugin(Box::new(FixedHorizontalPlugin::new(3)))
///     .build()?;
/// simulation.run()?;
/// println!("{}", simulation.env.trace());
/// # Ok::<(), scalesim::error::SimError>(())
/// ```
#[derive(Default)]
pub struct SimulationBuilder {
    scenario: Option<Scenario>,
    plugin: Option<Box<dyn Plugin>>,
    start_at: Option<DateTime<Utc>>,
    partition: Option<Partition>,
}

impl SimulationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = Some(scenario);
        self
    }

    pub fn with_plugin(mut self, plugin: Box<dyn Plugin>) -> Self {
        self.plugin = Some(plugin);
        self
    }

    /// Logical start instant; defaults to the Unix epoch.
    pub fn with_start_at(mut self, start_at: DateTime<Utc>) -> Self {
        self.start_at = Some(start_at);
        self
    }

    pub fn with_partition(mut self, partition: impl Into<Partition>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    pub fn build(self) -> SimResult<Simulation> {
        let scenario = self.scenario.ok_or(ScenarioError::Missing("scenario"))?;
        let plugin = self.plugin.ok_or(ScenarioError::Missing("plugin"))?;
        scenario.validate()?;

        let start_at = self.start_at.unwrap_or(DateTime::UNIX_EPOCH);
        let partition = self.partition.unwrap_or_else(|| Partition::from("cluster-1"));

        let mut env = Environment::new(
            start_at,
            to_delta(scenario.simulation.duration)?,
            plugin,
            scenario.simulation.random_seed,
        )?;

        let cluster = ClusterModel::install(&mut env, &scenario, &partition)?;
        let autoscaler = AutoscalerModel::install(&mut env, &scenario, &cluster, &partition)?;
        let cpu_monitor = CpuMonitorModel::install(&mut env, &scenario, &cluster)?;
        traffic::install(&mut env, &scenario.traffic, &cluster)?;

        Ok(Simulation {
            env,
            cluster,
            autoscaler,
            cpu_monitor,
        })
    }
}

/// A fully wired run: the environment plus handles into the cluster graph.
pub struct Simulation {
    pub env: Environment,
    pub cluster: ClusterModel,
    pub autoscaler: AutoscalerModel,
    pub cpu_monitor: CpuMonitorModel,
}

impl Simulation {
    pub fn run(&mut self) -> SimResult<()> {
        self.env.run()
    }

    /// Conservation check over the request pipeline:
    /// `generated == completed + failed + in flight`.
    pub fn request_conservation(&self) -> SimResult<(u64, u64)> {
        let generated = self.env.stock(self.cluster.traffic_source)?.generated_count();
        let failed = self.env.stock(self.cluster.requests_failed)?.count();
        let buffered = self.env.stock(self.cluster.requests_buffered)?.count();

        let mut completed = 0;
        let mut processing = 0;
        for stage in [
            self.cluster.replicas_launching,
            self.cluster.replicas_active,
            self.cluster.replicas_terminating,
        ] {
            for e in self.env.stock(stage)?.entities() {
                if let Some(replica) = e.as_replica() {
                    completed += self.env.stock(replica.requests_complete())?.count();
                    processing += self.env.stock(replica.requests_processing())?.count();
                }
            }
        }
        // Terminated replicas keep their completion sinks.
        for e in self.env.stock(self.cluster.replicas_terminated)?.entities() {
            if let Some(replica) = e.as_replica() {
                completed += self.env.stock(replica.requests_complete())?.count();
                processing += self.env.stock(replica.requests_processing())?.count();
            }
        }

        Ok((generated, completed + failed + buffered + processing))
    }
}

#[cfg(test)]
mod tests {
    use crate::{error::SimError, plugin::fixtures::FixedHorizontalPlugin};

    use super::*;

    #[test]
    fn build_requires_scenario_and_plugin() {
        let missing_plugin = SimulationBuilder::new()
            .with_scenario(Scenario::default())
            .build();
        assert!(matches!(
            missing_plugin.err(),
            Some(SimError::Scenario(ScenarioError::Missing("plugin")))
        ));

        let missing_scenario = SimulationBuilder::new()
            .with_plugin(Box::new(FixedHorizontalPlugin::new(0)))
            .build();
        assert!(matches!(
            missing_scenario.err(),
            Some(SimError::Scenario(ScenarioError::Missing("scenario")))
        ));
    }

    #[test]
    fn invalid_scenario_is_rejected_before_the_run() {
        let mut scenario = Scenario::default();
        scenario.simulation.tick_interval = std::time::Duration::ZERO;

        let result = SimulationBuilder::new()
            .with_scenario(scenario)
            .with_plugin(Box::new(FixedHorizontalPlugin::new(0)))
            .build();
        assert!(matches!(result.err(), Some(SimError::Scenario(_))));
    }
}
