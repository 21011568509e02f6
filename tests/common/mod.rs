#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use scalesim::{
    Scenario, Simulation, SimulationBuilder,
    config::{ClusterConfig, SimulationConfig},
    plugin::bridge::Plugin,
    simulator::trace::Trace,
};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_test_writer()
            .init();
    });
}

pub fn scenario(duration: Duration, tick_interval: Duration) -> Scenario {
    Scenario {
        simulation: SimulationConfig {
            duration,
            tick_interval,
            random_seed: 7,
        },
        cluster: ClusterConfig {
            launch_delay: Duration::from_secs(10),
            terminate_delay: Duration::from_secs(10),
            ..ClusterConfig::default()
        },
        ..Scenario::default()
    }
}

pub fn simulation(scenario: Scenario, plugin: Box<dyn Plugin>) -> Simulation {
    init_tracing();
    SimulationBuilder::new()
        .with_scenario(scenario)
        .with_plugin(plugin)
        .build()
        .expect("scenario should build")
}

/// Time monotonicity: consecutive executed movements never step backwards.
pub fn assert_time_monotone(trace: &Trace) {
    for window in trace.lines().windows(2) {
        assert!(
            window[0].at_nanos <= window[1].at_nanos,
            "time went backwards: {} then {}",
            window[0].at_nanos,
            window[1].at_nanos
        );
    }
}

/// Halt boundary: nothing executes past the terminate event.
pub fn assert_halt_boundary(trace: &Trace, halt_nanos: i64) {
    for line in trace.lines() {
        assert!(
            line.at_nanos <= halt_nanos,
            "movement '{}' executed past halt at {}",
            line.kind,
            line.at_nanos
        );
    }
}

/// Kind safety: every entity sits in a stock that stocks its kind.
pub fn assert_kind_safety(simulation: &Simulation) {
    let cluster = simulation.cluster;
    for id in [
        cluster.requests_buffered,
        cluster.requests_failed,
        cluster.replicas_launching,
        cluster.replicas_active,
        cluster.replicas_terminating,
        cluster.replicas_terminated,
        cluster.replicas_desired,
        cluster.desired_sink,
    ] {
        let stock = simulation.env.stock(id).expect("cluster stock");
        for entity in stock.entities() {
            assert_eq!(
                entity.kind(),
                stock.kind_stocked(),
                "entity {} of kind {} sits in stock {}",
                entity.name(),
                entity.kind(),
                stock.name()
            );
        }
    }
}
