mod common;

use std::time::Duration;

use scalesim::{config::AutoscalerKind, plugin::fixtures::FixedVerticalPlugin};

/// A vertical policy resizes active replicas in place: CPU capacity follows
/// the recommendation, the population does not change.
#[test]
fn vertical_recommendation_resizes_active_replicas() {
    let mut scenario = common::scenario(Duration::from_secs(300), Duration::from_secs(60));
    scenario.autoscaler.kind = AutoscalerKind::Vpa;
    scenario.cluster.initial_replicas = 2;
    scenario.cluster.launch_delay = Duration::from_secs(5);
    scenario.cluster.cpu_capacity_per_replica_millis = 500.0;

    let mut sim = common::simulation(scenario, Box::new(FixedVerticalPlugin::new(800)));
    sim.run().unwrap();

    let capacities: Vec<f64> = sim
        .env
        .stock(sim.cluster.replicas_active)
        .unwrap()
        .entities()
        .filter_map(|e| e.as_replica())
        .map(|r| r.total_cpu_capacity_millis)
        .collect();
    assert_eq!(capacities, vec![800.0, 800.0]);

    // Vertical mode never touches the desired ledger.
    assert_eq!(sim.env.trace().lines_of_kind("increase_desired").count(), 2);
    assert_eq!(sim.env.trace().lines_of_kind("decrease_desired").count(), 0);
    assert_eq!(sim.env.stock(sim.cluster.replicas_active).unwrap().count(), 2);

    let resized_note = sim
        .env
        .trace()
        .lines_of_kind("autoscaler_tick")
        .next()
        .unwrap();
    assert!(resized_note.notes.iter().any(|n| n == "resized 2 replicas"));
}
