mod common;

use std::time::Duration;

use scalesim::plugin::fixtures::FixedHorizontalPlugin;

const MINUTE_NANOS: i64 = 60_000_000_000;
const SECOND_NANOS: i64 = 1_000_000_000;

/// A fixed policy asking for three replicas from an empty cluster: three
/// `start_replica` movements on the first tick, three `finish_launching`
/// movements one launch delay later, and a stable population afterwards.
#[test]
fn fixed_recommendation_launches_three_replicas() {
    let scenario = common::scenario(Duration::from_secs(600), Duration::from_secs(60));
    let mut sim = common::simulation(scenario, Box::new(FixedHorizontalPlugin::new(3)));
    sim.run().unwrap();

    let starts: Vec<i64> = sim
        .env
        .trace()
        .lines_of_kind("start_replica")
        .map(|l| l.at_nanos)
        .collect();
    assert_eq!(starts, vec![MINUTE_NANOS + 1; 3]);

    let finishes: Vec<i64> = sim
        .env
        .trace()
        .lines_of_kind("finish_launching")
        .map(|l| l.at_nanos)
        .collect();
    assert_eq!(finishes, vec![MINUTE_NANOS + 10 * SECOND_NANOS + 1; 3]);

    assert_eq!(sim.env.stock(sim.cluster.replicas_active).unwrap().count(), 3);
    assert_eq!(sim.env.stock(sim.cluster.replicas_desired).unwrap().count(), 3);
    assert_eq!(sim.cluster.live_population(&sim.env).unwrap(), 3);

    // Later ticks hold steady: exactly three launches over the whole run.
    assert_eq!(
        sim.env.stock(sim.cluster.replica_source).unwrap().generated_count(),
        3
    );
    common::assert_kind_safety(&sim);
}

/// Replica pods are announced to the plugin when they become active.
#[test]
fn activations_reach_the_plugin_as_pod_creates() {
    let scenario = common::scenario(Duration::from_secs(300), Duration::from_secs(60));
    let mut sim = common::simulation(scenario, Box::new(FixedHorizontalPlugin::new(2)));
    sim.run().unwrap();

    // The fixture cannot be downcast through the trait object, so assert via
    // the trace: every activation carries a replica identifier.
    let activated: Vec<&str> = sim
        .env
        .trace()
        .lines_of_kind("finish_launching")
        .map(|l| l.identifier.as_str())
        .collect();
    assert_eq!(activated, vec!["replica-1", "replica-2"]);
}
