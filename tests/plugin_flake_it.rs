mod common;

use std::time::Duration;

use scalesim::plugin::fixtures::{FixedHorizontalPlugin, FlakyPlugin};

const MINUTE_NANOS: i64 = 60_000_000_000;

/// A transient policy failure is recorded as a note on the failing tick and
/// does not end the run; every other tick proceeds normally.
#[test]
fn transient_failure_annotates_the_tick_and_continues() {
    let scenario = common::scenario(Duration::from_secs(600), Duration::from_secs(60));
    let plugin = FlakyPlugin::new(FixedHorizontalPlugin::new(3), [5]);

    let mut sim = common::simulation(scenario, Box::new(plugin));
    sim.run().unwrap();

    let ticks: Vec<_> = sim.env.trace().lines_of_kind("autoscaler_tick").collect();
    assert_eq!(ticks.len(), 9);

    let failing = ticks[4];
    assert_eq!(failing.at_nanos, 5 * MINUTE_NANOS + 1);
    assert!(failing.notes.iter().any(|n| n.contains("transient failure")));

    // All other ticks carry their recommendation note.
    for (index, tick) in ticks.iter().enumerate() {
        if index != 4 {
            assert!(tick.notes.iter().any(|n| n == "desired = 3"), "tick {index}");
        }
    }

    // The cluster still converged: the failure cost nothing but one skipped
    // reconciliation.
    assert_eq!(sim.env.stock(sim.cluster.replicas_active).unwrap().count(), 3);
}

/// When the failure hits the first tick, reconciliation is skipped there and
/// the second tick catches up.
#[test]
fn reconciliation_catches_up_on_the_next_tick() {
    let scenario = common::scenario(Duration::from_secs(300), Duration::from_secs(60));
    let plugin = FlakyPlugin::new(FixedHorizontalPlugin::new(2), [1]);

    let mut sim = common::simulation(scenario, Box::new(plugin));
    sim.run().unwrap();

    let starts: Vec<i64> = sim
        .env
        .trace()
        .lines_of_kind("start_replica")
        .map(|l| l.at_nanos)
        .collect();
    // Nothing on tick one; both launches on tick two.
    assert_eq!(starts, vec![2 * MINUTE_NANOS + 1; 2]);
    assert_eq!(sim.env.stock(sim.cluster.replicas_active).unwrap().count(), 2);
}
