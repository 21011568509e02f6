mod common;

use std::time::Duration;

use scalesim::{config::TrafficPulse, plugin::fixtures::FixedHorizontalPlugin};

const SECOND_NANOS: i64 = 1_000_000_000;

/// A single request into an empty cluster retries on its backoff loop and
/// lands in `RequestsFailed` after `retry_interval * max_retries`.
#[test]
fn lone_request_fails_after_retry_budget() {
    let mut scenario = common::scenario(Duration::from_secs(60), Duration::from_secs(30));
    scenario.traffic.pulses.push(TrafficPulse {
        at: Duration::ZERO,
        count: 1,
    });
    scenario.cluster.request_retry_interval = Duration::from_secs(1);
    scenario.cluster.request_max_retries = 3;

    let mut sim = common::simulation(scenario, Box::new(FixedHorizontalPlugin::new(0)));
    sim.run().unwrap();

    // Three backoff laps at 1s, 2s, 3s; the failure fires at the third lap.
    let backoffs: Vec<i64> = sim
        .env
        .trace()
        .lines_of_kind("buffer_backoff")
        .map(|l| l.at_nanos)
        .collect();
    assert_eq!(backoffs, vec![SECOND_NANOS, 2 * SECOND_NANOS, 3 * SECOND_NANOS]);

    let failure = sim
        .env
        .trace()
        .lines_of_kind("fail_request")
        .next()
        .expect("request should fail");
    assert_eq!(failure.at_nanos, 3 * SECOND_NANOS);
    assert_eq!(failure.identifier, "request-1");
    assert!(failure.notes.iter().any(|n| n.contains("no active replicas")));

    // Conservation: generated == completed + failed + in flight.
    assert_eq!(sim.env.stock(sim.cluster.requests_failed).unwrap().count(), 1);
    assert_eq!(sim.env.stock(sim.cluster.requests_buffered).unwrap().count(), 0);
    let (generated, accounted) = sim.request_conservation().unwrap();
    assert_eq!(generated, 1);
    assert_eq!(accounted, 1);

    common::assert_kind_safety(&sim);
}

/// Requests arriving while replicas are active complete one service time
/// after routing.
#[test]
fn requests_complete_on_an_active_cluster() {
    let mut scenario = common::scenario(Duration::from_secs(300), Duration::from_secs(60));
    scenario.cluster.initial_replicas = 1;
    scenario.cluster.launch_delay = Duration::from_secs(5);
    scenario.cluster.request_service_time = Duration::from_secs(2);
    scenario.traffic.pulses.push(TrafficPulse {
        at: Duration::from_secs(30),
        count: 5,
    });

    let mut sim = common::simulation(scenario, Box::new(FixedHorizontalPlugin::new(1)));
    sim.run().unwrap();

    let completions: Vec<i64> = sim
        .env
        .trace()
        .lines_of_kind("complete_request")
        .map(|l| l.at_nanos)
        .collect();
    assert_eq!(completions, vec![32 * SECOND_NANOS; 5]);

    let (generated, accounted) = sim.request_conservation().unwrap();
    assert_eq!(generated, 5);
    assert_eq!(accounted, 5);
    assert_eq!(sim.env.stock(sim.cluster.requests_failed).unwrap().count(), 0);
}
