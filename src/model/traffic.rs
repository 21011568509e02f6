use chrono::TimeDelta;
use rand::Rng;
use tracing::debug;

use crate::{
    config::{TrafficConfig, to_delta},
    error::SimResult,
    model::{cluster::ClusterModel, kind::REQUEST_ARRIVAL},
    simulator::{environment::Environment, movement::Movement},
};

/// Pre-schedules every request arrival of the run.
///
/// Pulses land exactly where the profile says; the optional uniform process
/// spreads `rate * duration` arrivals over the whole run using the
/// environment's seeded RNG, so a given seed always produces the same
/// traffic.
pub fn install(env: &mut Environment, traffic: &TrafficConfig, cluster: &ClusterModel) -> SimResult<()> {
    let begin = env.start_time();

    for pulse in &traffic.pulses {
        let at = begin + to_delta(pulse.at)?;
        for _ in 0..pulse.count {
            env.schedule(Movement::new(
                REQUEST_ARRIVAL,
                at,
                cluster.traffic_source,
                cluster.requests_buffered,
            ))?;
        }
    }

    if let Some(rate) = traffic.uniform_rate_rps
        && rate > 0.0
    {
        let span = env.halt_time() - begin;
        let span_nanos = span.num_nanoseconds().unwrap_or(i64::MAX);
        let total = (rate * span.num_seconds() as f64).round() as u64;
        debug!(rate, total, "spreading uniform arrivals");
        for _ in 0..total {
            let offset = env.rng_mut().random_range(0..span_nanos);
            env.schedule(Movement::new(
                REQUEST_ARRIVAL,
                begin + TimeDelta::nanoseconds(offset),
                cluster.traffic_source,
                cluster.requests_buffered,
            ))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use crate::{
        config::{Scenario, TrafficPulse},
        plugin::bridge::Partition,
        plugin::fixtures::FixedHorizontalPlugin,
    };

    use super::*;

    fn environment() -> (Environment, ClusterModel) {
        let mut env = Environment::new(
            DateTime::UNIX_EPOCH,
            TimeDelta::seconds(600),
            Box::new(FixedHorizontalPlugin::new(0)),
            7,
        )
        .unwrap();
        let scenario = Scenario::default();
        let cluster = ClusterModel::install(&mut env, &scenario, &Partition::from("cluster-1")).unwrap();
        (env, cluster)
    }

    #[test]
    fn pulses_arrive_at_their_configured_instant() {
        let (mut env, cluster) = environment();
        let traffic = TrafficConfig {
            pulses: vec![TrafficPulse {
                at: std::time::Duration::from_secs(30),
                count: 4,
            }],
            uniform_rate_rps: None,
        };
        install(&mut env, &traffic, &cluster).unwrap();
        env.run().unwrap();

        let arrivals: Vec<i64> = env
            .trace()
            .lines_of_kind("request_arrival")
            .map(|l| l.at_nanos)
            .collect();
        assert_eq!(arrivals, vec![30_000_000_000; 4]);
        assert_eq!(env.stock(cluster.traffic_source).unwrap().generated_count(), 4);
    }

    #[test]
    fn uniform_traffic_is_deterministic_per_seed() {
        let count = |seed: u64| -> Vec<i64> {
            let mut env = Environment::new(
                DateTime::UNIX_EPOCH,
                TimeDelta::seconds(600),
                Box::new(FixedHorizontalPlugin::new(0)),
                seed,
            )
            .unwrap();
            let scenario = Scenario::default();
            let cluster =
                ClusterModel::install(&mut env, &scenario, &Partition::from("cluster-1")).unwrap();
            let traffic = TrafficConfig {
                pulses: vec![],
                uniform_rate_rps: Some(0.05),
            };
            install(&mut env, &traffic, &cluster).unwrap();
            env.run().unwrap();
            env.trace()
                .lines_of_kind("request_arrival")
                .map(|l| l.at_nanos)
                .collect()
        };

        let first = count(11);
        assert_eq!(first.len(), 30);
        assert_eq!(first, count(11));
        assert_ne!(first, count(12));
    }
}
