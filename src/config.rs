use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use serde_with::{DurationSecondsWithFrac, serde_as};
use strum_macros::{Display, EnumString};

use crate::error::{ScenarioError, SimResult, SystemError};

/// Durations longer than this are almost certainly a unit mistake in the
/// scenario document.
const MAX_DURATION: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// A complete scenario document.
///
/// Scenarios arrive as JSON (front-ends may translate from YAML); every run
/// goes through [`Scenario::validate`] before anything is scheduled.
///
/// ```
/// # use scalesim::config::Scenario;
/// let scenario: Scenario = serde_json::from_str(
///     r#"{
///         "simulation": { "duration": 3600, "tick_interval": 60, "random_seed": 7 },
///         "traffic": { "pulses": [ { "at": 120, "count": 50 } ] },
///         "cluster": {},
///         "autoscaler": { "kind": "hpa", "yaml": "" }
///     }"#,
/// )
/// .unwrap();
/// assert!(scenario.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub traffic: TrafficConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
    pub autoscaler: AutoscalerConfig,
}

impl Scenario {
    pub fn from_json(doc: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_json::from_str(doc)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.simulation.validate()?;
        self.traffic.validate(self.simulation.duration)?;
        self.cluster.validate()?;
        self.autoscaler.validate()?;
        Ok(())
    }
}

// ================================================================================================
// Simulation
// ================================================================================================

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Total simulated span. The terminate event fires at `start + duration`.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub duration: Duration,

    /// Autoscaler period; ticks land at `start + k * tick_interval + 1ns`.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub tick_interval: Duration,

    /// Seeds the environment RNG (traffic jitter, random stat scrapes).
    #[serde(default)]
    pub random_seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(3600),
            tick_interval: Duration::from_secs(60),
            random_seed: 0,
        }
    }
}

impl SimulationConfig {
    fn validate(&self) -> Result<(), ScenarioError> {
        if self.duration.is_zero() || self.duration > MAX_DURATION {
            return Err(ScenarioError::NonPositiveDuration(
                humantime::format_duration(self.duration).to_string(),
            ));
        }
        if self.tick_interval.is_zero() || self.tick_interval > self.duration {
            return Err(ScenarioError::TickIntervalTooLong {
                tick: humantime::format_duration(self.tick_interval).to_string(),
                duration: humantime::format_duration(self.duration).to_string(),
            });
        }
        Ok(())
    }
}

// ================================================================================================
// Traffic
// ================================================================================================

/// A burst of `count` requests arriving `at` after simulation start.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficPulse {
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub at: Duration,
    pub count: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrafficConfig {
    /// Explicit arrival pulses.
    #[serde(default)]
    pub pulses: Vec<TrafficPulse>,

    /// Optional background arrival process: this many requests per second,
    /// spread uniformly (seeded) over the whole run.
    #[serde(default)]
    pub uniform_rate_rps: Option<f64>,
}

impl TrafficConfig {
    fn validate(&self, duration: Duration) -> Result<(), ScenarioError> {
        for pulse in &self.pulses {
            if pulse.at > duration {
                return Err(ScenarioError::InvalidTraffic(format!(
                    "pulse at {} lies past the simulation end",
                    humantime::format_duration(pulse.at)
                )));
            }
        }
        if let Some(rate) = self.uniform_rate_rps
            && (!rate.is_finite() || rate < 0.0)
        {
            return Err(ScenarioError::InvalidTraffic(format!(
                "uniform_rate_rps must be a non-negative number, got {rate}"
            )));
        }
        Ok(())
    }
}

// ================================================================================================
// Cluster
// ================================================================================================

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Time a replica spends in `ReplicasLaunching`.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub launch_delay: Duration,

    /// Time a replica spends in `ReplicasTerminating`.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub terminate_delay: Duration,

    /// Replicas requested at simulation start, before any tick has fired.
    pub initial_replicas: u32,

    pub max_rps_per_replica: u32,

    pub cpu_capacity_per_replica_millis: f64,

    pub cpu_demand_per_request_millis: f64,

    /// Time a request occupies its replica before completing.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub request_service_time: Duration,

    /// Backoff between routing attempts while no replica is active.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub request_retry_interval: Duration,

    /// Attempts before a buffered request moves to `RequestsFailed`.
    pub request_max_retries: u32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            launch_delay: Duration::from_secs(10),
            terminate_delay: Duration::from_secs(10),
            initial_replicas: 0,
            max_rps_per_replica: 100,
            cpu_capacity_per_replica_millis: 1000.0,
            cpu_demand_per_request_millis: 100.0,
            request_service_time: Duration::from_secs(1),
            request_retry_interval: Duration::from_secs(1),
            request_max_retries: 3,
        }
    }
}

impl ClusterConfig {
    fn validate(&self) -> Result<(), ScenarioError> {
        if self.launch_delay > MAX_DURATION || self.terminate_delay > MAX_DURATION {
            return Err(ScenarioError::InvalidCluster(
                "launch/terminate delays out of range".to_string(),
            ));
        }
        if self.cpu_capacity_per_replica_millis <= 0.0
            || !self.cpu_capacity_per_replica_millis.is_finite()
        {
            return Err(ScenarioError::InvalidCluster(format!(
                "cpu_capacity_per_replica_millis must be positive, got {}",
                self.cpu_capacity_per_replica_millis
            )));
        }
        if self.cpu_demand_per_request_millis < 0.0
            || !self.cpu_demand_per_request_millis.is_finite()
        {
            return Err(ScenarioError::InvalidCluster(format!(
                "cpu_demand_per_request_millis must be non-negative, got {}",
                self.cpu_demand_per_request_millis
            )));
        }
        if self.request_service_time.is_zero() {
            return Err(ScenarioError::InvalidCluster(
                "request_service_time must be positive".to_string(),
            ));
        }
        if self.request_retry_interval.is_zero() {
            return Err(ScenarioError::InvalidCluster(
                "request_retry_interval must be positive".to_string(),
            ));
        }
        if self.request_max_retries == 0 {
            return Err(ScenarioError::InvalidCluster(
                "request_max_retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ================================================================================================
// Autoscaler
// ================================================================================================

/// Which policy family drives the cluster.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum AutoscalerKind {
    #[default]
    #[strum(serialize = "hpa")]
    Hpa,

    #[strum(serialize = "vpa")]
    Vpa,

    #[strum(serialize = "kpa")]
    Kpa,
}

impl AutoscalerKind {
    /// The type string announced to the plugin; must match what the plugin
    /// binary serves.
    pub fn plugin_type_id(&self) -> &'static str {
        match self {
            AutoscalerKind::Hpa => "hpa.v2beta2.autoscaling.k8s.io",
            AutoscalerKind::Vpa => "vpa.v2beta2.autoscaling.k8s.io",
            AutoscalerKind::Kpa => "kpa.autoscaling.knative.dev",
        }
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self, AutoscalerKind::Vpa)
    }
}

/// How the ticktock scrapes replica stats.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum StatSource {
    /// Report every active replica.
    #[default]
    AllReplicas,

    /// Report one replica chosen uniformly at random as a proxy for the
    /// whole, matching production Knative scraping.
    RandomReplica,
}

#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoscalerConfig {
    pub kind: AutoscalerKind,

    /// Policy configuration passed verbatim to the plugin.
    #[serde(default)]
    pub yaml: String,

    #[serde(default)]
    pub stat_source: StatSource,

    /// Cadence of the mean-CPU sampling ticktock. Defaults to the autoscaler
    /// tick interval.
    #[serde(default)]
    #[serde_as(as = "Option<DurationSecondsWithFrac<f64>>")]
    pub cpu_sample_interval: Option<Duration>,
}

impl AutoscalerConfig {
    fn validate(&self) -> Result<(), ScenarioError> {
        if let Some(interval) = self.cpu_sample_interval
            && interval.is_zero()
        {
            return Err(ScenarioError::InvalidAutoscaler(
                "cpu_sample_interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Bridges scenario durations into the logical clock's representation.
pub(crate) fn to_delta(duration: Duration) -> SimResult<TimeDelta> {
    TimeDelta::from_std(duration)
        .map_err(|e| SystemError::TimeConversion(format!("{duration:?}: {e}")).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Scenario {
        Scenario {
            simulation: SimulationConfig::default(),
            traffic: TrafficConfig::default(),
            cluster: ClusterConfig::default(),
            autoscaler: AutoscalerConfig::default(),
        }
    }

    #[test]
    fn default_scenario_is_valid() {
        assert!(scenario().validate().is_ok());
    }

    #[test]
    fn zero_duration_is_rejected() {
        let mut subject = scenario();
        subject.simulation.duration = Duration::ZERO;
        assert!(matches!(
            subject.validate(),
            Err(ScenarioError::NonPositiveDuration(_))
        ));
    }

    #[test]
    fn tick_longer_than_run_is_rejected() {
        let mut subject = scenario();
        subject.simulation.tick_interval = Duration::from_secs(7200);
        assert!(matches!(
            subject.validate(),
            Err(ScenarioError::TickIntervalTooLong { .. })
        ));
    }

    #[test]
    fn pulse_past_the_end_is_rejected() {
        let mut subject = scenario();
        subject.traffic.pulses.push(TrafficPulse {
            at: Duration::from_secs(7200),
            count: 1,
        });
        assert!(matches!(
            subject.validate(),
            Err(ScenarioError::InvalidTraffic(_))
        ));
    }

    #[test]
    fn zero_retries_are_rejected() {
        let mut subject = scenario();
        subject.cluster.request_max_retries = 0;
        assert!(matches!(
            subject.validate(),
            Err(ScenarioError::InvalidCluster(_))
        ));
    }

    #[test]
    fn scenario_round_trips_through_json() {
        let mut subject = scenario();
        subject.autoscaler.kind = AutoscalerKind::Kpa;
        subject.traffic.uniform_rate_rps = Some(2.5);

        let doc = serde_json::to_string(&subject).unwrap();
        let parsed = Scenario::from_json(&doc).unwrap();
        assert_eq!(parsed.autoscaler.kind, AutoscalerKind::Kpa);
        assert_eq!(parsed.traffic.uniform_rate_rps, Some(2.5));
    }

    #[test]
    fn kind_maps_to_plugin_type_ids() {
        assert_eq!(
            AutoscalerKind::Hpa.plugin_type_id(),
            "hpa.v2beta2.autoscaling.k8s.io"
        );
        assert!(AutoscalerKind::Vpa.is_vertical());
        assert!(!AutoscalerKind::Kpa.is_vertical());
    }
}
