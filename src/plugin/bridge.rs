use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::{
    error::PluginError,
    generated::scalesim::plugin::v1 as proto,
    impl_display_inner, impl_from_primitive,
};

// ================================================================================================
// Domain Strong Types (NewTypes)
// ================================================================================================

/// Plugin-side identifier for one simulated autoscaler instance.
///
/// The simulator assigns one partition per cluster; the plugin keys its
/// state by it. The bridge itself is stateless.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition(pub String);
impl_from_primitive!(Partition, String);
impl_display_inner!(Partition);

impl From<&str> for Partition {
    fn from(value: &str) -> Self {
        Partition(value.to_string())
    }
}

/// Lifecycle event forwarded to the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum ObjectEvent {
    Create,
    Update,
    Delete,
}

/// What the plugin advertises it can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum PluginCapability {
    Event,
    Stat,
    HorizontalRecommendation,
    VerticalRecommendation,
}

/// Lifecycle phase reported for a pod object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum PodState {
    Launching,
    Active,
    Terminating,
    Terminated,
}

/// The autoscaler object handed to the plugin at cluster creation. The yaml
/// payload is passed verbatim; only the plugin interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoscalerSpec {
    pub kind: String,
    pub yaml: String,
}

/// Snapshot of a pod object, forwarded on replica lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodSnapshot {
    pub name: String,
    pub state: PodState,
    pub last_transition_nanos: i64,
    pub cpu_request_millis: i32,
}

/// Discriminated union of the objects the plugin tracks.
#[derive(Debug, Clone, PartialEq)]
pub enum PluginObject {
    Autoscaler(AutoscalerSpec),
    Pod(PodSnapshot),
}

/// Name of one scraped metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum StatMetric {
    #[strum(serialize = "concurrency")]
    Concurrency,

    #[strum(serialize = "cpu-millis")]
    CpuMillis,
}

/// One scraped sample fed to the policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginStat {
    pub at_nanos: i64,
    pub pod_name: String,
    pub metric: StatMetric,
    pub value: i32,
}

/// A per-pod resource recommendation from a vertical policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecommendation {
    pub pod_name: String,
    pub lower_bound_millis: i32,
    pub target_millis: i32,
    pub upper_bound_millis: i32,
}

// ================================================================================================
// The Plugin Interface
// ================================================================================================

/// Synchronous interface to an autoscaler policy.
///
/// All calls block the event loop; they consume wall-clock time but never
/// advance logical time. Implemented by [`crate::plugin::PluginProcess`] for
/// real out-of-process policies and by [`crate::plugin::fixtures`] for
/// deterministic tests.
pub trait Plugin {
    fn event(
        &mut self,
        partition: &Partition,
        at_nanos: i64,
        event: ObjectEvent,
        object: &PluginObject,
    ) -> Result<(), PluginError>;

    fn stat(&mut self, partition: &Partition, stats: &[PluginStat]) -> Result<(), PluginError>;

    fn horizontal_recommendation(
        &mut self,
        partition: &Partition,
        at_nanos: i64,
    ) -> Result<i32, PluginError>;

    fn vertical_recommendation(
        &mut self,
        partition: &Partition,
        at_nanos: i64,
    ) -> Result<Vec<ResourceRecommendation>, PluginError>;

    fn capabilities(&mut self) -> Result<Vec<PluginCapability>, PluginError>;

    fn plugin_type(&mut self) -> Result<String, PluginError>;
}

// ================================================================================================
// Proto Conversions
// ================================================================================================

impl From<ObjectEvent> for proto::EventType {
    fn from(event: ObjectEvent) -> Self {
        match event {
            ObjectEvent::Create => proto::EventType::Create,
            ObjectEvent::Update => proto::EventType::Update,
            ObjectEvent::Delete => proto::EventType::Delete,
        }
    }
}

impl TryFrom<proto::Capability> for PluginCapability {
    type Error = PluginError;

    fn try_from(capability: proto::Capability) -> Result<Self, Self::Error> {
        match capability {
            proto::Capability::Event => Ok(PluginCapability::Event),
            proto::Capability::Stat => Ok(PluginCapability::Stat),
            proto::Capability::HorizontalRecommendation => {
                Ok(PluginCapability::HorizontalRecommendation)
            }
            proto::Capability::VerticalRecommendation => {
                Ok(PluginCapability::VerticalRecommendation)
            }
            proto::Capability::Unspecified => Err(PluginError::MalformedResponse(
                "unspecified capability".to_string(),
            )),
        }
    }
}

impl From<&PluginStat> for proto::Stat {
    fn from(stat: &PluginStat) -> Self {
        proto::Stat {
            time: stat.at_nanos,
            pod_name: stat.pod_name.clone(),
            metric: stat.metric.to_string(),
            value: stat.value,
        }
    }
}

impl From<&PluginObject> for proto::event_request::Object {
    fn from(object: &PluginObject) -> Self {
        match object {
            PluginObject::Autoscaler(spec) => {
                proto::event_request::Object::Autoscaler(proto::Autoscaler {
                    r#type: spec.kind.clone(),
                    yaml: spec.yaml.clone(),
                })
            }
            PluginObject::Pod(pod) => proto::event_request::Object::Pod(proto::Pod {
                name: pod.name.clone(),
                state: pod.state.to_string(),
                last_transition: pod.last_transition_nanos,
                cpu_request_millis: pod.cpu_request_millis,
            }),
        }
    }
}

impl From<proto::RecommendedPodResources> for ResourceRecommendation {
    fn from(rec: proto::RecommendedPodResources) -> Self {
        ResourceRecommendation {
            pod_name: rec.pod_name,
            lower_bound_millis: rec.lower_bound_millis,
            target_millis: rec.target_millis,
            upper_bound_millis: rec.upper_bound_millis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_metric_serializes_to_wire_names() {
        assert_eq!(StatMetric::Concurrency.to_string(), "concurrency");
        assert_eq!(StatMetric::CpuMillis.to_string(), "cpu-millis");
    }

    #[test]
    fn pod_object_converts_to_proto() {
        let object = PluginObject::Pod(PodSnapshot {
            name: "replica-1".to_string(),
            state: PodState::Active,
            last_transition_nanos: 12,
            cpu_request_millis: 500,
        });

        match proto::event_request::Object::from(&object) {
            proto::event_request::Object::Pod(pod) => {
                assert_eq!(pod.name, "replica-1");
                assert_eq!(pod.state, "Active");
                assert_eq!(pod.cpu_request_millis, 500);
            }
            other => panic!("expected pod, got {other:?}"),
        }
    }

    #[test]
    fn unspecified_capability_is_rejected() {
        let err = PluginCapability::try_from(proto::Capability::Unspecified).unwrap_err();
        assert!(matches!(err, PluginError::MalformedResponse(_)));
    }
}
