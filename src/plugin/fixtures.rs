//! Deterministic in-process policies for tests and scripted scenarios.
//!
//! These stand-ins implement [`Plugin`] without a subprocess, so engine and
//! model tests stay hermetic and reproducible.

use std::collections::HashSet;

use crate::{
    error::PluginError,
    plugin::bridge::{
        ObjectEvent, Partition, Plugin, PluginCapability, PluginObject, PluginStat,
        ResourceRecommendation,
    },
};

/// A horizontal policy that always recommends the same replica count.
#[derive(Debug, Default)]
pub struct FixedHorizontalPlugin {
    desired: i32,
    pub events_seen: Vec<(ObjectEvent, String)>,
    pub stats_seen: Vec<PluginStat>,
    pub recommendation_times: Vec<i64>,
}

impl FixedHorizontalPlugin {
    pub fn new(desired: i32) -> Self {
        Self {
            desired,
            ..Self::default()
        }
    }

    fn object_label(object: &PluginObject) -> String {
        match object {
            PluginObject::Autoscaler(spec) => spec.kind.clone(),
            PluginObject::Pod(pod) => pod.name.clone(),
        }
    }
}

impl Plugin for FixedHorizontalPlugin {
    fn event(
        &mut self,
        _partition: &Partition,
        _at_nanos: i64,
        event: ObjectEvent,
        object: &PluginObject,
    ) -> Result<(), PluginError> {
        self.events_seen.push((event, Self::object_label(object)));
        Ok(())
    }

    fn stat(&mut self, _partition: &Partition, stats: &[PluginStat]) -> Result<(), PluginError> {
        self.stats_seen.extend_from_slice(stats);
        Ok(())
    }

    fn horizontal_recommendation(
        &mut self,
        _partition: &Partition,
        at_nanos: i64,
    ) -> Result<i32, PluginError> {
        self.recommendation_times.push(at_nanos);
        Ok(self.desired)
    }

    fn vertical_recommendation(
        &mut self,
        _partition: &Partition,
        _at_nanos: i64,
    ) -> Result<Vec<ResourceRecommendation>, PluginError> {
        Err(PluginError::Unsupported(
            PluginCapability::VerticalRecommendation.to_string(),
        ))
    }

    fn capabilities(&mut self) -> Result<Vec<PluginCapability>, PluginError> {
        Ok(vec![
            PluginCapability::Event,
            PluginCapability::Stat,
            PluginCapability::HorizontalRecommendation,
        ])
    }

    fn plugin_type(&mut self) -> Result<String, PluginError> {
        Ok("hpa.v2beta2.autoscaling.k8s.io".to_string())
    }
}

/// A vertical policy recommending the same CPU target for every pod it has
/// seen a `Create` event for.
#[derive(Debug, Default)]
pub struct FixedVerticalPlugin {
    target_millis: i32,
    pods: Vec<String>,
}

impl FixedVerticalPlugin {
    pub fn new(target_millis: i32) -> Self {
        Self {
            target_millis,
            pods: Vec::new(),
        }
    }
}

impl Plugin for FixedVerticalPlugin {
    fn event(
        &mut self,
        _partition: &Partition,
        _at_nanos: i64,
        event: ObjectEvent,
        object: &PluginObject,
    ) -> Result<(), PluginError> {
        if let PluginObject::Pod(pod) = object {
            match event {
                ObjectEvent::Create => self.pods.push(pod.name.clone()),
                ObjectEvent::Delete => self.pods.retain(|name| name != &pod.name),
                ObjectEvent::Update => {}
            }
        }
        Ok(())
    }

    fn stat(&mut self, _partition: &Partition, _stats: &[PluginStat]) -> Result<(), PluginError> {
        Ok(())
    }

    fn horizontal_recommendation(
        &mut self,
        _partition: &Partition,
        _at_nanos: i64,
    ) -> Result<i32, PluginError> {
        Err(PluginError::Unsupported(
            PluginCapability::HorizontalRecommendation.to_string(),
        ))
    }

    fn vertical_recommendation(
        &mut self,
        _partition: &Partition,
        _at_nanos: i64,
    ) -> Result<Vec<ResourceRecommendation>, PluginError> {
        Ok(self
            .pods
            .iter()
            .map(|name| ResourceRecommendation {
                pod_name: name.clone(),
                lower_bound_millis: self.target_millis / 2,
                target_millis: self.target_millis,
                upper_bound_millis: self.target_millis * 2,
            })
            .collect())
    }

    fn capabilities(&mut self) -> Result<Vec<PluginCapability>, PluginError> {
        Ok(vec![
            PluginCapability::Event,
            PluginCapability::Stat,
            PluginCapability::VerticalRecommendation,
        ])
    }

    fn plugin_type(&mut self) -> Result<String, PluginError> {
        Ok("vpa.v2beta2.autoscaling.k8s.io".to_string())
    }
}

/// Wraps another policy and fails its recommendation on chosen ticks.
///
/// Tick numbers are 1-based and count recommendation calls, matching the
/// autoscaler's tick cadence.
#[derive(Debug)]
pub struct FlakyPlugin<P> {
    inner: P,
    fail_on_ticks: HashSet<u64>,
    ticks_seen: u64,
}

impl<P: Plugin> FlakyPlugin<P> {
    pub fn new(inner: P, fail_on_ticks: impl IntoIterator<Item = u64>) -> Self {
        Self {
            inner,
            fail_on_ticks: fail_on_ticks.into_iter().collect(),
            ticks_seen: 0,
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn flake(&mut self) -> Result<(), PluginError> {
        self.ticks_seen += 1;
        if self.fail_on_ticks.contains(&self.ticks_seen) {
            return Err(PluginError::Rpc(format!(
                "transient failure on tick {}",
                self.ticks_seen
            )));
        }
        Ok(())
    }
}

impl<P: Plugin> Plugin for FlakyPlugin<P> {
    fn event(
        &mut self,
        partition: &Partition,
        at_nanos: i64,
        event: ObjectEvent,
        object: &PluginObject,
    ) -> Result<(), PluginError> {
        self.inner.event(partition, at_nanos, event, object)
    }

    fn stat(&mut self, partition: &Partition, stats: &[PluginStat]) -> Result<(), PluginError> {
        self.inner.stat(partition, stats)
    }

    fn horizontal_recommendation(
        &mut self,
        partition: &Partition,
        at_nanos: i64,
    ) -> Result<i32, PluginError> {
        self.flake()?;
        self.inner.horizontal_recommendation(partition, at_nanos)
    }

    fn vertical_recommendation(
        &mut self,
        partition: &Partition,
        at_nanos: i64,
    ) -> Result<Vec<ResourceRecommendation>, PluginError> {
        self.flake()?;
        self.inner.vertical_recommendation(partition, at_nanos)
    }

    fn capabilities(&mut self) -> Result<Vec<PluginCapability>, PluginError> {
        self.inner.capabilities()
    }

    fn plugin_type(&mut self) -> Result<String, PluginError> {
        self.inner.plugin_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_horizontal_always_recommends_the_same_count() {
        let mut plugin = FixedHorizontalPlugin::new(3);
        let partition = Partition::from("partition-1");

        assert_eq!(plugin.horizontal_recommendation(&partition, 1).unwrap(), 3);
        assert_eq!(plugin.horizontal_recommendation(&partition, 2).unwrap(), 3);
        assert_eq!(plugin.recommendation_times, vec![1, 2]);
    }

    #[test]
    fn flaky_fails_only_on_configured_ticks() {
        let mut plugin = FlakyPlugin::new(FixedHorizontalPlugin::new(1), [2]);
        let partition = Partition::from("partition-1");

        assert!(plugin.horizontal_recommendation(&partition, 1).is_ok());
        assert!(matches!(
            plugin.horizontal_recommendation(&partition, 2),
            Err(PluginError::Rpc(_))
        ));
        assert!(plugin.horizontal_recommendation(&partition, 3).is_ok());
    }

    #[test]
    fn fixed_vertical_recommends_for_created_pods() {
        let mut plugin = FixedVerticalPlugin::new(800);
        let partition = Partition::from("partition-1");
        let pod = PluginObject::Pod(crate::plugin::bridge::PodSnapshot {
            name: "replica-1".to_string(),
            state: crate::plugin::bridge::PodState::Active,
            last_transition_nanos: 0,
            cpu_request_millis: 500,
        });

        plugin.event(&partition, 0, ObjectEvent::Create, &pod).unwrap();
        let recs = plugin.vertical_recommendation(&partition, 1).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].target_millis, 800);

        plugin.event(&partition, 2, ObjectEvent::Delete, &pod).unwrap();
        assert!(plugin.vertical_recommendation(&partition, 3).unwrap().is_empty());
    }
}
