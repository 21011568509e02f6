//! The autoscaler policy seam.
//!
//! Policies (HPA, VPA, KPA) run out of process and speak the
//! `scalesim.plugin.v1` protocol; [`process::PluginProcess`] launches and
//! drives them. [`fixtures`] provides deterministic in-process stand-ins for
//! tests and scripted scenarios.

pub mod bridge;
pub mod fixtures;
pub mod process;

pub use bridge::{
    AutoscalerSpec, ObjectEvent, Partition, Plugin, PluginCapability, PluginObject, PluginStat,
    PodSnapshot, PodState, ResourceRecommendation, StatMetric,
};
pub use process::PluginProcess;
