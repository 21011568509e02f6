//! The stock-and-flow cluster model: replicas, requests, traffic and the
//! autoscaler ticktock, wired onto the engine in [`crate::simulator`].

pub mod autoscaler;
pub mod builder;
pub mod cluster;
pub mod cpu_utilization;
pub mod replica;
pub mod request;
pub mod traffic;

pub use autoscaler::AutoscalerModel;
pub use builder::{Simulation, SimulationBuilder};
pub use cluster::ClusterModel;
pub use cpu_utilization::CpuMonitorModel;
pub use replica::{ReplicaEntity, ReplicaStat, ReplicaTemplate};
pub use request::{RequestEntity, RequestTemplate};

/// Movement kinds of the cluster model, as they appear in the trace.
pub mod kind {
    use crate::simulator::movement::MovementKind;

    pub const REQUEST_ARRIVAL: MovementKind = MovementKind("request_arrival");
    pub const BUFFER_BACKOFF: MovementKind = MovementKind("buffer_backoff");
    pub const FAIL_REQUEST: MovementKind = MovementKind("fail_request");
    pub const SEND_TO_REPLICA: MovementKind = MovementKind("send_to_replica");
    pub const COMPLETE_REQUEST: MovementKind = MovementKind("complete_request");

    pub const INCREASE_DESIRED: MovementKind = MovementKind("increase_desired");
    pub const DECREASE_DESIRED: MovementKind = MovementKind("decrease_desired");
    pub const START_REPLICA: MovementKind = MovementKind("start_replica");
    pub const FINISH_LAUNCHING: MovementKind = MovementKind("finish_launching");
    pub const TERMINATE_REPLICA: MovementKind = MovementKind("terminate_replica");
    pub const FINISH_TERMINATING: MovementKind = MovementKind("finish_terminating");

    pub const AUTOSCALER_TICK: MovementKind = MovementKind("autoscaler_tick");
    pub const CPU_UTILIZATION_TICK: MovementKind = MovementKind("cpu_utilization_tick");
}
