use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::{
    impl_display_inner, impl_from_primitive,
    model::{replica::ReplicaEntity, request::RequestEntity},
};

// ================================================================================================
// Names & Kinds
// ================================================================================================

/// Unique identifier of an entity within one simulation run.
///
/// Sources mint sequential names (`request-1`, `replica-3`, ...); movements
/// and trace lines refer to entities by this name rather than by pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityName(pub String);
impl_from_primitive!(EntityName, String);
impl_display_inner!(EntityName);

impl From<&str> for EntityName {
    fn from(value: &str) -> Self {
        EntityName(value.to_string())
    }
}

/// The kind of an entity. Stocks declare the kind they accept and reject
/// everything else.
#[derive(Copy, Clone, Debug, Display, EnumString, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Request,
    Replica,
    Autoscaler,
    CpuMonitor,
    Desired,
    Simulation,
}

// ================================================================================================
// The Tagged Entity Variant
// ================================================================================================

/// A token entity with no domain payload.
///
/// Tokens drive ticktocks (autoscaler iterations, CPU sampling, the
/// simulation lifecycle) and populate the desired-replicas ledger, where only
/// the stock's `count()` carries meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct TickToken {
    name: EntityName,
    kind: EntityKind,
}

impl TickToken {
    pub fn new(name: impl Into<EntityName>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &EntityName {
        &self.name
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }
}

/// The atomic participant of the simulation.
///
/// Entities are owned by exactly one stock at a time; executing a movement
/// transfers ownership from the source stock to the destination stock.
#[derive(Debug, Clone)]
pub enum Entity {
    Request(RequestEntity),
    Replica(ReplicaEntity),
    Token(TickToken),
}

impl Entity {
    pub fn name(&self) -> &EntityName {
        match self {
            Entity::Request(request) => request.name(),
            Entity::Replica(replica) => replica.name(),
            Entity::Token(token) => token.name(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Request(_) => EntityKind::Request,
            Entity::Replica(_) => EntityKind::Replica,
            Entity::Token(token) => token.kind(),
        }
    }

    pub fn as_request(&self) -> Option<&RequestEntity> {
        match self {
            Entity::Request(request) => Some(request),
            _ => None,
        }
    }

    pub fn as_request_mut(&mut self) -> Option<&mut RequestEntity> {
        match self {
            Entity::Request(request) => Some(request),
            _ => None,
        }
    }

    pub fn as_replica(&self) -> Option<&ReplicaEntity> {
        match self {
            Entity::Replica(replica) => Some(replica),
            _ => None,
        }
    }

    pub fn as_replica_mut(&mut self) -> Option<&mut ReplicaEntity> {
        match self {
            Entity::Replica(replica) => Some(replica),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_entity_reports_its_token_kind() {
        let autoscaler = Entity::Token(TickToken::new("autoscaler", EntityKind::Autoscaler));
        let sampler = Entity::Token(TickToken::new("cpu-monitor", EntityKind::CpuMonitor));

        assert_eq!(autoscaler.kind(), EntityKind::Autoscaler);
        assert_eq!(sampler.kind(), EntityKind::CpuMonitor);
        assert_eq!(autoscaler.name(), &EntityName::from("autoscaler"));
    }

    #[test]
    fn kind_display_matches_config_strings() {
        assert_eq!(EntityKind::Request.to_string(), "Request");
        assert_eq!(EntityKind::CpuMonitor.to_string(), "CpuMonitor");
        assert_eq!("Replica".parse::<EntityKind>().unwrap(), EntityKind::Replica);
    }
}
