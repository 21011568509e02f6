use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{SimResult, StockError, SystemError},
    impl_display_inner, impl_from_primitive,
    model::{replica::ReplicaTemplate, request::RequestTemplate},
    simulator::entity::{Entity, EntityKind, EntityName, TickToken},
};

// ================================================================================================
// Names & Handles
// ================================================================================================

/// Display name of a stock, used in trace lines and error messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StockName(pub String);
impl_from_primitive!(StockName, String);
impl_display_inner!(StockName);

impl From<&str> for StockName {
    fn from(value: &str) -> Self {
        StockName(value.to_string())
    }
}

/// Copyable handle to a stock inside a [`StockSet`].
///
/// Movements and hooks refer to stocks by handle; the arena is the single
/// owner. This keeps the flow graph an ownership tree even though the graph
/// itself is cyclic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StockId(pub(crate) usize);

impl fmt::Display for StockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stock#{}", self.0)
    }
}

// ================================================================================================
// Roles
// ================================================================================================

/// What a source stock generates when an entity is pulled out of it.
#[derive(Debug, Clone)]
pub enum SourceKind {
    /// Mints fresh [`crate::model::request::RequestEntity`]s.
    Traffic(RequestTemplate),
    /// Mints fresh [`crate::model::replica::ReplicaEntity`]s, allocating
    /// their per-replica processing and completion stocks in the arena.
    Replica(ReplicaTemplate),
    /// Mints anonymous ledger tokens.
    Desired,
}

#[derive(Debug, Clone)]
enum StockRole {
    /// Generates a fresh entity on every remove; `count() == 0` always.
    Source(SourceKind),
    /// Accepts entities permanently; remove is disallowed.
    Sink,
    /// Accepts and releases entities.
    Through,
}

// ================================================================================================
// Stock
// ================================================================================================

/// A typed container of entities; one node of the flow graph.
///
/// Every stock declares the [`EntityKind`] it accepts and rejects everything
/// else, so a kind mismatch is caught at the movement that would introduce
/// it rather than at some later read.
#[derive(Debug)]
pub struct Stock {
    name: StockName,
    kind_stocked: EntityKind,
    role: StockRole,
    entities: VecDeque<Entity>,
    generated: u64,
}

impl Stock {
    pub fn source(name: impl Into<StockName>, kind: EntityKind, source: SourceKind) -> Self {
        Self::with_role(name, kind, StockRole::Source(source))
    }

    pub fn sink(name: impl Into<StockName>, kind: EntityKind) -> Self {
        Self::with_role(name, kind, StockRole::Sink)
    }

    pub fn through(name: impl Into<StockName>, kind: EntityKind) -> Self {
        Self::with_role(name, kind, StockRole::Through)
    }

    fn with_role(name: impl Into<StockName>, kind: EntityKind, role: StockRole) -> Self {
        Self {
            name: name.into(),
            kind_stocked: kind,
            role,
            entities: VecDeque::new(),
            generated: 0,
        }
    }

    pub fn name(&self) -> &StockName {
        &self.name
    }

    pub fn kind_stocked(&self) -> EntityKind {
        self.kind_stocked
    }

    pub fn count(&self) -> u64 {
        self.entities.len() as u64
    }

    /// How many entities this stock has minted (sources only; 0 otherwise).
    pub fn generated_count(&self) -> u64 {
        self.generated
    }

    pub fn is_source(&self) -> bool {
        matches!(self.role, StockRole::Source(_))
    }

    pub(crate) fn source_kind(&self) -> Option<SourceKind> {
        match &self.role {
            StockRole::Source(kind) => Some(kind.clone()),
            _ => None,
        }
    }

    /// Entities currently stocked, in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn contains(&self, name: &EntityName) -> bool {
        self.entities.iter().any(|e| e.name() == name)
    }

    pub fn entity(&self, name: &EntityName) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name() == name)
    }

    pub fn entity_mut(&mut self, name: &EntityName) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.name() == name)
    }

    /// Checks whether an entity of `kind` could be added right now.
    pub fn accepts(&self, kind: EntityKind, entity: &EntityName) -> Result<(), StockError> {
        if matches!(self.role, StockRole::Source(_)) {
            return Err(StockError::AddToSource(self.name.clone()));
        }
        if kind != self.kind_stocked {
            return Err(StockError::KindMismatch {
                stock: self.name.clone(),
                expected: self.kind_stocked,
                actual: kind,
                entity: entity.clone(),
            });
        }
        Ok(())
    }

    pub fn add(&mut self, entity: Entity) -> Result<(), StockError> {
        self.accepts(entity.kind(), entity.name())?;
        self.entities.push_back(entity);
        Ok(())
    }

    /// Removes an entity: the named one if `target` is given, otherwise the
    /// oldest. Source stocks never hold entities; the environment generates
    /// them instead (see [`SourceKind`]).
    pub fn remove(&mut self, target: Option<&EntityName>) -> Result<Entity, StockError> {
        match self.role {
            StockRole::Sink => return Err(StockError::RemoveFromSink(self.name.clone())),
            StockRole::Source(_) => return Err(StockError::RemoveFromEmpty(self.name.clone())),
            StockRole::Through => {}
        }
        match target {
            Some(name) => {
                let position = self
                    .entities
                    .iter()
                    .position(|e| e.name() == name)
                    .ok_or_else(|| StockError::NoSuchEntity {
                        stock: self.name.clone(),
                        entity: name.clone(),
                    })?;
                Ok(self.entities.remove(position).expect("position just found"))
            }
            None => self
                .entities
                .pop_front()
                .ok_or_else(|| StockError::RemoveFromEmpty(self.name.clone())),
        }
    }

    pub(crate) fn bump_generated(&mut self) -> u64 {
        self.generated += 1;
        self.generated
    }
}

// ================================================================================================
// Arena
// ================================================================================================

/// Arena owning every stock of one environment, addressed by [`StockId`].
#[derive(Debug, Default)]
pub struct StockSet {
    stocks: Vec<Stock>,
}

impl StockSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, stock: Stock) -> StockId {
        let id = StockId(self.stocks.len());
        self.stocks.push(stock);
        id
    }

    pub fn get(&self, id: StockId) -> SimResult<&Stock> {
        self.stocks
            .get(id.0)
            .ok_or_else(|| SystemError::MissingStock(id.0).into())
    }

    pub fn get_mut(&mut self, id: StockId) -> SimResult<&mut Stock> {
        self.stocks
            .get_mut(id.0)
            .ok_or_else(|| SystemError::MissingStock(id.0).into())
    }

    pub fn name(&self, id: StockId) -> StockName {
        self.stocks
            .get(id.0)
            .map(|s| s.name().clone())
            .unwrap_or_else(|| StockName::from(format!("{id}")))
    }

    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }
}

impl SourceKind {
    /// Mints the next entity out of a source stock.
    ///
    /// `seq` is the source's own generation counter, used for stable names.
    pub(crate) fn synthesize(
        &self,
        seq: u64,
        now: DateTime<Utc>,
        stocks: &mut StockSet,
    ) -> Entity {
        match self {
            SourceKind::Traffic(template) => {
                Entity::Request(template.mint(format!("request-{seq}"), now))
            }
            SourceKind::Replica(template) => {
                let name = format!("replica-{seq}");
                let processing = stocks.insert(Stock::through(
                    format!("{name}-RequestsProcessing"),
                    EntityKind::Request,
                ));
                let complete = stocks.insert(Stock::sink(
                    format!("{name}-RequestsComplete"),
                    EntityKind::Request,
                ));
                Entity::Replica(template.mint(name, seq, now, processing, complete))
            }
            SourceKind::Desired => Entity::Token(TickToken::new(
                format!("desired-{seq}"),
                EntityKind::Desired,
            )),
        }
    }
}
