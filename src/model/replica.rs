use chrono::{DateTime, Utc};

use crate::{
    error::{SimResult, SystemError},
    plugin::bridge::{ObjectEvent, Partition, PluginObject, PluginStat, PodSnapshot, PodState, StatMetric},
    simulator::{
        entity::EntityName,
        environment::{EnvCtx, StockHook, nanos_of},
        movement::Movement,
        stock::{StockId, StockSet},
    },
};

// ================================================================================================
// Replica Entity
// ================================================================================================

/// Blueprint for the replicas the replica source mints.
#[derive(Debug, Clone)]
pub struct ReplicaTemplate {
    pub cpu_capacity_millis: f64,
    pub max_rps: u32,
}

impl ReplicaTemplate {
    pub(crate) fn mint(
        &self,
        name: String,
        seq: u64,
        now: DateTime<Utc>,
        requests_processing: StockId,
        requests_complete: StockId,
    ) -> ReplicaEntity {
        ReplicaEntity {
            name: EntityName(name),
            endpoint_address: format!("10.0.{}.{}", (seq / 256) % 256, seq % 256),
            total_cpu_capacity_millis: self.cpu_capacity_millis,
            max_rps: self.max_rps,
            launched_at: now,
            draining: false,
            requests_processing,
            requests_complete,
        }
    }
}

/// The simulated unit of compute capacity; the analog of a pod.
///
/// Each replica owns a `requests_processing` through-stock and a
/// `requests_complete` sink, allocated in the arena when the replica is
/// minted. CPU occupancy is derived from the requests currently in flight.
#[derive(Debug, Clone)]
pub struct ReplicaEntity {
    name: EntityName,
    pub endpoint_address: String,
    pub total_cpu_capacity_millis: f64,
    pub max_rps: u32,
    pub launched_at: DateTime<Utc>,
    /// Set when the replica has been picked for termination; it stops taking
    /// new requests while its `terminate_replica` movement is in flight.
    pub draining: bool,
    requests_processing: StockId,
    requests_complete: StockId,
}

impl ReplicaEntity {
    pub fn name(&self) -> &EntityName {
        &self.name
    }

    pub fn requests_processing(&self) -> StockId {
        self.requests_processing
    }

    pub fn requests_complete(&self) -> StockId {
        self.requests_complete
    }

    /// Snapshot of this replica at `at`.
    pub fn stat(&self, stocks: &StockSet, at: DateTime<Utc>) -> SimResult<ReplicaStat> {
        let processing = stocks.get(self.requests_processing)?;
        let concurrency = processing.count();
        let occupied: f64 = processing
            .entities()
            .filter_map(|e| e.as_request())
            .map(|request| request.cpu_demand_millis)
            .sum();

        Ok(ReplicaStat {
            pod_name: self.name.to_string(),
            at,
            request_concurrency: concurrency,
            proxy_concurrency: concurrency,
            occupied_cpu_millis: occupied.min(self.total_cpu_capacity_millis),
            total_cpu_capacity_millis: self.total_cpu_capacity_millis,
        })
    }
}

/// One scraped snapshot `(concurrency, cpu, timestamp)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicaStat {
    pub pod_name: String,
    pub at: DateTime<Utc>,
    pub request_concurrency: u64,
    pub proxy_concurrency: u64,
    pub occupied_cpu_millis: f64,
    pub total_cpu_capacity_millis: f64,
}

impl ReplicaStat {
    pub fn cpu_utilization_percent(&self) -> f64 {
        if self.total_cpu_capacity_millis <= 0.0 {
            return 0.0;
        }
        self.occupied_cpu_millis * 100.0 / self.total_cpu_capacity_millis
    }

    pub fn to_plugin_stats(&self) -> Vec<PluginStat> {
        let at_nanos = nanos_of(self.at);
        vec![
            PluginStat {
                at_nanos,
                pod_name: self.pod_name.clone(),
                metric: StatMetric::Concurrency,
                value: self.request_concurrency as i32,
            },
            PluginStat {
                at_nanos,
                pod_name: self.pod_name.clone(),
                metric: StatMetric::CpuMillis,
                value: self.occupied_cpu_millis.round() as i32,
            },
        ]
    }
}

// ================================================================================================
// Pod Informer
// ================================================================================================

/// Forwards replica lifecycle transitions to the plugin as pod events, the
/// way endpoint updates announce pods in a real cluster.
pub struct PodInformerHook {
    pub partition: Partition,
    pub event: ObjectEvent,
    pub state: PodState,
}

impl StockHook for PodInformerHook {
    fn on_add(
        &mut self,
        ctx: &mut EnvCtx<'_>,
        movement: &Movement,
        entity: &EntityName,
    ) -> SimResult<()> {
        let now = ctx.scheduler.current_movement_time();
        let snapshot = {
            let replica = ctx
                .stocks
                .get(movement.to)?
                .entity(entity)
                .and_then(|e| e.as_replica())
                .ok_or_else(|| {
                    SystemError::InvariantViolation(format!("replica {entity} not in {}", movement.to))
                })?;
            PodSnapshot {
                name: replica.name().to_string(),
                state: self.state,
                last_transition_nanos: nanos_of(now),
                cpu_request_millis: replica.total_cpu_capacity_millis.round() as i32,
            }
        };

        ctx.plugin.event(
            &self.partition,
            nanos_of(now),
            self.event,
            &PluginObject::Pod(snapshot),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use crate::{
        model::request::RequestTemplate,
        simulator::{entity::Entity, entity::EntityKind, stock::Stock},
    };

    use super::*;

    fn minted(stocks: &mut StockSet) -> ReplicaEntity {
        let processing = stocks.insert(Stock::through(
            "replica-1-RequestsProcessing",
            EntityKind::Request,
        ));
        let complete = stocks.insert(Stock::sink(
            "replica-1-RequestsComplete",
            EntityKind::Request,
        ));
        let template = ReplicaTemplate {
            cpu_capacity_millis: 1000.0,
            max_rps: 100,
        };
        template.mint(
            "replica-1".to_string(),
            1,
            DateTime::<Utc>::UNIX_EPOCH,
            processing,
            complete,
        )
    }

    #[test]
    fn cpu_occupancy_follows_in_flight_requests() {
        let mut stocks = StockSet::new();
        let replica = minted(&mut stocks);
        let template = RequestTemplate {
            cpu_demand_millis: 250.0,
            service_time: TimeDelta::seconds(1),
        };

        for i in 0..2 {
            let request = template.mint(format!("request-{i}"), DateTime::<Utc>::UNIX_EPOCH);
            stocks
                .get_mut(replica.requests_processing())
                .unwrap()
                .add(Entity::Request(request))
                .unwrap();
        }

        let stat = replica.stat(&stocks, DateTime::<Utc>::UNIX_EPOCH).unwrap();
        assert_eq!(stat.request_concurrency, 2);
        assert_eq!(stat.occupied_cpu_millis, 500.0);
        assert_eq!(stat.cpu_utilization_percent(), 50.0);
    }

    #[test]
    fn occupancy_saturates_at_capacity() {
        let mut stocks = StockSet::new();
        let replica = minted(&mut stocks);
        let template = RequestTemplate {
            cpu_demand_millis: 600.0,
            service_time: TimeDelta::seconds(1),
        };

        for i in 0..3 {
            let request = template.mint(format!("request-{i}"), DateTime::<Utc>::UNIX_EPOCH);
            stocks
                .get_mut(replica.requests_processing())
                .unwrap()
                .add(Entity::Request(request))
                .unwrap();
        }

        let stat = replica.stat(&stocks, DateTime::<Utc>::UNIX_EPOCH).unwrap();
        assert_eq!(stat.cpu_utilization_percent(), 100.0);
    }

    #[test]
    fn stat_flattens_into_two_plugin_metrics() {
        let mut stocks = StockSet::new();
        let replica = minted(&mut stocks);

        let stats = replica
            .stat(&stocks, DateTime::<Utc>::UNIX_EPOCH)
            .unwrap()
            .to_plugin_stats();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].metric, StatMetric::Concurrency);
        assert_eq!(stats[1].metric, StatMetric::CpuMillis);
        assert!(stats.iter().all(|s| s.pod_name == "replica-1"));
    }
}
