use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    error::{SimResult, SystemError},
    model::kind::{BUFFER_BACKOFF, COMPLETE_REQUEST, FAIL_REQUEST, SEND_TO_REPLICA},
    simulator::{
        entity::EntityName,
        environment::{EnvCtx, StockHook},
        movement::Movement,
        stock::StockId,
    },
};

// ================================================================================================
// Request Entity
// ================================================================================================

/// Blueprint for the requests a traffic source mints.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    pub cpu_demand_millis: f64,
    pub service_time: TimeDelta,
}

impl RequestTemplate {
    pub(crate) fn mint(&self, name: String, now: DateTime<Utc>) -> RequestEntity {
        RequestEntity {
            name: EntityName(name),
            arrived_at: now,
            cpu_demand_millis: self.cpu_demand_millis,
            service_time: self.service_time,
            retries: 0,
            assigned_replica: None,
        }
    }
}

/// One request flowing source → buffer → replica → completion (or failure).
#[derive(Debug, Clone)]
pub struct RequestEntity {
    name: EntityName,
    pub arrived_at: DateTime<Utc>,
    pub cpu_demand_millis: f64,
    pub service_time: TimeDelta,
    pub retries: u32,
    pub assigned_replica: Option<EntityName>,
}

impl RequestEntity {
    pub fn name(&self) -> &EntityName {
        &self.name
    }
}

// ================================================================================================
// Routing
// ================================================================================================

/// Routes requests arriving in `RequestsBuffered`.
///
/// With no active replica the request retries on a backoff self-loop until
/// its retry budget is exhausted, then moves to `RequestsFailed`. Otherwise
/// the replica with the lowest current concurrency wins (ties go to the
/// oldest replica), and completion is scheduled one service time later.
pub struct RequestRoutingHook {
    pub buffered: StockId,
    pub failed: StockId,
    pub replicas_active: StockId,
    pub retry_interval: TimeDelta,
    pub max_retries: u32,
}

impl StockHook for RequestRoutingHook {
    fn on_add(
        &mut self,
        ctx: &mut EnvCtx<'_>,
        _movement: &Movement,
        entity: &EntityName,
    ) -> SimResult<()> {
        let now = ctx.scheduler.current_movement_time();

        let mut candidates: Vec<(EntityName, StockId, StockId, u64)> = Vec::new();
        for e in ctx.stocks.get(self.replicas_active)?.entities() {
            if let Some(replica) = e.as_replica() {
                if replica.draining {
                    continue;
                }
                let concurrency = ctx.stocks.get(replica.requests_processing())?.count();
                candidates.push((
                    replica.name().clone(),
                    replica.requests_processing(),
                    replica.requests_complete(),
                    concurrency,
                ));
            }
        }

        let Some((replica_name, processing, complete, _)) =
            candidates.into_iter().min_by_key(|(_, _, _, concurrency)| *concurrency)
        else {
            return self.back_off(ctx, entity, now);
        };

        let service_time = {
            let request = ctx
                .stocks
                .get_mut(self.buffered)?
                .entity_mut(entity)
                .and_then(|e| e.as_request_mut())
                .ok_or_else(|| {
                    SystemError::InvariantViolation(format!("request {entity} not in buffer"))
                })?;
            request.assigned_replica = Some(replica_name.clone());
            request.service_time
        };

        ctx.scheduler.schedule(
            Movement::new(SEND_TO_REPLICA, now, self.buffered, processing)
                .carrying(entity.clone())
                .with_note(format!("routed to {replica_name}")),
        )?;
        ctx.scheduler.schedule(
            Movement::new(COMPLETE_REQUEST, now + service_time, processing, complete)
                .carrying(entity.clone()),
        )?;
        Ok(())
    }
}

impl RequestRoutingHook {
    fn back_off(
        &mut self,
        ctx: &mut EnvCtx<'_>,
        entity: &EntityName,
        now: DateTime<Utc>,
    ) -> SimResult<()> {
        let retries = {
            let request = ctx
                .stocks
                .get_mut(self.buffered)?
                .entity_mut(entity)
                .and_then(|e| e.as_request_mut())
                .ok_or_else(|| {
                    SystemError::InvariantViolation(format!("request {entity} not in buffer"))
                })?;
            request.retries += 1;
            request.retries
        };

        if retries > self.max_retries {
            ctx.scheduler.schedule(
                Movement::new(FAIL_REQUEST, now, self.buffered, self.failed)
                    .carrying(entity.clone())
                    .with_note(format!("no active replicas after {} attempts", retries - 1)),
            )?;
        } else {
            ctx.scheduler.schedule(
                Movement::new(BUFFER_BACKOFF, now + self.retry_interval, self.buffered, self.buffered)
                    .carrying(entity.clone()),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_stamps_arrival_and_template_values() {
        let template = RequestTemplate {
            cpu_demand_millis: 150.0,
            service_time: TimeDelta::seconds(2),
        };
        let now = DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(5);

        let request = template.mint("request-1".to_string(), now);
        assert_eq!(request.name(), &EntityName::from("request-1"));
        assert_eq!(request.arrived_at, now);
        assert_eq!(request.cpu_demand_millis, 150.0);
        assert_eq!(request.retries, 0);
        assert!(request.assigned_replica.is_none());
    }
}
