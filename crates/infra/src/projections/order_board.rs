use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;
use thiserror::Error;

use tracker_core::{AggregateId, BranchId};
use tracker_events::EventEnvelope;
use tracker_orders::{OrderEvent, OrderId, OrderState};

use crate::read_model::BranchStore;

pub const ORDER_AGGREGATE_TYPE: &str = "orders.order";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct CursorKey {
    branch_id: BranchId,
    aggregate_id: AggregateId,
}

#[derive(Debug, Error)]
pub enum OrderBoardError {
    #[error("failed to deserialize order event: {0}")]
    Deserialize(String),
    #[error("branch isolation violation: {0}")]
    BranchIsolation(String),
    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
    #[error("event for order {0} arrived before it was started")]
    MissingOrder(OrderId),
}

/// Current state of every order, per branch.
///
/// Folds events with [`OrderState::evolve`], the same function the aggregate
/// uses. Each stream has a cursor so redelivered envelopes are skipped.
#[derive(Debug)]
pub struct OrderBoardProjection<S>
where
    S: BranchStore<OrderId, OrderState>,
{
    store: S,
    cursors: RwLock<HashMap<CursorKey, u64>>,
}

impl<S> OrderBoardProjection<S>
where
    S: BranchStore<OrderId, OrderState>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(HashMap::new()),
        }
    }

    fn get_cursor(&self, branch_id: BranchId, aggregate_id: AggregateId) -> u64 {
        match self.cursors.read() {
            Ok(cursors) => *cursors
                .get(&CursorKey { branch_id, aggregate_id })
                .unwrap_or(&0),
            Err(_) => 0,
        }
    }

    fn update_cursor(&self, branch_id: BranchId, aggregate_id: AggregateId, seq: u64) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.insert(CursorKey { branch_id, aggregate_id }, seq);
        }
    }

    fn clear_cursors(&self, branch_id: BranchId) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.retain(|k, _| k.branch_id != branch_id);
        }
    }

    pub fn get(&self, branch_id: BranchId, order_id: &OrderId) -> Option<OrderState> {
        self.store.get(branch_id, order_id)
    }

    pub fn list(&self, branch_id: BranchId) -> Vec<OrderState> {
        self.store.list(branch_id)
    }

    pub fn branches(&self) -> Vec<BranchId> {
        self.store.branches()
    }

    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), OrderBoardError> {
        if envelope.aggregate_type() != ORDER_AGGREGATE_TYPE {
            return Ok(());
        }

        let branch_id = envelope.branch_id();
        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        let last = self.get_cursor(branch_id, aggregate_id);
        if seq == 0 {
            return Err(OrderBoardError::NonMonotonicSequence { last, found: seq });
        }
        if seq <= last {
            return Ok(());
        }
        if seq != last + 1 && last != 0 {
            return Err(OrderBoardError::NonMonotonicSequence { last, found: seq });
        }

        let ev: OrderEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| OrderBoardError::Deserialize(e.to_string()))?;

        let order_id = ev.order_id();
        if order_id.aggregate_id() != aggregate_id {
            return Err(OrderBoardError::BranchIsolation(
                "event order_id does not match envelope aggregate_id".to_string(),
            ));
        }

        let next = match &ev {
            OrderEvent::OrderStarted(e) => {
                if e.branch_id != branch_id {
                    return Err(OrderBoardError::BranchIsolation(
                        "event branch_id does not match envelope branch_id".to_string(),
                    ));
                }
                OrderState::started(e)
            }
            other => {
                let mut state = self
                    .store
                    .get(branch_id, &order_id)
                    .ok_or(OrderBoardError::MissingOrder(order_id))?;
                state.evolve(other);
                state
            }
        };

        self.store.upsert(branch_id, order_id, next);
        self.update_cursor(branch_id, aggregate_id, seq);
        Ok(())
    }

    /// Clears every branch present in `envelopes` and replays them in stream order.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), OrderBoardError> {
        let mut envs: Vec<_> = envelopes.into_iter().collect();

        {
            let mut branches = envs.iter().map(|e| e.branch_id()).collect::<Vec<_>>();
            branches.sort_by_key(|b| *b.as_uuid().as_bytes());
            branches.dedup();
            for b in branches {
                self.store.clear_branch(b);
                self.clear_cursors(b);
            }
        }

        envs.sort_by_key(|e| {
            (
                *e.branch_id().as_uuid().as_bytes(),
                *e.aggregate_id().as_uuid().as_bytes(),
                e.sequence_number(),
            )
        });

        for env in &envs {
            self.apply_envelope(env)?;
        }
        Ok(())
    }
}
