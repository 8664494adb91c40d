//! Order command entry point: dispatch, then fold the committed events into
//! the order board before returning.

use std::sync::{Arc, Mutex};

use serde_json::Value as JsonValue;
use tracing::debug;

use tracker_core::BranchId;
use tracker_events::{EventBus, EventEnvelope, InMemoryEventBus, Subscription};
use tracker_orders::{Order, OrderCommand, OrderId, OrderState};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::event_store::{EventStore, EventStoreError, InMemoryEventStore};
use crate::projections::{ORDER_AGGREGATE_TYPE, OrderBoardProjection};
use crate::read_model::{BranchStore, InMemoryBranchStore};

pub type InMemoryOrderEngine = OrderEngine<
    Arc<InMemoryEventStore>,
    Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>,
    Arc<InMemoryBranchStore<OrderId, OrderState>>,
>;

/// Callers read their own writes: `execute` returns only after the board has
/// applied the new events. Commands run one at a time so the board never sees
/// a sequence gap.
#[derive(Debug)]
pub struct OrderEngine<S, B, R>
where
    R: BranchStore<OrderId, OrderState>,
{
    dispatcher: CommandDispatcher<S, B>,
    board: OrderBoardProjection<R>,
    write_lock: Mutex<()>,
}

impl InMemoryOrderEngine {
    pub fn in_memory() -> Self {
        OrderEngine::new(
            Arc::new(InMemoryEventStore::new()),
            Arc::new(InMemoryEventBus::new()),
            Arc::new(InMemoryBranchStore::new()),
        )
    }
}

impl<S, B, R> OrderEngine<S, B, R>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
    R: BranchStore<OrderId, OrderState>,
{
    pub fn new(store: S, bus: B, board_store: R) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(store, bus),
            board: OrderBoardProjection::new(board_store),
            write_lock: Mutex::new(()),
        }
    }

    pub fn execute(&self, command: OrderCommand) -> Result<OrderState, DispatchError> {
        let branch_id = command.branch_id();
        let order_id = command.order_id();

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| DispatchError::Store(EventStoreError::Unavailable("engine lock poisoned".into())))?;

        let committed = self.dispatcher.dispatch::<Order>(
            branch_id,
            order_id.aggregate_id(),
            ORDER_AGGREGATE_TYPE,
            command,
            move |_, _| Order::empty(order_id),
        )?;

        for stored in &committed {
            self.board
                .apply_envelope(&stored.to_envelope())
                .map_err(|e| DispatchError::Projection(e.to_string()))?;
        }

        debug!(
            %branch_id,
            %order_id,
            events = committed.len(),
            "order command applied"
        );

        self.board
            .get(branch_id, &order_id)
            .ok_or_else(|| DispatchError::NotFound("order".to_string()))
    }

    pub fn get(&self, branch_id: BranchId, order_id: &OrderId) -> Option<OrderState> {
        self.board.get(branch_id, order_id)
    }

    pub fn list(&self, branch_id: BranchId) -> Vec<OrderState> {
        self.board.list(branch_id)
    }

    pub fn branches(&self) -> Vec<BranchId> {
        self.board.branches()
    }

    pub fn bus(&self) -> &B {
        self.dispatcher.bus()
    }

    /// Live feed of committed order events (all branches).
    pub fn subscribe(&self) -> Subscription<EventEnvelope<JsonValue>> {
        self.dispatcher.bus().subscribe()
    }

    /// Rebuilds one branch's board from the event store. Returns the number of events replayed.
    pub fn rebuild_branch(&self, branch_id: BranchId) -> Result<usize, DispatchError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| DispatchError::Store(EventStoreError::Unavailable("engine lock poisoned".into())))?;

        let events = self.dispatcher.store().load_branch(branch_id)?;
        let count = events.len();
        self.board
            .rebuild_from_scratch(events.iter().map(|e| e.to_envelope()))
            .map_err(|e| DispatchError::Projection(e.to_string()))?;
        Ok(count)
    }
}
