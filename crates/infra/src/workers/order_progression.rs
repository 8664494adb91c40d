//! Moves orders along by the clock: `created` → `in_progress` after the
//! auto-progress delay, `in_progress` → `overdue` past the threshold.

use std::io;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use tracker_events::{EventBus, EventEnvelope};
use tracker_orders::{
    DueTransition, MarkOverdue, OrderCommand, OrderId, OrderState, ProgressionPolicy, Progress,
    due_transition,
};

use super::WorkerHandle;
use crate::engine::OrderEngine;
use crate::event_store::EventStore;
use crate::read_model::BranchStore;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub progressed: usize,
    pub marked_overdue: usize,
    pub failed: usize,
}

impl SweepReport {
    pub fn changed(&self) -> usize {
        self.progressed + self.marked_overdue
    }
}

/// One pass over every branch. Failures are logged and counted, never fatal.
pub fn sweep<S, B, R>(engine: &OrderEngine<S, B, R>, policy: &ProgressionPolicy, now: DateTime<Utc>) -> SweepReport
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
    R: BranchStore<OrderId, OrderState>,
{
    let mut report = SweepReport::default();

    for branch_id in engine.branches() {
        for state in engine.list(branch_id) {
            let Some(transition) = due_transition(&state, now, policy) else {
                continue;
            };

            let command = match transition {
                DueTransition::Progress => OrderCommand::Progress(Progress {
                    branch_id,
                    order_id: state.id,
                    occurred_at: now,
                }),
                DueTransition::MarkOverdue => OrderCommand::MarkOverdue(MarkOverdue {
                    branch_id,
                    order_id: state.id,
                    occurred_at: now,
                }),
            };

            match engine.execute(command) {
                Ok(_) => match transition {
                    DueTransition::Progress => report.progressed += 1,
                    DueTransition::MarkOverdue => report.marked_overdue += 1,
                },
                Err(err) => {
                    report.failed += 1;
                    warn!(
                        %branch_id,
                        order_id = %state.id,
                        ?transition,
                        error = %err,
                        "order progression failed"
                    );
                }
            }
        }
    }

    report
}

#[derive(Debug)]
pub struct OrderProgressionWorker;

impl OrderProgressionWorker {
    /// Sweeps every `interval` until shut down.
    pub fn spawn<S, B, R>(
        engine: Arc<OrderEngine<S, B, R>>,
        policy: ProgressionPolicy,
        interval: Duration,
    ) -> io::Result<WorkerHandle>
    where
        S: EventStore + 'static,
        B: EventBus<EventEnvelope<JsonValue>> + 'static,
        R: BranchStore<OrderId, OrderState> + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name("orders.progression".to_string())
            .spawn(move || loop {
                match shutdown_rx.recv_timeout(interval) {
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        let report = sweep(&engine, &policy, Utc::now());
                        if report.changed() > 0 || report.failed > 0 {
                            info!(
                                progressed = report.progressed,
                                marked_overdue = report.marked_overdue,
                                failed = report.failed,
                                "order progression sweep"
                            );
                        }
                    }
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            })?;

        Ok(WorkerHandle::new(shutdown_tx, join))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use tracker_core::BranchId;
    use tracker_customers::CustomerId;
    use tracker_orders::{OrderStatus, OrderType, Priority, StartOrder};

    use crate::engine::InMemoryOrderEngine;

    fn start_at(engine: &InMemoryOrderEngine, branch_id: BranchId, at: DateTime<Utc>) -> OrderId {
        engine
            .execute(OrderCommand::StartOrder(StartOrder {
                branch_id,
                order_id: OrderId::new(),
                order_number: "ORD-20261018-0001".into(),
                order_type: OrderType::Service,
                customer_id: CustomerId::new(),
                vehicle_id: None,
                description: String::new(),
                priority: Priority::Medium,
                estimated_duration: None,
                item: None,
                inquiry: None,
                occurred_at: at,
            }))
            .unwrap()
            .id
    }

    #[test]
    fn sweep_progresses_then_marks_overdue() {
        let engine = InMemoryOrderEngine::in_memory();
        let policy = ProgressionPolicy::default();
        let b = BranchId::new();
        let now = Utc::now();

        let old = start_at(&engine, b, now - ChronoDuration::minutes(600));
        let fresh = start_at(&engine, b, now - ChronoDuration::minutes(2));

        let first = sweep(&engine, &policy, now);
        assert_eq!(first.progressed, 1);
        assert_eq!(engine.get(b, &old).unwrap().status, OrderStatus::InProgress);
        assert_eq!(engine.get(b, &fresh).unwrap().status, OrderStatus::Created);

        let second = sweep(&engine, &policy, now);
        assert_eq!(second.marked_overdue, 1);
        assert_eq!(engine.get(b, &old).unwrap().status, OrderStatus::Overdue);

        assert_eq!(sweep(&engine, &policy, now), SweepReport::default());
    }

    #[test]
    fn worker_stops_on_shutdown() {
        let engine = Arc::new(InMemoryOrderEngine::in_memory());
        let handle = OrderProgressionWorker::spawn(
            engine,
            ProgressionPolicy::default(),
            Duration::from_millis(10),
        )
        .unwrap();
        thread::sleep(Duration::from_millis(30));
        handle.shutdown();
    }
}
