use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use tracker_core::BranchId;
use tracker_events::{BranchScoped, EventBus, Subscription};

use super::WorkerHandle;

/// Generic bus subscriber loop.
///
/// - applies a handler to every message; handler errors are logged and skipped
/// - optional branch filter
/// - stops on shutdown or when the bus goes away
#[derive(Debug)]
pub struct SubscriberWorker;

impl SubscriberWorker {
    /// `handler` must tolerate redelivery.
    pub fn spawn<M, B, H, E>(
        name: &'static str,
        bus: &B,
        branch_id: Option<BranchId>,
        mut handler: H,
    ) -> io::Result<WorkerHandle>
    where
        M: BranchScoped + Send + 'static,
        B: EventBus<M>,
        H: FnMut(M) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub: Subscription<M> = bus.subscribe();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx, branch_id, &mut handler))?;

        Ok(WorkerHandle::new(shutdown_tx, join))
    }
}

fn worker_loop<M, H, E>(
    name: &'static str,
    sub: Subscription<M>,
    shutdown_rx: mpsc::Receiver<()>,
    branch_id: Option<BranchId>,
    handler: &mut H,
) where
    M: BranchScoped,
    H: FnMut(M) -> Result<(), E>,
    E: core::fmt::Debug,
{
    let tick = Duration::from_millis(250);

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(msg) => {
                if branch_id.is_some_and(|b| msg.branch_id() != b) {
                    continue;
                }

                if let Err(err) = handler(msg) {
                    warn!(worker = name, error = ?err, "subscriber handler failed");
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::mpsc::channel;

    use tracker_events::{EventEnvelope, InMemoryEventBus};
    use tracker_core::AggregateId;
    use uuid::Uuid;

    fn env(branch_id: BranchId, seq: u64) -> EventEnvelope<u64> {
        EventEnvelope::new(Uuid::now_v7(), branch_id, AggregateId::new(), "orders.order", seq, seq)
    }

    #[test]
    fn forwards_only_the_selected_branch() {
        let bus: Arc<InMemoryEventBus<EventEnvelope<u64>>> = Arc::new(InMemoryEventBus::new());
        let (tx, rx) = channel();
        let mine = BranchId::new();

        let handle = SubscriberWorker::spawn("test.subscriber", &bus, Some(mine), move |m: EventEnvelope<u64>| {
            tx.send(*m.payload()).map_err(|e| e.to_string())
        })
        .unwrap();

        bus.publish(env(BranchId::new(), 1)).unwrap();
        bus.publish(env(mine, 2)).unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 2);
        assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());
        handle.shutdown();
    }
}
