//! Infrastructure wiring for the HTTP layer: the order engine, the customer
//! directory, the catalog, invoices, flash messages and the live stream relay.

use std::convert::Infallible;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};
use tracing::{info, warn};

use tracker_core::BranchId;
use tracker_events::EventEnvelope;
use tracker_infra::queries::BoardRow;
use tracker_infra::workers::{OrderProgressionWorker, SubscriberWorker, WorkerHandle};
use tracker_infra::{
    CatalogStore, CustomerDirectory, DocumentNumbers, InMemoryOrderEngine, InvoiceRegistry,
    TrackerConfig,
};
use tracker_orders::{OrderState, ProgressionPolicy};

use crate::flash::FlashStore;

/// Realtime message broadcast via SSE.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RealtimeMessage {
    pub branch_id: BranchId,
    pub topic: String,
    pub payload: JsonValue,
}

#[derive(Debug)]
pub struct AppServices {
    engine: Arc<InMemoryOrderEngine>,
    directory: CustomerDirectory,
    catalog: CatalogStore,
    invoices: InvoiceRegistry,
    numbers: Arc<DocumentNumbers>,
    flash: FlashStore,
    policy: ProgressionPolicy,
    realtime_tx: broadcast::Sender<RealtimeMessage>,
    _relay: Option<WorkerHandle>,
}

impl AppServices {
    pub fn new(policy: ProgressionPolicy, seed_catalog: bool) -> Self {
        let engine = Arc::new(InMemoryOrderEngine::in_memory());
        let numbers = Arc::new(DocumentNumbers::new());
        let catalog = if seed_catalog {
            CatalogStore::seeded()
        } else {
            CatalogStore::default()
        };

        let (realtime_tx, _) = broadcast::channel(1024);
        let relay = match spawn_realtime_relay(&engine, realtime_tx.clone()) {
            Ok(h) => Some(h),
            Err(e) => {
                warn!(error = %e, "realtime relay not started; /stream will stay silent");
                None
            }
        };

        Self {
            engine,
            directory: CustomerDirectory::new(numbers.clone()),
            catalog,
            invoices: InvoiceRegistry::new(),
            numbers,
            flash: FlashStore::new(),
            policy,
            realtime_tx,
            _relay: relay,
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.progression, config.seed_catalog)
    }

    pub fn engine(&self) -> &InMemoryOrderEngine {
        &self.engine
    }

    pub fn directory(&self) -> &CustomerDirectory {
        &self.directory
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn invoices(&self) -> &InvoiceRegistry {
        &self.invoices
    }

    pub fn numbers(&self) -> &DocumentNumbers {
        &self.numbers
    }

    pub fn flash(&self) -> &FlashStore {
        &self.flash
    }

    pub fn policy(&self) -> &ProgressionPolicy {
        &self.policy
    }

    pub fn realtime_tx(&self) -> &broadcast::Sender<RealtimeMessage> {
        &self.realtime_tx
    }

    /// Starts the background sweep that moves orders to in-progress and overdue.
    pub fn spawn_progression(&self, interval: Duration) -> io::Result<WorkerHandle> {
        info!(interval_secs = interval.as_secs(), "starting order progression worker");
        OrderProgressionWorker::spawn(self.engine.clone(), self.policy, interval)
    }

    /// Dashboard row with the vehicle plate and customer name resolved.
    pub fn board_row(&self, branch_id: BranchId, order: OrderState, now: DateTime<Utc>) -> BoardRow {
        let plate = order
            .vehicle_id
            .and_then(|id| self.directory.get_vehicle(branch_id, &id))
            .map(|v| v.plate_number);
        let customer_name = self
            .directory
            .get_customer(branch_id, &order.customer_id)
            .map(|c| c.full_name);
        BoardRow::new(order, plate, customer_name, now, self.policy.overdue_after_minutes)
    }
}

fn spawn_realtime_relay(
    engine: &InMemoryOrderEngine,
    realtime_tx: broadcast::Sender<RealtimeMessage>,
) -> io::Result<WorkerHandle> {
    SubscriberWorker::spawn(
        "realtime-relay",
        engine.bus(),
        None,
        move |env: EventEnvelope<JsonValue>| -> Result<(), Infallible> {
            // No receivers is normal when nobody has the dashboard open.
            let _ = realtime_tx.send(RealtimeMessage {
                branch_id: env.branch_id(),
                topic: "order.updated".to_string(),
                payload: serde_json::json!({
                    "order_id": env.aggregate_id().to_string(),
                    "sequence": env.sequence_number(),
                    "event": env.payload(),
                }),
            });
            Ok(())
        },
    )
}

pub fn branch_sse_stream(
    services: Arc<AppServices>,
    branch_id: BranchId,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(m) if m.branch_id == branch_id => {
            let data = serde_json::to_string(&m.payload).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event(m.topic).data(data)))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
