//! Command execution pipeline for event-sourced aggregates.
//!
//! ```text
//! Command
//!   ↓
//! 1. Load events from store (branch-scoped)
//!   ↓
//! 2. Rehydrate aggregate
//!   ↓
//! 3. Handle command (pure decision, produces events)
//!   ↓
//! 4. Append to store (optimistic concurrency check)
//!   ↓
//! 5. Publish committed events to the bus
//! ```
//!
//! Publication happens only after a successful append. No IO of its own; it
//! composes an [`EventStore`] and an [`EventBus`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use tracker_core::{Aggregate, AggregateId, BranchId, DomainError, ExpectedVersion};
use tracker_events::{EventBus, EventEnvelope};

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The stream moved between load and append.
    #[error("concurrent modification: {0}")]
    Concurrency(String),
    /// Loaded or appended events belong to another branch or stream.
    #[error("branch isolation violation: {0}")]
    BranchIsolation(String),
    #[error("{0}")]
    Validation(String),
    /// The aggregate's lifecycle forbids the command.
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    Conflict(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0} not found")]
    NotFound(String),
    /// Historical payloads do not deserialize into the aggregate's event type.
    #[error("failed to deserialize stored event: {0}")]
    Deserialize(String),
    #[error("event store failure")]
    Store(#[source] EventStoreError),
    /// Events are committed but could not be fanned out.
    #[error("event publication failed: {0}")]
    Publish(String),
    /// Events are committed but the read model rejected them.
    #[error("projection failed: {0}")]
    Projection(String),
}

impl DispatchError {
    /// Text for a flash message or JSON `error` field.
    pub fn user_message(&self) -> String {
        match self {
            DispatchError::Validation(msg)
            | DispatchError::InvalidState(msg)
            | DispatchError::Conflict(msg) => msg.clone(),
            DispatchError::NotFound(what) => format!("{what} not found"),
            DispatchError::Unauthorized => "unauthorized".to_string(),
            DispatchError::Concurrency(_) => {
                "The order was changed by someone else, please retry".to_string()
            }
            _ => "Internal error, please retry".to_string(),
        }
    }
}

impl From<EventStoreError> for DispatchError {
    fn from(value: EventStoreError) -> Self {
        match &value {
            EventStoreError::Concurrency(msg) => DispatchError::Concurrency(msg.clone()),
            EventStoreError::BranchIsolation(msg) => DispatchError::BranchIsolation(msg.clone()),
            _ => DispatchError::Store(value),
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => DispatchError::Validation(msg),
            DomainError::InvalidState(msg) => DispatchError::InvalidState(msg),
            DomainError::Conflict(msg) => DispatchError::Conflict(msg),
            DomainError::Unauthorized => DispatchError::Unauthorized,
            DomainError::NotFound(what) => DispatchError::NotFound(what),
        }
    }
}

/// Reusable command execution engine.
///
/// Generic over the store `S` and bus `B` so tests and the server use the
/// in-memory backends while the pipeline stays the same. If publication fails
/// after an append the error is returned but the events stay committed
/// (at-least-once).
#[derive(Debug)]
pub struct CommandDispatcher<S, B> {
    store: S,
    bus: B,
}

impl<S, B> CommandDispatcher<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<S, B> CommandDispatcher<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Runs `command` against the aggregate's current stream.
    ///
    /// `make_aggregate` builds the empty instance that history is replayed into.
    /// Returns the committed events; an empty vector when the command was a no-op.
    pub fn dispatch<A>(
        &self,
        branch_id: BranchId,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        command: A::Command,
        make_aggregate: impl FnOnce(BranchId, AggregateId) -> A,
    ) -> Result<Vec<StoredEvent>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: tracker_events::Event + Serialize + DeserializeOwned,
    {
        let history = self.store.load_stream(branch_id, aggregate_id)?;
        validate_loaded_stream(branch_id, aggregate_id, &history)?;
        let expected = ExpectedVersion::Exact(stream_version(&history));

        let mut aggregate = make_aggregate(branch_id, aggregate_id);
        apply_history::<A>(&mut aggregate, &history)?;

        let decided = aggregate.handle(&command).map_err(DispatchError::from)?;
        if decided.is_empty() {
            return Ok(vec![]);
        }

        let aggregate_type = aggregate_type.into();
        let uncommitted = decided
            .iter()
            .map(|ev| {
                UncommittedEvent::from_typed(
                    branch_id,
                    aggregate_id,
                    aggregate_type.clone(),
                    Uuid::now_v7(),
                    ev,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let committed = self.store.append(uncommitted, expected)?;

        for stored in &committed {
            self.bus
                .publish(stored.to_envelope())
                .map_err(|e| DispatchError::Publish(format!("{e:?}")))?;
        }

        Ok(committed)
    }
}

fn stream_version(stream: &[StoredEvent]) -> u64 {
    stream.last().map(|e| e.sequence_number).unwrap_or(0)
}

/// Rejects foreign or out-of-order events even if the backend returned them.
fn validate_loaded_stream(
    branch_id: BranchId,
    aggregate_id: AggregateId,
    stream: &[StoredEvent],
) -> Result<(), DispatchError> {
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.branch_id != branch_id {
            return Err(DispatchError::BranchIsolation(format!(
                "loaded stream contains wrong branch_id at index {idx}"
            )));
        }
        if e.aggregate_id != aggregate_id {
            return Err(DispatchError::BranchIsolation(format!(
                "loaded stream contains wrong aggregate_id at index {idx}"
            )));
        }
        if e.sequence_number <= last {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "non-monotonic sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            ))));
        }
        last = e.sequence_number;
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[StoredEvent]) -> Result<(), DispatchError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    for stored in history {
        let ev: A::Event = serde_json::from_value(stored.payload.clone())
            .map_err(|e| DispatchError::Deserialize(e.to_string()))?;
        aggregate.apply(&ev);
    }

    Ok(())
}
