use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use tracker_core::{AggregateId, BranchId, ExpectedVersion};
use std::sync::Arc;

/// An event ready to be appended to a stream (not yet assigned a sequence number).
///
/// Lifecycle: the aggregate's `handle()` produces a typed event, which is wrapped
/// here with stream metadata, then stored as a [`StoredEvent`] with its sequence
/// number, then published as an `EventEnvelope`.
///
/// Use [`UncommittedEvent::from_typed`] to build one from a typed event; it
/// serializes the payload and copies `event_type`, `version` and `occurred_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncommittedEvent {
    pub event_id: Uuid,
    pub branch_id: BranchId,
    pub aggregate_id: AggregateId,
    pub aggregate_type: String,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
}

/// A persisted event.
///
/// Sequence numbers are assigned on append, start at 1, are scoped to the
/// `(branch_id, aggregate_id)` stream and never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event_id: Uuid,
    pub branch_id: BranchId,
    pub aggregate_id: AggregateId,
    pub aggregate_type: String,

    /// Monotonically increasing position in the aggregate stream.
    pub sequence_number: u64,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
}

impl StoredEvent {
    pub fn stream_version(&self) -> u64 {
        self.sequence_number
    }

    /// Branch-scoped envelope for publication.
    pub fn to_envelope(&self) -> tracker_events::EventEnvelope<JsonValue> {
        tracker_events::EventEnvelope::new(
            self.event_id,
            self.branch_id,
            self.aggregate_id,
            self.aggregate_type.clone(),
            self.sequence_number,
            self.payload.clone(),
        )
    }
}

/// Infrastructure failures of the event store (as opposed to domain rejections).
#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("branch isolation violation: {0}")]
    BranchIsolation(String),

    #[error("aggregate type mismatch: {0}")]
    AggregateTypeMismatch(String),

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("event store unavailable: {0}")]
    Unavailable(String),
}

/// Append-only, branch-scoped event store.
///
/// One stream per aggregate instance, keyed by `(branch_id, aggregate_id)`.
///
/// `append` must:
/// - reject batches that mix branches, aggregates or aggregate types
/// - check `expected_version` against the current stream version
/// - assign sequence numbers from `current_version + 1`
/// - persist the whole batch or nothing
///
/// `load_stream` returns the stream in sequence order, or an empty vector when
/// the aggregate does not exist (in that branch).
pub trait EventStore: Send + Sync {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError>;

    fn load_stream(
        &self,
        branch_id: BranchId,
        aggregate_id: AggregateId,
    ) -> Result<Vec<StoredEvent>, EventStoreError>;

    /// Every event of one branch, ordered by stream then sequence number.
    fn load_branch(&self, branch_id: BranchId) -> Result<Vec<StoredEvent>, EventStoreError>;
}

impl<S> EventStore for Arc<S>
where
    S: EventStore + ?Sized,
{
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        (**self).append(events, expected_version)
    }

    fn load_stream(
        &self,
        branch_id: BranchId,
        aggregate_id: AggregateId,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        (**self).load_stream(branch_id, aggregate_id)
    }

    fn load_branch(&self, branch_id: BranchId) -> Result<Vec<StoredEvent>, EventStoreError> {
        (**self).load_branch(branch_id)
    }
}

impl UncommittedEvent {
    pub fn from_typed<E>(
        branch_id: BranchId,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        event_id: Uuid,
        event: &E,
    ) -> Result<Self, EventStoreError>
    where
        E: tracker_events::Event + Serialize,
    {
        let payload = serde_json::to_value(event)
            .map_err(|e| EventStoreError::InvalidAppend(format!("payload serialization failed: {e}")))?;

        Ok(Self {
            event_id,
            branch_id,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            event_type: event.event_type().to_string(),
            event_version: event.version(),
            occurred_at: event.occurred_at(),
            payload,
        })
    }
}
