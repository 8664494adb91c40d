//! Append-only event store boundary.
//!
//! Branch-scoped event streams behind a trait; the in-memory backend is the only
//! one shipped.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
