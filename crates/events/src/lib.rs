//! Event plumbing shared by the order engine: event metadata, envelopes and a
//! small pub/sub bus.

pub mod branch;
pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use branch::BranchScoped;
pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
