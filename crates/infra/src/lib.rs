//! Infrastructure for the order tracker: event store, command dispatch, read
//! models, branch-scoped record stores, configuration and background workers.
//!
//! Everything is in memory behind traits.

pub mod catalog_store;
pub mod command_dispatcher;
pub mod config;
pub mod directory;
pub mod engine;
pub mod event_store;
pub mod invoices;
pub mod numbering;
pub mod projections;
pub mod queries;
pub mod read_model;
pub mod workers;

#[cfg(test)]
mod integration_tests;

pub use catalog_store::CatalogStore;
pub use command_dispatcher::{CommandDispatcher, DispatchError};
pub use config::{ConfigError, TrackerConfig};
pub use directory::{CustomerDirectory, VehicleUpdate};
pub use engine::{InMemoryOrderEngine, OrderEngine};
pub use invoices::InvoiceRegistry;
pub use numbering::DocumentNumbers;
