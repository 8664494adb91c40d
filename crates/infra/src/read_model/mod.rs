//! Branch-isolated read model storage.

pub mod branch_store;

pub use branch_store::{BranchStore, InMemoryBranchStore};
