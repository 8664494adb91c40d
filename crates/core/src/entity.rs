//! Identity for records that are stored as current state rather than as event streams.

/// A record with a stable identity (customers, vehicles, invoices).
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
