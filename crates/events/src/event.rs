use chrono::{DateTime, Utc};

/// A domain fact. Immutable once emitted; its schema is versioned.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable name such as `"orders.order.completed"`.
    fn event_type(&self) -> &'static str;

    fn version(&self) -> u32;

    /// Business time of the fact.
    fn occurred_at(&self) -> DateTime<Utc>;
}
