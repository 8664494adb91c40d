//! Read models built from order events.
//!
//! Rebuildable from the event store, branch-isolated and idempotent under
//! redelivery.

pub mod order_board;

pub use order_board::{ORDER_AGGREGATE_TYPE, OrderBoardError, OrderBoardProjection};
