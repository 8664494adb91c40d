//! Workshop orders (event-sourced).
//!
//! Business rules only: the aggregate, the state fold shared with read models,
//! description line conventions, detail-update planning, timing policy and
//! invoice amounts. No IO.

pub mod description;
pub mod details;
pub mod invoice;
pub mod model;
pub mod order;
pub mod state;
pub mod timing;

pub use details::{DetailChanges, DetailForm, ItemChange, LabourItem, plan_detail_update};
pub use invoice::{Invoice, InvoiceId, InvoiceLine, parse_amount};
pub use model::{
    ComponentKind, DelayReport, InquiryDetails, OrderComponent, OrderId, OrderStatus, OrderType,
    OverrunReport, Priority, START_ORDER_TYPES, SalesItem,
};
pub use order::{
    AddComponent, CancelOrder, CompleteOrder, ComponentAdded, CustomerReassigned, MarkOverdue, Order,
    OrderCancelled, OrderCommand, OrderCompleted, OrderDetailsUpdated, OrderEvent, OrderMarkedOverdue,
    OrderProgressed, OrderStarted, OverrunRecorded, Progress, ReassignCustomer, RecordOverrun,
    StartOrder, UpdateDetails,
};
pub use state::OrderState;
pub use timing::{DueTransition, ProgressionPolicy, due_transition, exceeds_threshold};
