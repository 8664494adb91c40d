use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tracker_catalog::CatalogId;
use tracker_core::{Aggregate, AggregateRoot, BranchId, DomainError};
use tracker_customers::{CustomerId, VehicleId};
use tracker_events::Event;

use crate::details::DetailChanges;
use crate::model::{
    ComponentKind, DelayReport, InquiryDetails, OrderComponent, OrderId, OrderStatus, OrderType,
    OverrunReport, Priority, SalesItem,
};
use crate::state::OrderState;
use crate::timing;

/// Aggregate root: Order.
///
/// The state itself lives in [`OrderState`] so read models can fold the same
/// events with the same code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    state: Option<OrderState>,
    version: u64,
}

impl Order {
    /// Not-yet-started instance for rehydration.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            state: None,
            version: 0,
        }
    }

    pub fn state(&self) -> Option<&OrderState> {
        self.state.as_ref()
    }

    pub fn into_state(self) -> Option<OrderState> {
        self.state
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

// ── commands ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartOrder {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub order_number: String,
    pub order_type: OrderType,
    pub customer_id: CustomerId,
    pub vehicle_id: Option<VehicleId>,
    pub description: String,
    pub priority: Priority,
    pub estimated_duration: Option<u32>,
    pub item: Option<SalesItem>,
    pub inquiry: Option<InquiryDetails>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignCustomer {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    /// `None` keeps the current vehicle.
    pub vehicle_id: Option<VehicleId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDetails {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub changes: DetailChanges,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddComponent {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub kind: ComponentKind,
    pub reason: String,
    pub added_by: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkOverdue {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOverrun {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub reason: String,
    pub reported_by: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteOrder {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub delay_reason: Option<CatalogId>,
    /// Stored as the overrun reason; an earlier reporter and timestamp are kept.
    pub comments: Option<String>,
    pub completed_by: String,
    /// Require a delay reason once the order is past `overdue_after_minutes`.
    pub enforce_delay_reason: bool,
    pub overdue_after_minutes: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    StartOrder(StartOrder),
    ReassignCustomer(ReassignCustomer),
    UpdateDetails(UpdateDetails),
    AddComponent(AddComponent),
    Progress(Progress),
    MarkOverdue(MarkOverdue),
    RecordOverrun(RecordOverrun),
    CompleteOrder(CompleteOrder),
    CancelOrder(CancelOrder),
}

impl OrderCommand {
    pub fn branch_id(&self) -> BranchId {
        match self {
            OrderCommand::StartOrder(c) => c.branch_id,
            OrderCommand::ReassignCustomer(c) => c.branch_id,
            OrderCommand::UpdateDetails(c) => c.branch_id,
            OrderCommand::AddComponent(c) => c.branch_id,
            OrderCommand::Progress(c) => c.branch_id,
            OrderCommand::MarkOverdue(c) => c.branch_id,
            OrderCommand::RecordOverrun(c) => c.branch_id,
            OrderCommand::CompleteOrder(c) => c.branch_id,
            OrderCommand::CancelOrder(c) => c.branch_id,
        }
    }

    pub fn order_id(&self) -> OrderId {
        match self {
            OrderCommand::StartOrder(c) => c.order_id,
            OrderCommand::ReassignCustomer(c) => c.order_id,
            OrderCommand::UpdateDetails(c) => c.order_id,
            OrderCommand::AddComponent(c) => c.order_id,
            OrderCommand::Progress(c) => c.order_id,
            OrderCommand::MarkOverdue(c) => c.order_id,
            OrderCommand::RecordOverrun(c) => c.order_id,
            OrderCommand::CompleteOrder(c) => c.order_id,
            OrderCommand::CancelOrder(c) => c.order_id,
        }
    }
}

// ── events ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStarted {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub order_number: String,
    pub order_type: OrderType,
    pub customer_id: CustomerId,
    pub vehicle_id: Option<VehicleId>,
    pub description: String,
    pub priority: Priority,
    pub estimated_duration: Option<u32>,
    pub item: Option<SalesItem>,
    pub inquiry: Option<InquiryDetails>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerReassigned {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub vehicle_id: Option<VehicleId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetailsUpdated {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub changes: DetailChanges,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentAdded {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub component: OrderComponent,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderProgressed {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMarkedOverdue {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrunRecorded {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub report: OverrunReport,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCompleted {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub delay: Option<DelayReport>,
    pub exceeded_threshold: bool,
    /// Whole minutes between `started_at` and completion.
    pub actual_duration: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderStarted(OrderStarted),
    CustomerReassigned(CustomerReassigned),
    OrderDetailsUpdated(OrderDetailsUpdated),
    ComponentAdded(ComponentAdded),
    OrderProgressed(OrderProgressed),
    OrderMarkedOverdue(OrderMarkedOverdue),
    OverrunRecorded(OverrunRecorded),
    OrderCompleted(OrderCompleted),
    OrderCancelled(OrderCancelled),
}

impl OrderEvent {
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderEvent::OrderStarted(e) => e.order_id,
            OrderEvent::CustomerReassigned(e) => e.order_id,
            OrderEvent::OrderDetailsUpdated(e) => e.order_id,
            OrderEvent::ComponentAdded(e) => e.order_id,
            OrderEvent::OrderProgressed(e) => e.order_id,
            OrderEvent::OrderMarkedOverdue(e) => e.order_id,
            OrderEvent::OverrunRecorded(e) => e.order_id,
            OrderEvent::OrderCompleted(e) => e.order_id,
            OrderEvent::OrderCancelled(e) => e.order_id,
        }
    }
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderStarted(_) => "orders.order.started",
            OrderEvent::CustomerReassigned(_) => "orders.order.customer_reassigned",
            OrderEvent::OrderDetailsUpdated(_) => "orders.order.details_updated",
            OrderEvent::ComponentAdded(_) => "orders.order.component_added",
            OrderEvent::OrderProgressed(_) => "orders.order.progressed",
            OrderEvent::OrderMarkedOverdue(_) => "orders.order.marked_overdue",
            OrderEvent::OverrunRecorded(_) => "orders.order.overrun_recorded",
            OrderEvent::OrderCompleted(_) => "orders.order.completed",
            OrderEvent::OrderCancelled(_) => "orders.order.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderStarted(e) => e.occurred_at,
            OrderEvent::CustomerReassigned(e) => e.occurred_at,
            OrderEvent::OrderDetailsUpdated(e) => e.occurred_at,
            OrderEvent::ComponentAdded(e) => e.occurred_at,
            OrderEvent::OrderProgressed(e) => e.occurred_at,
            OrderEvent::OrderMarkedOverdue(e) => e.occurred_at,
            OrderEvent::OverrunRecorded(e) => e.occurred_at,
            OrderEvent::OrderCompleted(e) => e.occurred_at,
            OrderEvent::OrderCancelled(e) => e.occurred_at,
        }
    }
}

// ── decide / evolve ──────────────────────────────────────────────────────────

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        if let OrderEvent::OrderStarted(e) = event {
            self.id = e.order_id;
            self.state = Some(OrderState::started(e));
        } else if let Some(state) = self.state.as_mut() {
            state.evolve(event);
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::StartOrder(cmd) => self.handle_start(cmd),
            OrderCommand::ReassignCustomer(cmd) => self.handle_reassign(cmd),
            OrderCommand::UpdateDetails(cmd) => self.handle_update(cmd),
            OrderCommand::AddComponent(cmd) => self.handle_add_component(cmd),
            OrderCommand::Progress(cmd) => self.handle_progress(cmd),
            OrderCommand::MarkOverdue(cmd) => self.handle_mark_overdue(cmd),
            OrderCommand::RecordOverrun(cmd) => self.handle_overrun(cmd),
            OrderCommand::CompleteOrder(cmd) => self.handle_complete(cmd),
            OrderCommand::CancelOrder(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl Order {
    fn existing(&self, branch_id: BranchId, order_id: OrderId) -> Result<&OrderState, DomainError> {
        let state = self.state.as_ref().ok_or_else(|| DomainError::not_found("order"))?;
        // Another branch's order is indistinguishable from a missing one.
        if state.branch_id != branch_id || state.id != order_id {
            return Err(DomainError::not_found("order"));
        }
        Ok(state)
    }

    fn open(&self, branch_id: BranchId, order_id: OrderId) -> Result<&OrderState, DomainError> {
        let state = self.existing(branch_id, order_id)?;
        if state.status.is_closed() {
            return Err(DomainError::invalid_state(format!(
                "order {} is {} and can no longer be changed",
                state.order_number, state.status
            )));
        }
        Ok(state)
    }

    fn handle_start(&self, cmd: &StartOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.state.is_some() {
            return Err(DomainError::conflict("order already exists"));
        }
        if cmd.order_number.trim().is_empty() {
            return Err(DomainError::validation("order number is required"));
        }

        Ok(vec![OrderEvent::OrderStarted(OrderStarted {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            order_number: cmd.order_number.clone(),
            order_type: cmd.order_type,
            customer_id: cmd.customer_id,
            vehicle_id: cmd.vehicle_id,
            description: cmd.description.clone(),
            priority: cmd.priority,
            estimated_duration: cmd.estimated_duration,
            item: cmd.item.clone(),
            inquiry: cmd.inquiry.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reassign(&self, cmd: &ReassignCustomer) -> Result<Vec<OrderEvent>, DomainError> {
        self.open(cmd.branch_id, cmd.order_id)?;

        Ok(vec![OrderEvent::CustomerReassigned(CustomerReassigned {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            customer_id: cmd.customer_id,
            vehicle_id: cmd.vehicle_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateDetails) -> Result<Vec<OrderEvent>, DomainError> {
        self.open(cmd.branch_id, cmd.order_id)?;

        if cmd.changes.is_empty() {
            return Ok(Vec::new());
        }

        Ok(vec![OrderEvent::OrderDetailsUpdated(OrderDetailsUpdated {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            changes: cmd.changes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_component(&self, cmd: &AddComponent) -> Result<Vec<OrderEvent>, DomainError> {
        let state = self.existing(cmd.branch_id, cmd.order_id)?;

        if cmd.reason.trim().is_empty() {
            return Err(DomainError::validation("component reason is required"));
        }
        if state.components.iter().any(|c| c.kind == cmd.kind) {
            return Ok(Vec::new());
        }

        Ok(vec![OrderEvent::ComponentAdded(ComponentAdded {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            component: OrderComponent {
                kind: cmd.kind,
                reason: cmd.reason.trim().to_string(),
                added_by: cmd.added_by.clone(),
                added_at: cmd.occurred_at,
            },
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_progress(&self, cmd: &Progress) -> Result<Vec<OrderEvent>, DomainError> {
        let state = self.existing(cmd.branch_id, cmd.order_id)?;
        if state.status != OrderStatus::Created {
            return Err(DomainError::invalid_state(format!(
                "only created orders can progress (status: {})",
                state.status
            )));
        }

        Ok(vec![OrderEvent::OrderProgressed(OrderProgressed {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_mark_overdue(&self, cmd: &MarkOverdue) -> Result<Vec<OrderEvent>, DomainError> {
        let state = self.existing(cmd.branch_id, cmd.order_id)?;
        if state.status != OrderStatus::InProgress {
            return Err(DomainError::invalid_state(format!(
                "only in-progress orders can become overdue (status: {})",
                state.status
            )));
        }

        Ok(vec![OrderEvent::OrderMarkedOverdue(OrderMarkedOverdue {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_overrun(&self, cmd: &RecordOverrun) -> Result<Vec<OrderEvent>, DomainError> {
        self.existing(cmd.branch_id, cmd.order_id)?;

        let reason = cmd.reason.trim();
        if reason.is_empty() {
            return Err(DomainError::validation("Reason is required"));
        }

        Ok(vec![OrderEvent::OverrunRecorded(OverrunRecorded {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            report: OverrunReport {
                reason: reason.to_string(),
                reported_at: cmd.occurred_at,
                reported_by: cmd.reported_by.clone(),
            },
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_complete(&self, cmd: &CompleteOrder) -> Result<Vec<OrderEvent>, DomainError> {
        let state = self.open(cmd.branch_id, cmd.order_id)?;

        let exceeded = timing::exceeds_threshold(state, cmd.occurred_at, cmd.overdue_after_minutes);
        if cmd.enforce_delay_reason && exceeded && cmd.delay_reason.is_none() {
            return Err(DomainError::validation("delay reason required"));
        }

        let mut events = Vec::with_capacity(2);

        if let Some(comments) = cmd.comments.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            let (reported_at, reported_by) = match &state.overrun {
                Some(prev) => (prev.reported_at, prev.reported_by.clone()),
                None => (cmd.occurred_at, cmd.completed_by.clone()),
            };
            events.push(OrderEvent::OverrunRecorded(OverrunRecorded {
                branch_id: cmd.branch_id,
                order_id: cmd.order_id,
                report: OverrunReport {
                    reason: comments.to_string(),
                    reported_at,
                    reported_by,
                },
                occurred_at: cmd.occurred_at,
            }));
        }

        let elapsed = (cmd.occurred_at - state.started_at).num_minutes().max(0);
        events.push(OrderEvent::OrderCompleted(OrderCompleted {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            delay: cmd.delay_reason.map(|reason_id| DelayReport {
                reason_id,
                reported_at: cmd.occurred_at,
                reported_by: cmd.completed_by.clone(),
            }),
            exceeded_threshold: exceeded,
            actual_duration: u32::try_from(elapsed).unwrap_or(u32::MAX),
            occurred_at: cmd.occurred_at,
        }));

        Ok(events)
    }

    fn handle_cancel(&self, cmd: &CancelOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.open(cmd.branch_id, cmd.order_id)?;

        let reason = cmd.reason.trim();
        if reason.is_empty() {
            return Err(DomainError::validation("cancellation reason is required"));
        }

        Ok(vec![OrderEvent::OrderCancelled(OrderCancelled {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            reason: reason.to_string(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::details::ItemChange;
    use chrono::Duration;

    struct Fixture {
        branch_id: BranchId,
        order_id: OrderId,
        started_at: DateTime<Utc>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                branch_id: BranchId::new(),
                order_id: OrderId::new(),
                started_at: Utc::now() - Duration::hours(1),
            }
        }

        fn start(&self) -> StartOrder {
            StartOrder {
                branch_id: self.branch_id,
                order_id: self.order_id,
                order_number: "ORD-20261018-0001".into(),
                order_type: OrderType::Service,
                customer_id: CustomerId::new(),
                vehicle_id: Some(VehicleId::new()),
                description: "Order started for T123ABC".into(),
                priority: Priority::Medium,
                estimated_duration: Some(30),
                item: None,
                inquiry: None,
                occurred_at: self.started_at,
            }
        }

        fn started(&self) -> Order {
            let mut order = Order::empty(self.order_id);
            run(&mut order, OrderCommand::StartOrder(self.start())).unwrap();
            order
        }

        fn complete(&self, at: DateTime<Utc>, delay_reason: Option<CatalogId>) -> CompleteOrder {
            CompleteOrder {
                branch_id: self.branch_id,
                order_id: self.order_id,
                delay_reason,
                comments: None,
                completed_by: "clerk".into(),
                enforce_delay_reason: true,
                overdue_after_minutes: 540,
                occurred_at: at,
            }
        }
    }

    fn run(order: &mut Order, cmd: OrderCommand) -> Result<Vec<OrderEvent>, DomainError> {
        let events = order.handle(&cmd)?;
        for e in &events {
            order.apply(e);
        }
        Ok(events)
    }

    #[test]
    fn start_order_creates_a_created_order() {
        let fx = Fixture::new();
        let order = fx.started();

        let state = order.state().unwrap();
        assert_eq!(state.status, OrderStatus::Created);
        assert_eq!(state.created_at, fx.started_at);
        assert_eq!(state.started_at, fx.started_at);
        assert_eq!(order.version(), 1);
    }

    #[test]
    fn start_twice_conflicts() {
        let fx = Fixture::new();
        let order = fx.started();
        let err = order.handle(&OrderCommand::StartOrder(fx.start())).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn commands_on_unknown_or_foreign_orders_are_not_found() {
        let fx = Fixture::new();
        let empty = Order::empty(fx.order_id);
        let progress = Progress {
            branch_id: fx.branch_id,
            order_id: fx.order_id,
            occurred_at: Utc::now(),
        };
        assert!(matches!(
            empty.handle(&OrderCommand::Progress(progress.clone())),
            Err(DomainError::NotFound(_))
        ));

        let order = fx.started();
        let foreign = Progress {
            branch_id: BranchId::new(),
            ..progress
        };
        assert!(matches!(
            order.handle(&OrderCommand::Progress(foreign)),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn lifecycle_created_in_progress_overdue_completed() {
        let fx = Fixture::new();
        let mut order = fx.started();
        let now = Utc::now();

        run(
            &mut order,
            OrderCommand::Progress(Progress {
                branch_id: fx.branch_id,
                order_id: fx.order_id,
                occurred_at: now,
            }),
        )
        .unwrap();
        assert_eq!(order.state().unwrap().status, OrderStatus::InProgress);

        // Progress is only valid from created.
        let again = order.handle(&OrderCommand::Progress(Progress {
            branch_id: fx.branch_id,
            order_id: fx.order_id,
            occurred_at: now,
        }));
        assert!(matches!(again, Err(DomainError::InvalidState(_))));

        run(
            &mut order,
            OrderCommand::MarkOverdue(MarkOverdue {
                branch_id: fx.branch_id,
                order_id: fx.order_id,
                occurred_at: now,
            }),
        )
        .unwrap();
        assert_eq!(order.state().unwrap().status, OrderStatus::Overdue);

        run(&mut order, OrderCommand::CompleteOrder(fx.complete(now, None))).unwrap();
        let state = order.state().unwrap();
        assert_eq!(state.status, OrderStatus::Completed);
        assert_eq!(state.completed_at, Some(now));
        assert_eq!(state.actual_duration, Some(60));
    }

    #[test]
    fn completing_past_threshold_requires_delay_reason() {
        let fx = Fixture::new();
        let mut order = fx.started();
        let now = Utc::now();
        run(
            &mut order,
            OrderCommand::Progress(Progress {
                branch_id: fx.branch_id,
                order_id: fx.order_id,
                occurred_at: now,
            }),
        )
        .unwrap();

        let late = fx.started_at + Duration::minutes(600);
        let err = order
            .handle(&OrderCommand::CompleteOrder(fx.complete(late, None)))
            .unwrap_err();
        assert_eq!(err, DomainError::validation("delay reason required"));

        let mut lenient = fx.complete(late, None);
        lenient.enforce_delay_reason = false;
        assert!(order.handle(&OrderCommand::CompleteOrder(lenient)).is_ok());

        let events = run(&mut order, OrderCommand::CompleteOrder(fx.complete(late, Some(CatalogId(3))))).unwrap();
        match &events[0] {
            OrderEvent::OrderCompleted(e) => {
                assert!(e.exceeded_threshold);
                assert_eq!(e.delay.as_ref().unwrap().reason_id, CatalogId(3));
                assert_eq!(e.actual_duration, 600);
            }
            other => panic!("expected OrderCompleted, got {other:?}"),
        }
    }

    #[test]
    fn completion_comments_keep_the_first_overrun_reporter() {
        let fx = Fixture::new();
        let mut order = fx.started();
        let first_at = fx.started_at + Duration::minutes(5);
        run(
            &mut order,
            OrderCommand::RecordOverrun(RecordOverrun {
                branch_id: fx.branch_id,
                order_id: fx.order_id,
                reason: "Waiting on parts".into(),
                reported_by: "amina".into(),
                occurred_at: first_at,
            }),
        )
        .unwrap();

        let mut complete = fx.complete(Utc::now(), None);
        complete.comments = Some("  Parts arrived late ".into());
        let events = run(&mut order, OrderCommand::CompleteOrder(complete)).unwrap();
        assert_eq!(events.len(), 2);

        let overrun = order.state().unwrap().overrun.clone().unwrap();
        assert_eq!(overrun.reason, "Parts arrived late");
        assert_eq!(overrun.reported_by, "amina");
        assert_eq!(overrun.reported_at, first_at);
    }

    #[test]
    fn explicit_overrun_overwrites_and_requires_text() {
        let fx = Fixture::new();
        let mut order = fx.started();
        let cmd = |reason: &str, by: &str| {
            OrderCommand::RecordOverrun(RecordOverrun {
                branch_id: fx.branch_id,
                order_id: fx.order_id,
                reason: reason.into(),
                reported_by: by.into(),
                occurred_at: Utc::now(),
            })
        };

        assert!(matches!(order.handle(&cmd("   ", "a")), Err(DomainError::Validation(_))));
        run(&mut order, cmd("first", "a")).unwrap();
        run(&mut order, cmd("second", "b")).unwrap();
        let overrun = order.state().unwrap().overrun.clone().unwrap();
        assert_eq!((overrun.reason.as_str(), overrun.reported_by.as_str()), ("second", "b"));
    }

    #[test]
    fn closed_orders_reject_edits() {
        let fx = Fixture::new();
        let mut order = fx.started();
        run(&mut order, OrderCommand::CompleteOrder(fx.complete(Utc::now(), None))).unwrap();

        let update = UpdateDetails {
            branch_id: fx.branch_id,
            order_id: fx.order_id,
            changes: DetailChanges {
                estimated_duration: Some(90),
                ..DetailChanges::default()
            },
            occurred_at: Utc::now(),
        };
        assert!(matches!(
            order.handle(&OrderCommand::UpdateDetails(update)),
            Err(DomainError::InvalidState(_))
        ));
        assert!(matches!(
            order.handle(&OrderCommand::CompleteOrder(fx.complete(Utc::now(), None))),
            Err(DomainError::InvalidState(_))
        ));
    }

    #[test]
    fn empty_detail_changes_emit_nothing_and_real_ones_apply() {
        let fx = Fixture::new();
        let mut order = fx.started();
        let update = |changes: DetailChanges| {
            OrderCommand::UpdateDetails(UpdateDetails {
                branch_id: fx.branch_id,
                order_id: fx.order_id,
                changes,
                occurred_at: Utc::now(),
            })
        };

        assert!(run(&mut order, update(DetailChanges::default())).unwrap().is_empty());

        let item = SalesItem {
            item_name: "Brake Pad Set".into(),
            brand: Some("Continental".into()),
            quantity: Some(1),
            tire_type: None,
        };
        run(
            &mut order,
            update(DetailChanges {
                order_type: Some(OrderType::Labour),
                item: Some(ItemChange::Set(item.clone())),
                description: Some("Services: Brake Service".into()),
                estimated_duration: Some(45),
                priority: Some(Priority::High),
            }),
        )
        .unwrap();

        let state = order.state().unwrap();
        assert_eq!(state.order_type, OrderType::Labour);
        assert_eq!(state.item, Some(item));
        assert_eq!(state.description, "Services: Brake Service");
        assert_eq!(state.estimated_duration, Some(45));
        assert_eq!(state.priority, Priority::High);
        assert_eq!(order.version(), 2);
    }

    #[test]
    fn one_component_per_kind() {
        let fx = Fixture::new();
        let mut order = fx.started();
        let add = |kind| {
            OrderCommand::AddComponent(AddComponent {
                branch_id: fx.branch_id,
                order_id: fx.order_id,
                kind,
                reason: "Customer asked for new tyres".into(),
                added_by: "clerk".into(),
                occurred_at: Utc::now(),
            })
        };

        assert_eq!(run(&mut order, add(ComponentKind::Sales)).unwrap().len(), 1);
        assert!(run(&mut order, add(ComponentKind::Sales)).unwrap().is_empty());
        assert_eq!(run(&mut order, add(ComponentKind::Service)).unwrap().len(), 1);
        assert_eq!(order.state().unwrap().components.len(), 2);
    }

    #[test]
    fn cancel_closes_the_order() {
        let fx = Fixture::new();
        let mut order = fx.started();
        run(
            &mut order,
            OrderCommand::CancelOrder(CancelOrder {
                branch_id: fx.branch_id,
                order_id: fx.order_id,
                reason: "Customer left".into(),
                occurred_at: Utc::now(),
            }),
        )
        .unwrap();

        let state = order.state().unwrap();
        assert_eq!(state.status, OrderStatus::Cancelled);
        assert_eq!(state.cancellation_reason.as_deref(), Some("Customer left"));
    }
}
