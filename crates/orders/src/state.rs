use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tracker_core::BranchId;
use tracker_customers::{CustomerId, VehicleId};

use crate::details::ItemChange;
use crate::model::{
    DelayReport, InquiryDetails, OrderComponent, OrderId, OrderStatus, OrderType, OverrunReport,
    Priority, SalesItem,
};
use crate::order::{OrderEvent, OrderStarted};

/// Current view of one order, folded from its events.
///
/// Used both inside the aggregate and by the order board read model, so the two
/// can never disagree about what an event means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderState {
    pub id: OrderId,
    pub branch_id: BranchId,
    pub order_number: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub priority: Priority,
    pub customer_id: CustomerId,
    pub vehicle_id: Option<VehicleId>,
    pub description: String,
    pub estimated_duration: Option<u32>,
    pub item: Option<SalesItem>,
    pub inquiry: Option<InquiryDetails>,
    pub delay: Option<DelayReport>,
    pub exceeded_threshold: bool,
    pub overrun: Option<OverrunReport>,
    pub components: Vec<OrderComponent>,
    pub created_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub actual_duration: Option<u32>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl OrderState {
    pub fn started(e: &OrderStarted) -> Self {
        Self {
            id: e.order_id,
            branch_id: e.branch_id,
            order_number: e.order_number.clone(),
            order_type: e.order_type,
            status: OrderStatus::Created,
            priority: e.priority,
            customer_id: e.customer_id,
            vehicle_id: e.vehicle_id,
            description: e.description.clone(),
            estimated_duration: e.estimated_duration,
            item: e.item.clone(),
            inquiry: e.inquiry.clone(),
            delay: None,
            exceeded_threshold: false,
            overrun: None,
            components: Vec::new(),
            created_at: e.occurred_at,
            started_at: e.occurred_at,
            completed_at: None,
            actual_duration: None,
            cancelled_at: None,
            cancellation_reason: None,
            updated_at: e.occurred_at,
        }
    }

    /// Folds a whole stream; `None` when it does not begin with `OrderStarted`.
    pub fn replay<'a>(events: impl IntoIterator<Item = &'a OrderEvent>) -> Option<Self> {
        let mut state: Option<Self> = None;
        for event in events {
            match state.as_mut() {
                Some(s) => s.evolve(event),
                None => match event {
                    OrderEvent::OrderStarted(e) => state = Some(Self::started(e)),
                    _ => return None,
                },
            }
        }
        state
    }

    pub fn evolve(&mut self, event: &OrderEvent) {
        match event {
            OrderEvent::OrderStarted(e) => *self = Self::started(e),
            OrderEvent::CustomerReassigned(e) => {
                self.customer_id = e.customer_id;
                if let Some(vehicle_id) = e.vehicle_id {
                    self.vehicle_id = Some(vehicle_id);
                }
            }
            OrderEvent::OrderDetailsUpdated(e) => {
                let c = &e.changes;
                if let Some(t) = c.order_type {
                    self.order_type = t;
                }
                match &c.item {
                    Some(ItemChange::Set(item)) => self.item = Some(item.clone()),
                    Some(ItemChange::Clear) => self.item = None,
                    None => {}
                }
                if let Some(desc) = &c.description {
                    self.description = desc.clone();
                }
                if let Some(minutes) = c.estimated_duration {
                    self.estimated_duration = Some(minutes);
                }
                if let Some(p) = c.priority {
                    self.priority = p;
                }
            }
            OrderEvent::ComponentAdded(e) => self.components.push(e.component.clone()),
            OrderEvent::OrderProgressed(_) => self.status = OrderStatus::InProgress,
            OrderEvent::OrderMarkedOverdue(_) => self.status = OrderStatus::Overdue,
            OrderEvent::OverrunRecorded(e) => self.overrun = Some(e.report.clone()),
            OrderEvent::OrderCompleted(e) => {
                self.status = OrderStatus::Completed;
                self.completed_at = Some(e.occurred_at);
                self.actual_duration = Some(e.actual_duration);
                self.exceeded_threshold = e.exceeded_threshold;
                if e.delay.is_some() {
                    self.delay = e.delay.clone();
                }
            }
            OrderEvent::OrderCancelled(e) => {
                self.status = OrderStatus::Cancelled;
                self.cancelled_at = Some(e.occurred_at);
                self.cancellation_reason = Some(e.reason.clone());
            }
        }

        self.updated_at = tracker_events::Event::occurred_at(event);
    }

    /// Minutes since the order started, measured at `now`.
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_minutes().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderProgressed, OverrunRecorded};

    fn started(at: DateTime<Utc>) -> OrderStarted {
        OrderStarted {
            branch_id: BranchId::new(),
            order_id: OrderId::new(),
            order_number: "ORD-20261018-0007".into(),
            order_type: OrderType::Sales,
            customer_id: CustomerId::new(),
            vehicle_id: None,
            description: String::new(),
            priority: Priority::Low,
            estimated_duration: None,
            item: None,
            inquiry: None,
            occurred_at: at,
        }
    }

    #[test]
    fn replay_requires_a_start_event() {
        let at = Utc::now();
        let s = started(at);
        let progressed = OrderEvent::OrderProgressed(OrderProgressed {
            branch_id: s.branch_id,
            order_id: s.order_id,
            occurred_at: at,
        });

        assert!(OrderState::replay([&progressed]).is_none());

        let start = OrderEvent::OrderStarted(s);
        let state = OrderState::replay([&start, &progressed]).unwrap();
        assert_eq!(state.status, OrderStatus::InProgress);
    }

    #[test]
    fn evolve_tracks_last_update_time() {
        let at = Utc::now();
        let s = started(at);
        let mut state = OrderState::started(&s);
        let later = at + chrono::Duration::minutes(3);
        state.evolve(&OrderEvent::OverrunRecorded(OverrunRecorded {
            branch_id: s.branch_id,
            order_id: s.order_id,
            report: OverrunReport {
                reason: "Stuck bolt".into(),
                reported_at: later,
                reported_by: "amina".into(),
            },
            occurred_at: later,
        }));
        assert_eq!(state.updated_at, later);
        assert_eq!(state.elapsed_minutes(later), 3);
    }
}
