//! When orders move on by themselves, and when they count as running late.

use chrono::{DateTime, Duration, Utc};

use crate::model::OrderStatus;
use crate::state::OrderState;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProgressionPolicy {
    /// A `created` order becomes `in_progress` after this many minutes.
    pub auto_progress_after_minutes: u32,
    /// An `in_progress` order becomes `overdue` after this many minutes.
    pub overdue_after_minutes: u32,
}

impl Default for ProgressionPolicy {
    fn default() -> Self {
        Self {
            auto_progress_after_minutes: 10,
            overdue_after_minutes: 540,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DueTransition {
    Progress,
    MarkOverdue,
}

/// Running orders are measured against the clock; finished ones against
/// their recorded duration.
pub fn exceeds_threshold(state: &OrderState, now: DateTime<Utc>, threshold_minutes: u32) -> bool {
    match state.status {
        OrderStatus::InProgress | OrderStatus::Overdue => {
            now - state.started_at >= Duration::minutes(i64::from(threshold_minutes))
        }
        _ => state.actual_duration.is_some_and(|d| d >= threshold_minutes),
    }
}

pub fn due_transition(state: &OrderState, now: DateTime<Utc>, policy: &ProgressionPolicy) -> Option<DueTransition> {
    match state.status {
        OrderStatus::Created
            if now - state.created_at >= Duration::minutes(i64::from(policy.auto_progress_after_minutes)) =>
        {
            Some(DueTransition::Progress)
        }
        OrderStatus::InProgress if exceeds_threshold(state, now, policy.overdue_after_minutes) => {
            Some(DueTransition::MarkOverdue)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderId, OrderType, Priority};
    use crate::order::OrderStarted;
    use tracker_core::BranchId;
    use tracker_customers::CustomerId;

    fn state_started_at(at: DateTime<Utc>, status: OrderStatus) -> OrderState {
        let mut s = OrderState::started(&OrderStarted {
            branch_id: BranchId::new(),
            order_id: OrderId::new(),
            order_number: "ORD-20261018-0001".into(),
            order_type: OrderType::Service,
            customer_id: CustomerId::new(),
            vehicle_id: None,
            description: String::new(),
            priority: Priority::Medium,
            estimated_duration: None,
            item: None,
            inquiry: None,
            occurred_at: at,
        });
        s.status = status;
        s
    }

    #[test]
    fn created_orders_progress_after_the_delay() {
        let now = Utc::now();
        let policy = ProgressionPolicy::default();

        let fresh = state_started_at(now - Duration::minutes(9), OrderStatus::Created);
        assert_eq!(due_transition(&fresh, now, &policy), None);

        let stale = state_started_at(now - Duration::minutes(10), OrderStatus::Created);
        assert_eq!(due_transition(&stale, now, &policy), Some(DueTransition::Progress));
    }

    #[test]
    fn in_progress_orders_go_overdue_at_threshold() {
        let now = Utc::now();
        let policy = ProgressionPolicy::default();

        let s = state_started_at(now - Duration::minutes(540), OrderStatus::InProgress);
        assert_eq!(due_transition(&s, now, &policy), Some(DueTransition::MarkOverdue));

        let already = state_started_at(now - Duration::minutes(900), OrderStatus::Overdue);
        assert_eq!(due_transition(&already, now, &policy), None);
    }

    #[test]
    fn finished_orders_use_recorded_duration() {
        let now = Utc::now();
        let mut done = state_started_at(now - Duration::days(2), OrderStatus::Completed);
        assert!(!exceeds_threshold(&done, now, 540));
        done.actual_duration = Some(541);
        assert!(exceeds_threshold(&done, now, 540));

        let created = state_started_at(now - Duration::days(2), OrderStatus::Created);
        assert!(!exceeds_threshold(&created, now, 540));
    }
}
