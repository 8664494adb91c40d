//! The started-orders dashboard: filtering, search, ordering and per-plate grouping.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tracker_orders::{OrderState, OrderStatus, Priority, exceeds_threshold};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Created, in progress or overdue.
    #[default]
    Started,
    Only(OrderStatus),
    All,
}

impl StatusFilter {
    /// Empty or unknown input means the started set.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("all") => Self::All,
            Some(s) => OrderStatus::parse(s).map(Self::Only).unwrap_or_default(),
            None => Self::Started,
        }
    }

    pub fn admits(&self, status: OrderStatus) -> bool {
        match self {
            Self::Started => status.is_active(),
            Self::Only(s) => *s == status,
            Self::All => true,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    Priority,
    /// Longest running first.
    Elapsed,
}

impl SortKey {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("oldest") => Self::Oldest,
            Some("priority") => Self::Priority,
            Some("elapsed") => Self::Elapsed,
            _ => Self::Newest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Priority => "priority",
            Self::Elapsed => "elapsed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardQuery {
    pub status: StatusFilter,
    pub search: Option<String>,
    pub sort: SortKey,
}

/// One order plus what the board shows next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardRow {
    pub order: OrderState,
    pub plate: Option<String>,
    pub customer_name: Option<String>,
    pub elapsed_minutes: i64,
    pub exceeds_threshold: bool,
}

impl BoardRow {
    pub fn new(
        order: OrderState,
        plate: Option<String>,
        customer_name: Option<String>,
        now: DateTime<Utc>,
        overdue_after_minutes: u32,
    ) -> Self {
        let elapsed_minutes = order.elapsed_minutes(now);
        let exceeds = exceeds_threshold(&order, now, overdue_after_minutes);
        Self {
            order,
            plate,
            customer_name,
            elapsed_minutes,
            exceeds_threshold: exceeds,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        let hay = [
            Some(self.order.order_number.as_str()),
            Some(self.order.description.as_str()),
            self.plate.as_deref(),
            self.customer_name.as_deref(),
        ];
        hay.into_iter()
            .flatten()
            .any(|h| h.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlateGroup {
    pub plate: Option<String>,
    pub orders: Vec<BoardRow>,
}

fn priority_rank(p: Priority) -> u8 {
    match p {
        Priority::Urgent => 0,
        Priority::High => 1,
        Priority::Medium => 2,
        Priority::Low => 3,
    }
}

/// Filters and sorts `rows`, then groups them by plate. Groups keep the order
/// of their first row; rows without a plate share one group.
pub fn started_board(rows: Vec<BoardRow>, query: &BoardQuery) -> Vec<PlateGroup> {
    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut rows: Vec<BoardRow> = rows
        .into_iter()
        .filter(|r| query.status.admits(r.order.status))
        .filter(|r| needle.as_deref().is_none_or(|n| r.matches(n)))
        .collect();

    match query.sort {
        SortKey::Newest => rows.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at)),
        SortKey::Oldest => rows.sort_by(|a, b| a.order.created_at.cmp(&b.order.created_at)),
        SortKey::Priority => rows.sort_by(|a, b| {
            priority_rank(a.order.priority)
                .cmp(&priority_rank(b.order.priority))
                .then(b.order.created_at.cmp(&a.order.created_at))
        }),
        SortKey::Elapsed => rows.sort_by(|a, b| {
            b.elapsed_minutes
                .cmp(&a.elapsed_minutes)
                .then(b.order.created_at.cmp(&a.order.created_at))
        }),
    }

    let mut groups: Vec<PlateGroup> = Vec::new();
    for row in rows {
        match groups.iter_mut().find(|g| g.plate == row.plate) {
            Some(group) => group.orders.push(row),
            None => groups.push(PlateGroup {
                plate: row.plate.clone(),
                orders: vec![row],
            }),
        }
    }
    groups
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoardKpis {
    /// Created + in progress + overdue.
    pub active: usize,
    pub created: usize,
    pub in_progress: usize,
    pub overdue: usize,
    pub completed_today: usize,
    pub cancelled_today: usize,
    /// Mean duration of orders completed today, in minutes.
    pub average_duration_today: Option<u32>,
    /// Active orders past the overdue threshold, whether or not the sweep has marked them yet.
    pub running_late: usize,
}

pub fn board_kpis(orders: &[OrderState], now: DateTime<Utc>, overdue_after_minutes: u32) -> BoardKpis {
    let today = now.date_naive();
    let mut k = BoardKpis::default();
    let mut durations: Vec<u32> = Vec::new();

    for o in orders {
        match o.status {
            OrderStatus::Created => k.created += 1,
            OrderStatus::InProgress => k.in_progress += 1,
            OrderStatus::Overdue => k.overdue += 1,
            OrderStatus::Completed => {
                if o.completed_at.is_some_and(|t| t.date_naive() == today) {
                    k.completed_today += 1;
                    durations.extend(o.actual_duration);
                }
            }
            OrderStatus::Cancelled => {
                if o.cancelled_at.is_some_and(|t| t.date_naive() == today) {
                    k.cancelled_today += 1;
                }
            }
        }
        if o.status.is_active() && exceeds_threshold(o, now, overdue_after_minutes) {
            k.running_late += 1;
        }
    }

    k.active = k.created + k.in_progress + k.overdue;
    if !durations.is_empty() {
        let total: u64 = durations.iter().map(|d| u64::from(*d)).sum();
        k.average_duration_today = u32::try_from(total / durations.len() as u64).ok();
    }
    k
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tracker_core::BranchId;
    use tracker_customers::CustomerId;
    use tracker_orders::{OrderId, OrderStarted, OrderType};

    fn order(number: &str, status: OrderStatus, priority: Priority, age_minutes: i64) -> OrderState {
        let at = Utc::now() - Duration::minutes(age_minutes);
        let mut s = OrderState::started(&OrderStarted {
            branch_id: BranchId::new(),
            order_id: OrderId::new(),
            order_number: number.into(),
            order_type: OrderType::Service,
            customer_id: CustomerId::new(),
            vehicle_id: None,
            description: format!("Order started for {number}"),
            priority,
            estimated_duration: None,
            item: None,
            inquiry: None,
            occurred_at: at,
        });
        s.status = status;
        s
    }

    fn row(o: OrderState, plate: Option<&str>) -> BoardRow {
        BoardRow::new(o, plate.map(str::to_string), Some("Plate X".into()), Utc::now(), 540)
    }

    #[test]
    fn default_query_shows_started_orders_newest_first() {
        let rows = vec![
            row(order("A", OrderStatus::Created, Priority::Low, 30), Some("T1")),
            row(order("B", OrderStatus::Completed, Priority::Low, 10), Some("T2")),
            row(order("C", OrderStatus::Overdue, Priority::Low, 5), Some("T3")),
        ];
        let groups = started_board(rows, &BoardQuery::default());
        let numbers: Vec<&str> = groups
            .iter()
            .flat_map(|g| g.orders.iter().map(|r| r.order.order_number.as_str()))
            .collect();
        assert_eq!(numbers, vec!["C", "A"]);
    }

    #[test]
    fn search_and_grouping() {
        let rows = vec![
            row(order("ORD-1", OrderStatus::Created, Priority::Low, 30), Some("T1")),
            row(order("ORD-2", OrderStatus::InProgress, Priority::Low, 20), Some("T2")),
            row(order("ORD-3", OrderStatus::InProgress, Priority::Low, 10), Some("T1")),
        ];

        let groups = started_board(rows.clone(), &BoardQuery::default());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].plate.as_deref(), Some("T1"));
        assert_eq!(groups[0].orders.len(), 2);

        let only_t2 = started_board(
            rows,
            &BoardQuery {
                search: Some(" t2 ".into()),
                ..BoardQuery::default()
            },
        );
        assert_eq!(only_t2.len(), 1);
        assert_eq!(only_t2[0].orders[0].order.order_number, "ORD-2");
    }

    #[test]
    fn priority_sort_puts_urgent_first() {
        let rows = vec![
            row(order("L", OrderStatus::Created, Priority::Low, 1), None),
            row(order("U", OrderStatus::Created, Priority::Urgent, 2), None),
            row(order("M", OrderStatus::Created, Priority::Medium, 3), None),
        ];
        let groups = started_board(
            rows,
            &BoardQuery {
                sort: SortKey::Priority,
                ..BoardQuery::default()
            },
        );
        let numbers: Vec<&str> = groups[0].orders.iter().map(|r| r.order.order_number.as_str()).collect();
        assert_eq!(numbers, vec!["U", "M", "L"]);
    }

    #[test]
    fn status_filter_parsing() {
        assert_eq!(StatusFilter::parse(None), StatusFilter::Started);
        assert_eq!(StatusFilter::parse(Some("all")), StatusFilter::All);
        assert_eq!(
            StatusFilter::parse(Some("completed")),
            StatusFilter::Only(OrderStatus::Completed)
        );
        assert_eq!(StatusFilter::parse(Some("bogus")), StatusFilter::Started);
    }

    #[test]
    fn kpis_count_overdue_as_active() {
        let now = Utc::now();
        let mut done = order("D", OrderStatus::Completed, Priority::Low, 60);
        done.completed_at = Some(now);
        done.actual_duration = Some(60);
        let orders = vec![
            order("A", OrderStatus::Created, Priority::Low, 5),
            order("B", OrderStatus::InProgress, Priority::Low, 600),
            order("C", OrderStatus::Overdue, Priority::Low, 700),
            done,
        ];

        let k = board_kpis(&orders, now, 540);
        assert_eq!(k.active, 3);
        assert_eq!(k.completed_today, 1);
        assert_eq!(k.average_duration_today, Some(60));
        assert_eq!(k.running_late, 2);
    }
}
