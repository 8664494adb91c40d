use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tracker_catalog::CatalogId;
use tracker_core::{AggregateId, DomainError};

/// Order identifier; doubles as the event stream id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub AggregateId);

impl OrderId {
    pub fn new() -> Self {
        Self(AggregateId::new())
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for OrderId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<AggregateId>().map(Self)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Service,
    Sales,
    Inquiry,
    Labour,
    Unspecified,
    Mixed,
}

/// Every type the start-order endpoint accepts, in display order.
pub const START_ORDER_TYPES: [OrderType; 6] = [
    OrderType::Service,
    OrderType::Sales,
    OrderType::Inquiry,
    OrderType::Labour,
    OrderType::Unspecified,
    OrderType::Mixed,
];

impl OrderType {
    pub fn parse(raw: &str) -> Option<Self> {
        START_ORDER_TYPES.into_iter().find(|t| t.as_str() == raw.trim())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Service => "service",
            OrderType::Sales => "sales",
            OrderType::Inquiry => "inquiry",
            OrderType::Labour => "labour",
            OrderType::Unspecified => "unspecified",
            OrderType::Mixed => "mixed",
        }
    }

    /// Types whose orders carry item details.
    pub fn carries_item(&self) -> bool {
        matches!(self, OrderType::Sales | OrderType::Service | OrderType::Labour)
    }

    /// Types whose descriptions list labour codes.
    pub fn lists_labour_codes(&self) -> bool {
        matches!(self, OrderType::Service | OrderType::Labour)
    }
}

impl core::fmt::Display for OrderType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Created,
    InProgress,
    Overdue,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "created" => Some(Self::Created),
            "in_progress" => Some(Self::InProgress),
            "overdue" => Some(Self::Overdue),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::InProgress => "in_progress",
            Self::Overdue => "overdue",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// A started order: still on the workshop floor.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Created | Self::InProgress | Self::Overdue)
    }

    pub fn is_closed(&self) -> bool {
        !self.is_active()
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Unknown or empty input falls back to medium.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "low" => Self::Low,
            "high" => Self::High,
            "urgent" => Self::Urgent,
            _ => Self::Medium,
        }
    }
}

/// Product sold or fitted on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesItem {
    pub item_name: String,
    pub brand: Option<String>,
    pub quantity: Option<u32>,
    pub tire_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InquiryDetails {
    pub inquiry_type: Option<String>,
    pub questions: Option<String>,
    pub contact_preference: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayReport {
    pub reason_id: CatalogId,
    pub reported_at: DateTime<Utc>,
    pub reported_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrunReport {
    pub reason: String,
    pub reported_at: DateTime<Utc>,
    pub reported_by: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Service,
    Sales,
}

impl ComponentKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "service" => Some(Self::Service),
            "sales" => Some(Self::Sales),
            _ => None,
        }
    }
}

/// Extra line of work attached to an order after it started (at most one per kind).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderComponent {
    pub kind: ComponentKind,
    pub reason: String,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
}
