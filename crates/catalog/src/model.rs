use serde::{Deserialize, Serialize};

/// Integer id allocated sequentially per record kind, starting at 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogId(pub u64);

impl core::fmt::Display for CatalogId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl core::str::FromStr for CatalogId {
    type Err = core::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(CatalogId)
    }
}

/// Work offered on service orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceType {
    pub id: CatalogId,
    pub name: String,
    pub estimated_minutes: u32,
    pub is_active: bool,
}

/// Extra work offered alongside tyre sales (balancing, fitting...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAddon {
    pub id: CatalogId,
    pub name: String,
    pub estimated_minutes: u32,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: CatalogId,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
}

/// Stocked product. Money in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: CatalogId,
    pub name: String,
    pub brand_id: Option<CatalogId>,
    pub description: Option<String>,
    pub quantity: i64,
    pub price: i64,
    pub cost_price: i64,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub reorder_level: i64,
    pub location: Option<String>,
    pub is_active: bool,
}

impl InventoryItem {
    pub fn needs_reorder(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabourCategory {
    Labour,
    Service,
    #[serde(rename = "tyre service")]
    TyreService,
    Sales,
    Unspecified,
}

impl LabourCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabourCategory::Labour => "labour",
            LabourCategory::Service => "service",
            LabourCategory::TyreService => "tyre service",
            LabourCategory::Sales => "sales",
            LabourCategory::Unspecified => "unspecified",
        }
    }

    /// Case-insensitive; accepts `tyre_service` as well as `tyre service`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('_', " ").as_str() {
            "labour" => Some(LabourCategory::Labour),
            "service" => Some(LabourCategory::Service),
            "tyre service" => Some(LabourCategory::TyreService),
            "sales" => Some(LabourCategory::Sales),
            "unspecified" => Some(LabourCategory::Unspecified),
            _ => None,
        }
    }
}

/// A billable work code. When `item_name` is set it also prefills the order's
/// item details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabourCode {
    pub id: CatalogId,
    pub code: String,
    pub description: String,
    pub item_name: Option<String>,
    pub brand: Option<String>,
    pub quantity: Option<u32>,
    pub tire_type: Option<String>,
    pub category: LabourCategory,
    pub is_active: bool,
}

impl LabourCode {
    /// `CODE - description`, as written into order descriptions.
    pub fn label(&self) -> String {
        format!("{} - {}", self.code, self.description)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayReasonCategory {
    pub id: CatalogId,
    pub category: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayReason {
    pub id: CatalogId,
    pub category_id: CatalogId,
    pub reason_text: String,
    pub is_active: bool,
}
