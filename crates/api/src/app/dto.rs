use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use tracker_catalog::{Catalog, InventoryItem, LabourCode};
use tracker_customers::{Customer, Vehicle};
use tracker_infra::queries::{BoardRow, PlateGroup};
use tracker_orders::{Invoice, OrderState};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StartOrderRequest {
    pub plate_number: Option<String>,
    pub order_type: Option<String>,
    pub use_existing_customer: bool,
    pub existing_customer_id: Option<String>,
    pub service_selection: Vec<String>,
    pub estimated_duration: Option<u32>,
    pub force_new_order: bool,
}

#[derive(Debug, Deserialize)]
pub struct CheckPlateRequest {
    pub plate_number: String,
}

#[derive(Debug, Deserialize)]
pub struct OverrunReasonRequest {
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LabourLookupQuery {
    pub code: Option<String>,
    pub item_name: Option<String>,
    pub category: Option<String>,
    /// Free-text search over descriptions and item names.
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DashboardQuery {
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DetailQuery {
    pub tab: Option<String>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn order_to_json(o: &OrderState) -> JsonValue {
    json!({
        "id": o.id.to_string(),
        "order_number": o.order_number,
        "type": o.order_type.as_str(),
        "status": o.status.as_str(),
        "priority": o.priority,
        "customer_id": o.customer_id.to_string(),
        "vehicle_id": o.vehicle_id.map(|v| v.to_string()),
        "description": o.description,
        "estimated_duration": o.estimated_duration,
        "item": o.item,
        "inquiry": o.inquiry,
        "delay_reason_id": o.delay.as_ref().map(|d| d.reason_id),
        "exceeded_status_threshold": o.exceeded_threshold,
        "overrun": o.overrun,
        "components": o.components,
        "created_at": o.created_at.to_rfc3339(),
        "started_at": o.started_at.to_rfc3339(),
        "completed_at": o.completed_at.map(|t| t.to_rfc3339()),
        "actual_duration": o.actual_duration,
        "cancelled_at": o.cancelled_at.map(|t| t.to_rfc3339()),
        "cancellation_reason": o.cancellation_reason,
    })
}

/// Compact form returned by the start-order workflow.
pub fn started_order_to_json(o: &OrderState, plate: Option<&str>) -> JsonValue {
    json!({
        "id": o.id.to_string(),
        "order_number": o.order_number,
        "plate_number": plate,
        "status": o.status.as_str(),
        "created_at": o.created_at.to_rfc3339(),
        "started_at": o.started_at.to_rfc3339(),
    })
}

pub fn customer_to_json(c: &Customer) -> JsonValue {
    json!({
        "id": c.id.to_string(),
        "code": c.code,
        "full_name": c.full_name,
        "phone": c.phone,
        "email": c.email,
        "address": c.address,
        "customer_type": c.customer_type.as_str(),
        "personal_subtype": c.personal_subtype,
        "organization_name": c.organization_name,
        "tax_number": c.tax_number,
        "total_visits": c.total_visits,
        "last_visit": c.last_visit.map(|t| t.to_rfc3339()),
    })
}

pub fn vehicle_to_json(v: &Vehicle) -> JsonValue {
    json!({
        "id": v.id.to_string(),
        "customer_id": v.customer_id.to_string(),
        "plate_number": v.plate_number,
        "make": v.make,
        "model": v.model,
        "vehicle_type": v.vehicle_type,
    })
}

pub fn labour_code_to_json(lc: &LabourCode) -> JsonValue {
    json!({
        "id": lc.id,
        "code": lc.code,
        "description": lc.description,
        "label": lc.label(),
        "item_name": lc.item_name,
        "brand": lc.brand,
        "quantity": lc.quantity,
        "tire_type": lc.tire_type,
        "category": lc.category.as_str(),
    })
}

pub fn inventory_item_to_json(catalog: &Catalog, item: &InventoryItem) -> JsonValue {
    json!({
        "id": item.id,
        "name": item.name,
        "brand": catalog.brand_name(item),
        "quantity": item.quantity,
        "price": item.price,
        "needs_reorder": item.needs_reorder(),
    })
}

pub fn invoice_to_json(inv: &Invoice) -> JsonValue {
    json!({
        "id": inv.id.to_string(),
        "invoice_number": inv.invoice_number,
        "order_id": inv.order_id.to_string(),
        "invoice_date": inv.invoice_date.to_string(),
        "subtotal": inv.subtotal,
        "tax_amount": inv.tax_amount,
        "total_amount": inv.total_amount,
        "lines": inv.lines,
    })
}

pub fn board_row_to_json(row: &BoardRow) -> JsonValue {
    json!({
        "order": order_to_json(&row.order),
        "plate_number": row.plate,
        "customer_name": row.customer_name,
        "elapsed_minutes": row.elapsed_minutes,
        "exceeds_threshold": row.exceeds_threshold,
    })
}

pub fn plate_group_to_json(group: &PlateGroup) -> JsonValue {
    json!({
        "plate_number": group.plate,
        "orders": group.orders.iter().map(board_row_to_json).collect::<Vec<_>>(),
    })
}
