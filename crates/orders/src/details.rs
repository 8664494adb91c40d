//! Planning the `update_order_details` edit.
//!
//! The HTTP layer resolves catalog ids into [`DetailForm`]; planning turns the
//! form plus the current [`OrderState`] into the minimal [`DetailChanges`].

use serde::{Deserialize, Serialize};

use crate::description::{
    LABOUR_CODE_PREFIXES, SERVICE_PREFIXES, labour_codes_line, replace_tagged_line, services_line,
};
use crate::model::{OrderType, Priority, SalesItem};
use crate::state::OrderState;

pub const UNBRANDED: &str = "Unbranded";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemChange {
    Set(SalesItem),
    Clear,
}

/// Field-level edit of an order. `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DetailChanges {
    pub order_type: Option<OrderType>,
    pub item: Option<ItemChange>,
    pub description: Option<String>,
    pub estimated_duration: Option<u32>,
    pub priority: Option<Priority>,
}

impl DetailChanges {
    pub fn is_empty(&self) -> bool {
        self.order_type.is_none()
            && self.item.is_none()
            && self.description.is_none()
            && self.estimated_duration.is_none()
            && self.priority.is_none()
    }
}

/// Item data carried by a labour code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabourItem {
    pub code: String,
    pub item_name: Option<String>,
    pub brand: Option<String>,
    pub quantity: Option<u32>,
    pub tire_type: Option<String>,
}

/// The detail form with catalog references already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailForm {
    pub order_type: Option<OrderType>,
    pub labour_code: Option<LabourItem>,
    pub manual_item_name: Option<String>,
    pub manual_item_brand: Option<String>,
    /// (item name, brand name) of the picked inventory item.
    pub inventory_item: Option<(String, Option<String>)>,
    /// Raw quantity field; ignored unless it parses.
    pub item_quantity: Option<String>,
    /// `CODE - description` labels of the ticked labour codes.
    pub labour_code_labels: Vec<String>,
    pub services: Vec<String>,
    /// Raw duration field; ignored unless it parses.
    pub estimated_duration: Option<String>,
}

fn parse_count(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Item source priority: labour code with an item, then manual entry, then inventory pick.
fn pick_item(form: &DetailForm, current: Option<&SalesItem>) -> Option<SalesItem> {
    let keep_qty = current.and_then(|i| i.quantity);
    let keep_type = current.and_then(|i| i.tire_type.clone());
    let form_qty = parse_count(form.item_quantity.as_deref());

    if let Some(lc) = &form.labour_code {
        if let Some(name) = non_blank(lc.item_name.as_deref()) {
            return Some(SalesItem {
                item_name: name.to_string(),
                brand: Some(non_blank(lc.brand.as_deref()).unwrap_or(UNBRANDED).to_string()),
                quantity: lc.quantity.or(keep_qty),
                tire_type: lc.tire_type.clone().or(keep_type),
            });
        }
    }

    if let Some(name) = non_blank(form.manual_item_name.as_deref()) {
        return Some(SalesItem {
            item_name: name.to_string(),
            brand: Some(non_blank(form.manual_item_brand.as_deref()).unwrap_or(UNBRANDED).to_string()),
            quantity: form_qty.or(keep_qty),
            tire_type: keep_type,
        });
    }

    form.inventory_item.as_ref().map(|(name, brand)| SalesItem {
        item_name: name.clone(),
        brand: Some(non_blank(brand.as_deref()).unwrap_or(UNBRANDED).to_string()),
        quantity: form_qty.or(keep_qty),
        tire_type: keep_type,
    })
}

pub fn plan_detail_update(state: &OrderState, form: &DetailForm) -> DetailChanges {
    let mut changes = DetailChanges::default();
    let mut order_type = state.order_type;
    let mut item = state.item.clone();
    let mut description = state.description.clone();

    if let Some(new_type) = form.order_type.filter(|t| *t != state.order_type) {
        if state.order_type == OrderType::Sales {
            item = None;
        }
        description.clear();
        order_type = new_type;
        changes.order_type = Some(new_type);
    }

    if order_type.carries_item() {
        if let Some(picked) = pick_item(form, item.as_ref()) {
            item = Some(picked);
        }
    }

    if order_type.lists_labour_codes() && !form.labour_code_labels.is_empty() {
        description = replace_tagged_line(
            &description,
            LABOUR_CODE_PREFIXES,
            &labour_codes_line(&form.labour_code_labels),
        );
    }

    if !form.services.is_empty() {
        description = replace_tagged_line(
            &description,
            SERVICE_PREFIXES,
            &services_line(order_type, &form.services),
        );
    }

    if let Some(minutes) = parse_count(form.estimated_duration.as_deref()) {
        if state.estimated_duration != Some(minutes) {
            changes.estimated_duration = Some(minutes);
        }
    }

    if item != state.item {
        changes.item = Some(match item {
            Some(i) => ItemChange::Set(i),
            None => ItemChange::Clear,
        });
    }
    if description != state.description {
        changes.description = Some(description);
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderId, OrderStatus};
    use chrono::Utc;
    use tracker_core::BranchId;
    use tracker_customers::CustomerId;

    fn state(order_type: OrderType) -> OrderState {
        let now = Utc::now();
        OrderState {
            id: OrderId::new(),
            branch_id: BranchId::new(),
            order_number: "ORD-20261018-0001".into(),
            order_type,
            status: OrderStatus::InProgress,
            priority: Priority::Medium,
            customer_id: CustomerId::new(),
            vehicle_id: None,
            description: "Order started for T1\nServices: Oil Change".into(),
            estimated_duration: Some(30),
            item: None,
            inquiry: None,
            delay: None,
            exceeded_threshold: false,
            overrun: None,
            components: Vec::new(),
            created_at: now,
            started_at: now,
            completed_at: None,
            actual_duration: None,
            cancelled_at: None,
            cancellation_reason: None,
            updated_at: now,
        }
    }

    fn sold(name: &str, qty: Option<u32>) -> SalesItem {
        SalesItem {
            item_name: name.into(),
            brand: Some("Michelin".into()),
            quantity: qty,
            tire_type: Some("Used".into()),
        }
    }

    #[test]
    fn unchanged_form_plans_nothing() {
        let s = state(OrderType::Service);
        let form = DetailForm {
            order_type: Some(OrderType::Service),
            estimated_duration: Some("30".into()),
            ..DetailForm::default()
        };
        assert!(plan_detail_update(&s, &form).is_empty());
    }

    #[test]
    fn switching_away_from_sales_clears_item_and_description() {
        let mut s = state(OrderType::Sales);
        s.item = Some(sold("Primacy 4", Some(4)));
        let form = DetailForm {
            order_type: Some(OrderType::Inquiry),
            ..DetailForm::default()
        };

        let c = plan_detail_update(&s, &form);
        assert_eq!(c.order_type, Some(OrderType::Inquiry));
        assert_eq!(c.item, Some(ItemChange::Clear));
        assert_eq!(c.description, Some(String::new()));
    }

    #[test]
    fn labour_code_item_beats_manual_and_inventory() {
        let s = state(OrderType::Service);
        let form = DetailForm {
            labour_code: Some(LabourItem {
                code: "SVC-OIL".into(),
                item_name: Some("Engine Oil (5L)".into()),
                brand: None,
                quantity: Some(1),
                tire_type: None,
            }),
            manual_item_name: Some("Manual".into()),
            inventory_item: Some(("Inventory".into(), None)),
            ..DetailForm::default()
        };

        let c = plan_detail_update(&s, &form);
        assert_eq!(
            c.item,
            Some(ItemChange::Set(SalesItem {
                item_name: "Engine Oil (5L)".into(),
                brand: Some("Unbranded".into()),
                quantity: Some(1),
                tire_type: None,
            }))
        );
    }

    #[test]
    fn labour_code_without_item_falls_through_to_manual_entry() {
        let mut s = state(OrderType::Sales);
        s.item = Some(sold("Old", Some(2)));
        let form = DetailForm {
            labour_code: Some(LabourItem {
                code: "LAB-ALN".into(),
                ..LabourItem::default()
            }),
            manual_item_name: Some(" Tyre Valve ".into()),
            item_quantity: Some("not a number".into()),
            ..DetailForm::default()
        };

        let c = plan_detail_update(&s, &form);
        // Invalid quantity keeps the previous one; tyre type carries over.
        assert_eq!(
            c.item,
            Some(ItemChange::Set(SalesItem {
                item_name: "Tyre Valve".into(),
                brand: Some("Unbranded".into()),
                quantity: Some(2),
                tire_type: Some("Used".into()),
            }))
        );
    }

    #[test]
    fn inventory_pick_uses_brand_and_quantity() {
        let s = state(OrderType::Labour);
        let form = DetailForm {
            inventory_item: Some(("Brake Pad Set".into(), Some("Continental".into()))),
            item_quantity: Some("2".into()),
            ..DetailForm::default()
        };
        match plan_detail_update(&s, &form).item {
            Some(ItemChange::Set(i)) => {
                assert_eq!(i.brand.as_deref(), Some("Continental"));
                assert_eq!(i.quantity, Some(2));
            }
            other => panic!("expected item, got {other:?}"),
        }
    }

    #[test]
    fn inquiry_orders_ignore_item_sources() {
        let s = state(OrderType::Inquiry);
        let form = DetailForm {
            manual_item_name: Some("Ignored".into()),
            ..DetailForm::default()
        };
        assert!(plan_detail_update(&s, &form).item.is_none());
    }

    #[test]
    fn labour_codes_and_services_rewrite_tagged_lines() {
        let s = state(OrderType::Service);
        let form = DetailForm {
            labour_code_labels: vec!["LAB-ALN - Four wheel alignment".into()],
            services: vec!["Brake Service".into(), "Wheel Alignment".into()],
            estimated_duration: Some("90".into()),
            ..DetailForm::default()
        };

        let c = plan_detail_update(&s, &form);
        assert_eq!(
            c.description.as_deref(),
            Some(
                "Order started for T1\nLabour Codes: LAB-ALN - Four wheel alignment\nServices: Brake Service, Wheel Alignment"
            )
        );
        assert_eq!(c.estimated_duration, Some(90));
    }

    #[test]
    fn labour_codes_are_ignored_for_sales_orders() {
        let s = state(OrderType::Sales);
        let form = DetailForm {
            labour_code_labels: vec!["LAB-ALN - Four wheel alignment".into()],
            ..DetailForm::default()
        };
        assert!(plan_detail_update(&s, &form).description.is_none());
    }
}
