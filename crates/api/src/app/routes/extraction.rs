//! Applies fields extracted from a scanned document to a running order.
//!
//! All input is validated, and closed orders are refused, before anything is
//! written, so a 400 or 422 leaves the order, customer and vehicle untouched.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;
use tracing::info;

use tracker_auth::Permission;
use tracker_customers::{CustomerProfile, CustomerType, PersonalSubtype};
use tracker_orders::description::{
    SERVICE_PREFIXES, added_item_block, replace_tagged_line, sales_item_line, services_line,
};
use tracker_orders::{
    AddComponent, ComponentKind, DetailChanges, ItemChange, OrderCommand, OrderState, Priority,
    ReassignCustomer, SalesItem, UpdateDetails,
};

use crate::app::forms::FormFields;
use crate::app::routes::common::{find_order, guard};
use crate::app::{dto, errors, services::AppServices};
use crate::context::{BranchContext, PrincipalContext};

const ITEM_PREFIXES: &[&str] = &["item:"];

struct ComponentRequest {
    kind: ComponentKind,
    reason: String,
    item_name: Option<String>,
    brand: Option<String>,
    quantity: Option<String>,
    tire_type: Option<String>,
}

fn extracted_profile(form: &FormFields) -> Result<Option<CustomerProfile>, String> {
    let (Some(name), Some(phone)) = (form.string("extracted_customer_name"), form.string("extracted_phone")) else {
        return Ok(None);
    };

    let customer_type = match form.get("extracted_customer_type") {
        Some(raw) => Some(CustomerType::parse(raw).ok_or_else(|| format!("Invalid customer type '{raw}'"))?),
        None => None,
    };
    let personal_subtype = match form.get("extracted_personal_subtype") {
        Some(raw) => Some(PersonalSubtype::parse(raw).ok_or_else(|| format!("Invalid personal subtype '{raw}'"))?),
        // Extracted documents rarely say; treat the person as the owner.
        None if customer_type.is_none_or(|t| t == CustomerType::Personal) => Some(PersonalSubtype::Owner),
        None => None,
    };

    let profile = CustomerProfile {
        full_name: name,
        phone,
        email: form.string("extracted_email"),
        address: form.string("extracted_address"),
        customer_type,
        personal_subtype,
        organization_name: form.string("extracted_organization_name"),
        tax_number: form.string("extracted_tax_number"),
    };
    profile.validate().map_err(|e| e.user_message())?;
    Ok(Some(profile))
}

fn component_request(form: &FormFields) -> Result<Option<ComponentRequest>, String> {
    if !form.flag("add_component") {
        return Ok(None);
    }
    let kind = form
        .get("component_type")
        .and_then(ComponentKind::parse)
        .ok_or("Component type must be 'service' or 'sales'")?;
    let reason = form
        .string("component_reason")
        .ok_or("Component reason is required")?;
    let item_name = form.string("component_item_name");
    if kind == ComponentKind::Sales && item_name.is_none() {
        return Err("Item name is required for a sales component".to_string());
    }
    Ok(Some(ComponentRequest {
        kind,
        reason,
        item_name,
        brand: form.string("component_brand"),
        quantity: Some(form.string("component_quantity").unwrap_or_else(|| "1".to_string())),
        tire_type: form.string("component_tire_type"),
    }))
}

fn extracted_item(form: &FormFields, current: Option<&SalesItem>) -> Result<Option<SalesItem>, String> {
    let Some(item_name) = form.string("extracted_item_name") else {
        return Ok(None);
    };
    let quantity = match form.get("extracted_quantity") {
        Some(raw) => Some(raw.parse::<u32>().map_err(|_| format!("Invalid quantity '{raw}'"))?),
        None => current.and_then(|i| i.quantity),
    };
    Ok(Some(SalesItem {
        item_name,
        brand: form.string("extracted_brand"),
        quantity,
        tire_type: form.string("extracted_tire_type"),
    }))
}

/// Plans the detail edit. Tagged lines are replaced, the description itself
/// only when one was extracted.
fn plan_changes(
    services: &AppServices,
    order: &OrderState,
    form: &FormFields,
    item: Option<SalesItem>,
    component: Option<&ComponentRequest>,
) -> Result<(DetailChanges, Vec<String>), String> {
    let mut updates = Vec::new();
    let mut description = form
        .string("extracted_description")
        .unwrap_or_else(|| order.description.clone());

    let services_list: Vec<String> = form
        .get("extracted_services")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if !services_list.is_empty() {
        description = replace_tagged_line(
            &description,
            SERVICE_PREFIXES,
            &services_line(order.order_type, &services_list),
        );
        updates.push(format!("Services: {}", services_list.join(", ")));
    }

    if let Some(item) = &item {
        description = replace_tagged_line(&description, ITEM_PREFIXES, &sales_item_line(item));
        updates.push(format!("Item: {}", item.item_name));
    }

    if let Some(c) = component.filter(|c| c.kind == ComponentKind::Sales) {
        let name = c.item_name.as_deref().unwrap_or_default();
        description.push_str(&added_item_block(
            name,
            c.brand.as_deref(),
            c.quantity.as_deref(),
            c.tire_type.as_deref(),
        ));
    }

    let service_minutes = services.catalog().read(|c| c.service_minutes(&services_list));
    let estimated_duration = if service_minutes > 0 {
        Some(service_minutes)
    } else {
        match form.get("extracted_estimated_duration") {
            Some(raw) => Some(
                raw.parse::<u32>()
                    .map_err(|_| format!("Invalid estimated duration '{raw}'"))?,
            ),
            None => None,
        }
    };

    let priority = form.get("extracted_priority").map(Priority::parse);

    let mut changes = DetailChanges::default();
    if description != order.description {
        changes.description = Some(description);
        updates.push("Description updated".to_string());
    }
    if let Some(minutes) = estimated_duration.filter(|m| order.estimated_duration != Some(*m)) {
        changes.estimated_duration = Some(minutes);
        updates.push(format!("Estimated duration: {minutes} min"));
    }
    if let Some(p) = priority.filter(|p| *p != order.priority) {
        changes.priority = Some(p);
        updates.push("Priority updated".to_string());
    }
    if let Some(item) = item.filter(|i| order.item.as_ref() != Some(i)) {
        changes.item = Some(ItemChange::Set(item));
    }
    Ok((changes, updates))
}

pub async fn update_from_extraction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Bytes,
) -> Response {
    if let Err(resp) = guard(&branch, &principal, Permission::ORDERS_UPDATE) {
        return resp;
    }
    let branch_id = branch.branch_id();
    let now = Utc::now();
    let form = FormFields::parse(&body);

    let Some(raw_id) = form.get("order_id") else {
        return errors::workflow_error(StatusCode::BAD_REQUEST, "order_id is required");
    };
    let Some(order) = find_order(&services, &branch, raw_id) else {
        return errors::workflow_error(StatusCode::NOT_FOUND, "Order not found");
    };
    if order.status.is_closed() {
        return errors::workflow_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Order {} is {} and can no longer be updated", order.order_number, order.status),
        );
    }

    let validated = extracted_profile(&form).and_then(|profile| {
        // A kind the order already carries is neither re-added nor re-described.
        let component = component_request(&form)?
            .filter(|c| !order.components.iter().any(|existing| existing.kind == c.kind));
        let item = extracted_item(&form, order.item.as_ref())?;
        let (changes, updates) = plan_changes(&services, &order, &form, item, component.as_ref())?;
        Ok((profile, component, changes, updates))
    });
    let (profile, component, changes, mut updates) = match validated {
        Ok(v) => v,
        Err(msg) => return errors::workflow_error(StatusCode::BAD_REQUEST, msg),
    };

    let mut customer_id = order.customer_id;
    if let Some(profile) = &profile {
        match services.directory().create_or_get_customer(branch_id, profile, now) {
            Ok((customer, created)) => {
                if created {
                    updates.insert(0, format!("Customer created: {}", customer.full_name));
                } else if customer.id != order.customer_id {
                    updates.insert(0, format!("Customer linked: {}", customer.full_name));
                }
                customer_id = customer.id;
            }
            Err(e) => return errors::workflow_error(StatusCode::BAD_REQUEST, e.user_message()),
        }
    }

    let mut vehicle_id = order.vehicle_id;
    if let Some(plate) = form.get("extracted_plate") {
        match services.directory().create_or_get_vehicle(
            branch_id,
            customer_id,
            plate,
            form.string("extracted_make"),
            form.string("extracted_model"),
        ) {
            Ok((vehicle, _)) => {
                if Some(vehicle.id) != order.vehicle_id {
                    updates.push(format!("Vehicle: {}", vehicle.plate_number));
                }
                vehicle_id = Some(vehicle.id);
            }
            Err(e) => return errors::workflow_error(StatusCode::BAD_REQUEST, e.user_message()),
        }
    }

    let mut commands = Vec::new();
    if customer_id != order.customer_id || vehicle_id != order.vehicle_id {
        commands.push(OrderCommand::ReassignCustomer(ReassignCustomer {
            branch_id,
            order_id: order.id,
            customer_id,
            vehicle_id,
            occurred_at: now,
        }));
    }
    if !changes.is_empty() {
        commands.push(OrderCommand::UpdateDetails(UpdateDetails {
            branch_id,
            order_id: order.id,
            changes,
            occurred_at: now,
        }));
    }
    if let Some(c) = component {
        updates.push(match c.kind {
            ComponentKind::Service => "Service component added".to_string(),
            ComponentKind::Sales => "Sales component added".to_string(),
        });
        commands.push(OrderCommand::AddComponent(AddComponent {
            branch_id,
            order_id: order.id,
            kind: c.kind,
            reason: c.reason,
            added_by: principal.display_name().to_string(),
            occurred_at: now,
        }));
    }

    let mut latest = order;
    for command in commands {
        latest = match services.engine().execute(command) {
            Ok(state) => state,
            Err(e) => return errors::workflow_dispatch_error(e),
        };
    }

    info!(
        %branch_id,
        order_id = %latest.id,
        updates = updates.len(),
        "order updated from extraction"
    );

    let message = if updates.is_empty() {
        "No changes detected".to_string()
    } else {
        updates.join(" • ")
    };
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": message,
            "updates": updates,
            "order": dto::order_to_json(&latest),
        })),
    )
        .into_response()
}
