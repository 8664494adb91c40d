//! Start-order workflow used by the front desk: one plate in, one running order out.

use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse, response::Response};
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use tracker_auth::Permission;
use tracker_core::BranchId;
use tracker_customers::{VehicleId, normalize_plate, walk_in_profile};
use tracker_orders::{
    OrderCommand, OrderId, OrderState, OrderStatus, OrderType, Priority, START_ORDER_TYPES,
    StartOrder, description::start_description,
};

use crate::app::errors::{self, workflow_error};
use crate::app::routes::common::{guard, parse_customer_id};
use crate::app::{dto, services::AppServices};
use crate::context::{BranchContext, PrincipalContext};

fn vehicle_orders(services: &AppServices, branch_id: BranchId, vehicle_id: VehicleId) -> Vec<OrderState> {
    services
        .engine()
        .list(branch_id)
        .into_iter()
        .filter(|o| o.vehicle_id == Some(vehicle_id))
        .collect()
}

fn latest_with(orders: &[OrderState], statuses: &[OrderStatus]) -> Option<OrderState> {
    orders
        .iter()
        .filter(|o| statuses.contains(&o.status))
        .max_by_key(|o| o.created_at)
        .cloned()
}

fn invalid_type_message() -> String {
    let valid: Vec<&str> = START_ORDER_TYPES.iter().map(|t| t.as_str()).collect();
    format!("Invalid order type. Valid types: {}", valid.join(", "))
}

pub async fn start_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::StartOrderRequest>,
) -> Response {
    if let Err(resp) = guard(&branch, &principal, Permission::ORDERS_START) {
        return resp;
    }
    let branch_id = branch.branch_id();
    let now = Utc::now();

    let plate = body
        .plate_number
        .as_deref()
        .map(normalize_plate)
        .filter(|p| !p.is_empty());
    let existing_customer_id = body
        .existing_customer_id
        .as_deref()
        .filter(|_| body.use_existing_customer)
        .map(str::trim)
        .filter(|s| !s.is_empty());

    if plate.is_none() && existing_customer_id.is_none() {
        return workflow_error(StatusCode::BAD_REQUEST, "Vehicle plate number is required");
    }

    let Some(order_type) = OrderType::parse(body.order_type.as_deref().unwrap_or("service")) else {
        return workflow_error(StatusCode::BAD_REQUEST, invalid_type_message());
    };

    let preselected = match existing_customer_id {
        Some(raw) => match parse_customer_id(raw).and_then(|id| services.directory().get_customer(branch_id, &id)) {
            Some(c) => Some(c),
            None => return workflow_error(StatusCode::NOT_FOUND, "Customer not found"),
        },
        None => None,
    };

    // A known plate short-circuits to what is already on file.
    if let (Some(plate), None, false) = (plate.as_deref(), &preselected, body.force_new_order) {
        if let Some(vehicle) = services.directory().find_vehicle_by_plate(branch_id, plate) {
            let customer = services.directory().get_customer(branch_id, &vehicle.customer_id);
            let orders = vehicle_orders(&services, branch_id, vehicle.id);
            let active = latest_with(&orders, &[OrderStatus::Created, OrderStatus::InProgress]);
            let payload = match active {
                Some(order) => json!({
                    "success": true,
                    "existing_order": true,
                    "order": dto::started_order_to_json(&order, Some(plate)),
                    "customer": customer.as_ref().map(dto::customer_to_json),
                    "vehicle": dto::vehicle_to_json(&vehicle),
                }),
                None => json!({
                    "success": true,
                    "existing_customer": true,
                    "customer": customer.as_ref().map(dto::customer_to_json),
                    "vehicle": dto::vehicle_to_json(&vehicle),
                }),
            };
            return (StatusCode::OK, Json(payload)).into_response();
        }
    }

    let customer = match preselected {
        Some(c) => c,
        None => {
            // Reaching here without a preselected customer implies a plate.
            let plate = plate.as_deref().unwrap_or_default();
            match services
                .directory()
                .create_or_get_customer(branch_id, &walk_in_profile(plate), now)
            {
                Ok((c, _)) => c,
                Err(e) => return errors::domain_error_to_response(e),
            }
        }
    };

    let vehicle = match plate.as_deref() {
        Some(p) => match services
            .directory()
            .create_or_get_vehicle(branch_id, customer.id, p, None, None)
        {
            Ok((v, _)) => Some(v),
            Err(e) => return errors::domain_error_to_response(e),
        },
        None => None,
    };

    let mut estimated_duration = body.estimated_duration;
    if order_type == OrderType::Service && !body.service_selection.is_empty() {
        let minutes = services
            .catalog()
            .read(|c| c.selection_minutes(&body.service_selection));
        if minutes > 0 {
            estimated_duration = Some(minutes);
        }
    }

    if let (Some(v), false) = (&vehicle, body.force_new_order) {
        let orders = vehicle_orders(&services, branch_id, v.id);
        let reusable = latest_with(&orders, &[OrderStatus::Created])
            .or_else(|| latest_with(&orders, &[OrderStatus::InProgress, OrderStatus::Overdue]));
        if let Some(order) = reusable {
            if let Err(e) = services.directory().record_visit(branch_id, &customer.id, now) {
                warn!(%branch_id, customer_id = %customer.id, error = %e, "failed to record visit");
            }
            info!(%branch_id, order_id = %order.id, "reusing running order for vehicle");
            return (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "existing_order": true,
                    "order": dto::started_order_to_json(&order, Some(&v.plate_number)),
                })),
            )
                .into_response();
        }
    }

    let command = OrderCommand::StartOrder(StartOrder {
        branch_id,
        order_id: OrderId::new(),
        order_number: services.numbers().next_order_number(branch_id, now),
        order_type,
        customer_id: customer.id,
        vehicle_id: vehicle.as_ref().map(|v| v.id),
        description: start_description(plate.as_deref(), &body.service_selection),
        priority: Priority::Medium,
        estimated_duration,
        item: None,
        inquiry: None,
        occurred_at: now,
    });

    let order = match services.engine().execute(command) {
        Ok(o) => o,
        Err(e) => return errors::workflow_dispatch_error(e),
    };
    if let Err(e) = services.directory().record_visit(branch_id, &customer.id, now) {
        warn!(%branch_id, customer_id = %customer.id, error = %e, "failed to record visit");
    }

    info!(
        %branch_id,
        order_id = %order.id,
        order_number = %order.order_number,
        order_type = %order.order_type,
        "order started"
    );

    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "order": dto::started_order_to_json(&order, plate.as_deref()),
        })),
    )
        .into_response()
}

pub async fn check_plate(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CheckPlateRequest>,
) -> Response {
    if let Err(resp) = guard(&branch, &principal, Permission::ORDERS_READ) {
        return resp;
    }
    let branch_id = branch.branch_id();

    let plate = normalize_plate(&body.plate_number);
    if plate.is_empty() {
        return workflow_error(StatusCode::BAD_REQUEST, "Vehicle plate number is required");
    }

    let payload = match services.directory().find_vehicle_by_plate(branch_id, &plate) {
        Some(vehicle) => {
            let customer = services.directory().get_customer(branch_id, &vehicle.customer_id);
            json!({
                "found": true,
                "customer": customer.as_ref().map(dto::customer_to_json),
                "vehicle": dto::vehicle_to_json(&vehicle),
            })
        }
        None => json!({ "found": false, "customer": null, "vehicle": null }),
    };
    (StatusCode::OK, Json(payload)).into_response()
}
