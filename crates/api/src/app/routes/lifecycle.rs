use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;
use tracing::info;

use tracker_auth::Permission;
use tracker_orders::{CompleteOrder, OrderCommand, RecordOverrun};

use crate::app::forms::FormFields;
use crate::app::routes::common::{find_order, guard};
use crate::app::{dto, errors, services::AppServices};
use crate::context::{BranchContext, PrincipalContext};

/// Records (or replaces) why an order ran long. Allowed on closed orders too.
pub async fn overrun_reason(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::OverrunReasonRequest>,
) -> Response {
    if let Err(resp) = guard(&branch, &principal, Permission::ORDERS_UPDATE) {
        return resp;
    }
    let Some(order) = find_order(&services, &branch, &id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "order not found");
    };

    let command = OrderCommand::RecordOverrun(RecordOverrun {
        branch_id: branch.branch_id(),
        order_id: order.id,
        reason: body.reason,
        reported_by: principal.display_name().to_string(),
        occurred_at: Utc::now(),
    });

    match services.engine().execute(command) {
        Ok(order) => (
            StatusCode::OK,
            Json(json!({ "success": true, "overrun": order.overrun })),
        )
            .into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

/// Stops an order from the dashboard without asking for a delay reason.
pub async fn quick_stop(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Bytes,
) -> Response {
    if let Err(resp) = guard(&branch, &principal, Permission::ORDERS_COMPLETE) {
        return resp;
    }
    let form = FormFields::parse(&body);
    let Some(raw_id) = form.get("order_id") else {
        return errors::workflow_error(StatusCode::BAD_REQUEST, "order_id is required");
    };
    let Some(order) = find_order(&services, &branch, raw_id) else {
        return errors::workflow_error(StatusCode::NOT_FOUND, "Order not found");
    };

    let command = OrderCommand::CompleteOrder(CompleteOrder {
        branch_id: branch.branch_id(),
        order_id: order.id,
        delay_reason: None,
        comments: None,
        completed_by: principal.display_name().to_string(),
        enforce_delay_reason: false,
        overdue_after_minutes: services.policy().overdue_after_minutes,
        occurred_at: Utc::now(),
    });

    match services.engine().execute(command) {
        Ok(order) => {
            info!(branch_id = %branch.branch_id(), order_id = %order.id, "order quick-stopped");
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": format!("Order {} completed", order.order_number),
                    "order": dto::order_to_json(&order),
                })),
            )
                .into_response()
        }
        Err(e) => errors::workflow_dispatch_error(e),
    }
}
