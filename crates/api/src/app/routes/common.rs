use axum::response::{IntoResponse, Redirect, Response};

use tracker_customers::CustomerId;
use tracker_orders::{OrderId, OrderState};

use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz::{Requires, authorize_command};
use crate::context::{BranchContext, PrincipalContext};

pub const DASHBOARD_URL: &str = "/orders/started";

pub fn detail_url(order_id: OrderId) -> String {
    format!("/orders/started/{order_id}")
}

/// 303 so the browser follows with a GET.
pub fn see_other(location: &str) -> Response {
    Redirect::to(location).into_response()
}

pub fn guard(
    branch: &BranchContext,
    principal: &PrincipalContext,
    permission: &'static str,
) -> Result<(), Response> {
    authorize_command(branch, principal, &Requires::one(permission)).map_err(errors::forbidden)
}

pub fn parse_order_id(raw: &str) -> Option<OrderId> {
    raw.trim().parse().ok()
}

pub fn parse_customer_id(raw: &str) -> Option<CustomerId> {
    raw.parse().ok()
}

/// The order in the caller's branch; another branch's order is "not found".
pub fn find_order(services: &AppServices, branch: &BranchContext, raw_id: &str) -> Option<OrderState> {
    let order_id = parse_order_id(raw_id)?;
    services.engine().get(branch.branch_id(), &order_id)
}
