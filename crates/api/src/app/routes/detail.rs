//! Started-order detail page and its form actions.
//!
//! Every action answers with a 303: to the dashboard when the work is done,
//! back to the detail page otherwise. Outcomes travel as flash messages.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};

use tracker_auth::{PrincipalId, Permission};
use tracker_catalog::{Catalog, CatalogId};
use tracker_customers::{CustomerProfile, CustomerType, PersonalSubtype};
use tracker_infra::{DispatchError, VehicleUpdate};
use tracker_orders::{
    CancelOrder, CompleteOrder, DetailForm, LabourItem, OrderCommand, OrderState, OrderType,
    UpdateDetails, exceeds_threshold, plan_detail_update,
};

use crate::app::forms::FormFields;
use crate::app::routes::common::{DASHBOARD_URL, detail_url, find_order, guard, see_other};
use crate::app::{dto, errors, services::AppServices};
use crate::context::{BranchContext, PrincipalContext};

const DEFAULT_TAB: &str = "overview";

pub async fn started_order_detail(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Query(query): Query<dto::DetailQuery>,
) -> Response {
    if let Err(resp) = guard(&branch, &principal, Permission::ORDERS_READ) {
        return resp;
    }
    let branch_id = branch.branch_id();
    let Some(order) = find_order(&services, &branch, &id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "order not found");
    };

    let now = Utc::now();
    let overdue_after = services.policy().overdue_after_minutes;
    let customer = services.directory().get_customer(branch_id, &order.customer_id);
    let vehicle = order
        .vehicle_id
        .and_then(|vid| services.directory().get_vehicle(branch_id, &vid));
    let invoices = services.invoices().for_order(branch_id, &order.id);

    let delay_reasons = services.catalog().read(|c| {
        c.delay_reasons_by_category()
            .into_iter()
            .map(|(category, reasons)| {
                json!({
                    "category": category,
                    "reasons": reasons.iter().map(|r| json!({
                        "id": r.id,
                        "reason_text": r.reason_text,
                    })).collect::<Vec<_>>(),
                })
            })
            .collect::<Vec<_>>()
    });

    (
        StatusCode::OK,
        Json(json!({
            "order": dto::order_to_json(&order),
            "customer": customer.as_ref().map(dto::customer_to_json),
            "vehicle": vehicle.as_ref().map(dto::vehicle_to_json),
            "invoices": invoices.iter().map(dto::invoice_to_json).collect::<Vec<_>>(),
            "tab": query.tab.as_deref().unwrap_or(DEFAULT_TAB),
            "elapsed_minutes": order.elapsed_minutes(now),
            "exceeds_threshold": exceeds_threshold(&order, now, overdue_after),
            "overdue_after_minutes": overdue_after,
            "delay_reasons": delay_reasons,
            "messages": services.flash().drain(principal.principal_id()),
        })),
    )
        .into_response()
}

/// `POST /orders/started/:id` with a form-encoded `action`.
pub async fn started_order_action(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let Some(order) = find_order(&services, &branch, &id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "order not found");
    };
    let form = FormFields::parse(&body);
    let action = form.get("action").unwrap_or_default().to_string();

    let permission = match action.as_str() {
        "update_customer" | "update_vehicle" => Permission::CUSTOMERS_UPDATE,
        "update_order_details" | "cancel_order" => Permission::ORDERS_UPDATE,
        "complete_order" => Permission::ORDERS_COMPLETE,
        _ => Permission::ORDERS_READ,
    };
    if let Err(resp) = guard(&branch, &principal, permission) {
        return resp;
    }

    let ctx = ActionContext {
        services: &services,
        branch,
        principal: &principal,
        order,
        form,
    };

    match action.as_str() {
        "update_customer" => ctx.update_customer(),
        "update_vehicle" => ctx.update_vehicle(),
        "update_order_details" => ctx.update_order_details(),
        "complete_order" => ctx.complete_order(),
        "cancel_order" => ctx.cancel_order(),
        other => {
            warn!(
                branch_id = %ctx.branch.branch_id(),
                order_id = %ctx.order.id,
                action = %other,
                "unknown order action"
            );
            ctx.flash_error("Unknown action");
            ctx.back_to_detail()
        }
    }
}

struct ActionContext<'a> {
    services: &'a AppServices,
    branch: BranchContext,
    principal: &'a PrincipalContext,
    order: OrderState,
    form: FormFields,
}

impl ActionContext<'_> {
    fn who(&self) -> PrincipalId {
        self.principal.principal_id()
    }

    fn flash_success(&self, text: impl Into<String>) {
        self.services.flash().success(self.who(), text);
    }

    fn flash_error(&self, text: impl Into<String>) {
        self.services.flash().error(self.who(), text);
    }

    fn back_to_detail(&self) -> Response {
        see_other(&detail_url(self.order.id))
    }

    fn to_dashboard(&self) -> Response {
        see_other(DASHBOARD_URL)
    }

    fn failed(&self, action: &'static str, err: &DispatchError) -> Response {
        error!(
            branch_id = %self.branch.branch_id(),
            order_id = %self.order.id,
            action,
            error = %errors::error_chain(err),
            "order action failed"
        );
        self.flash_error(err.user_message());
        self.back_to_detail()
    }

    /// Fields left out of the form keep their stored value; a submitted blank
    /// clears an optional field.
    fn update_customer(&self) -> Response {
        let branch_id = self.branch.branch_id();
        let Some(current) = self.services.directory().get_customer(branch_id, &self.order.customer_id) else {
            return self.failed("update_customer", &DispatchError::NotFound("customer".to_string()));
        };

        let f = &self.form;
        let text = |key: &str, stored: String| f.submitted(key).map_or(stored, str::to_string);
        let optional = |key: &str, stored: Option<String>| match f.submitted(key) {
            Some("") => None,
            Some(v) => Some(v.to_string()),
            None => stored,
        };

        let stored = current.profile();
        let profile = CustomerProfile {
            full_name: text("full_name", stored.full_name),
            phone: text("phone", stored.phone),
            email: optional("email", stored.email),
            address: optional("address", stored.address),
            customer_type: f.get("customer_type").and_then(CustomerType::parse).or(stored.customer_type),
            personal_subtype: f
                .get("personal_subtype")
                .and_then(PersonalSubtype::parse)
                .or(stored.personal_subtype),
            organization_name: optional("organization_name", stored.organization_name),
            tax_number: optional("tax_number", stored.tax_number),
        };

        match self
            .services
            .directory()
            .update_customer(branch_id, &self.order.customer_id, &profile)
        {
            Ok(customer) => {
                info!(
                    %branch_id,
                    customer_id = %customer.id,
                    "customer updated from order page"
                );
                self.flash_success("Customer information updated");
            }
            Err(e) => return self.failed("update_customer", &DispatchError::from(e)),
        }
        self.back_to_detail()
    }

    fn update_vehicle(&self) -> Response {
        let Some(vehicle_id) = self.order.vehicle_id else {
            self.services
                .flash()
                .warning(self.who(), "This order has no vehicle to update");
            return self.back_to_detail();
        };

        let update = VehicleUpdate {
            make: self.form.string("make"),
            model: self.form.string("model"),
            vehicle_type: self.form.string("vehicle_type"),
        };
        match self
            .services
            .directory()
            .update_vehicle(self.branch.branch_id(), &vehicle_id, update)
        {
            Ok(_) => self.flash_success("Vehicle information updated"),
            Err(e) => return self.failed("update_vehicle", &DispatchError::from(e)),
        }
        self.back_to_detail()
    }

    /// Resolves catalog ids in the form; unknown ids are logged and skipped.
    fn detail_form(&self, catalog: &Catalog) -> DetailForm {
        let f = &self.form;
        let order_id = self.order.id;
        let catalog_id = |key: &str| f.get(key).and_then(|raw| raw.parse::<CatalogId>().ok());

        let labour_code = catalog_id("labour_code_id").and_then(|id| {
            let found = catalog.labour_code(id);
            if found.is_none() {
                warn!(%order_id, labour_code_id = %id, "labour code not found");
            }
            found.map(|lc| LabourItem {
                code: lc.code.clone(),
                item_name: lc.item_name.clone(),
                brand: lc.brand.clone(),
                quantity: lc.quantity,
                tire_type: lc.tire_type.clone(),
            })
        });

        let inventory_item = catalog_id("item_id").and_then(|id| {
            let found = catalog.inventory_item(id);
            if found.is_none() {
                warn!(%order_id, item_id = %id, "inventory item not found");
            }
            found.map(|item| (item.name.clone(), Some(catalog.brand_name(item).to_string())))
        });

        let labour_code_labels = f
            .all("labour_codes")
            .iter()
            .filter_map(|raw| match raw.parse::<CatalogId>().ok().and_then(|id| catalog.labour_code(id)) {
                Some(lc) => Some(lc.label()),
                None => {
                    warn!(%order_id, labour_code = %raw, "labour code not found");
                    None
                }
            })
            .collect();

        DetailForm {
            order_type: f.get("order_type").and_then(OrderType::parse),
            labour_code,
            manual_item_name: f.string("item_name_manual"),
            manual_item_brand: f.string("item_brand_manual"),
            inventory_item,
            item_quantity: f.string("item_quantity"),
            labour_code_labels,
            services: f.all("services"),
            estimated_duration: f.string("estimated_duration"),
        }
    }

    fn update_order_details(&self) -> Response {
        let branch_id = self.branch.branch_id();
        let form = self.services.catalog().read(|c| self.detail_form(c));
        let changes = plan_detail_update(&self.order, &form);

        if changes.is_empty() {
            info!(%branch_id, order_id = %self.order.id, "order details unchanged");
            self.flash_success("No changes to save");
            return self.to_dashboard();
        }

        let command = OrderCommand::UpdateDetails(UpdateDetails {
            branch_id,
            order_id: self.order.id,
            changes,
            occurred_at: Utc::now(),
        });
        match self.services.engine().execute(command) {
            Ok(order) => {
                info!(
                    %branch_id,
                    order_id = %order.id,
                    order_type = %order.order_type,
                    estimated_duration = ?order.estimated_duration,
                    "order details updated"
                );
                self.flash_success(format!("Order {} updated", order.order_number));
                self.to_dashboard()
            }
            Err(e) => self.failed("update_order_details", &e),
        }
    }

    fn complete_order(&self) -> Response {
        let branch_id = self.branch.branch_id();
        let now = Utc::now();
        let overdue_after = self.services.policy().overdue_after_minutes;
        let exceeded = exceeds_threshold(&self.order, now, overdue_after);

        let requested = self.form.get("delay_reason");
        let known = requested.and_then(|raw| {
            raw.parse::<CatalogId>()
                .ok()
                .filter(|id| self.services.catalog().read(|c| c.delay_reason(*id).is_some()))
        });

        let delay_reason = match (requested, known) {
            (_, Some(id)) => Some(id),
            (Some(raw), None) if exceeded => {
                warn!(%branch_id, order_id = %self.order.id, delay_reason = %raw, "unknown delay reason");
                self.flash_error("Selected delay reason does not exist");
                return self.back_to_detail();
            }
            (Some(raw), None) => {
                warn!(%branch_id, order_id = %self.order.id, delay_reason = %raw, "ignoring unknown delay reason");
                None
            }
            (None, None) if exceeded => {
                self.flash_error(format!(
                    "This order ran past {overdue_after} minutes; please select a delay reason"
                ));
                return self.back_to_detail();
            }
            (None, None) => None,
        };

        let command = OrderCommand::CompleteOrder(CompleteOrder {
            branch_id,
            order_id: self.order.id,
            delay_reason,
            comments: self.form.string("delay_reason_comments"),
            completed_by: self.principal.display_name().to_string(),
            enforce_delay_reason: true,
            overdue_after_minutes: overdue_after,
            occurred_at: now,
        });
        match self.services.engine().execute(command) {
            Ok(order) => {
                info!(
                    %branch_id,
                    order_id = %order.id,
                    actual_duration = ?order.actual_duration,
                    exceeded = order.exceeded_threshold,
                    "order completed"
                );
                self.flash_success(format!("Order {} completed", order.order_number));
                self.to_dashboard()
            }
            Err(e) => self.failed("complete_order", &e),
        }
    }

    fn cancel_order(&self) -> Response {
        let Some(reason) = self.form.string("cancellation_reason") else {
            self.flash_error("Cancellation reason is required");
            return self.back_to_detail();
        };

        let command = OrderCommand::CancelOrder(CancelOrder {
            branch_id: self.branch.branch_id(),
            order_id: self.order.id,
            reason,
            occurred_at: Utc::now(),
        });
        match self.services.engine().execute(command) {
            Ok(order) => {
                info!(branch_id = %self.branch.branch_id(), order_id = %order.id, "order cancelled");
                self.flash_success(format!("Order {} cancelled", order.order_number));
                self.to_dashboard()
            }
            Err(e) => self.failed("cancel_order", &e),
        }
    }
}
