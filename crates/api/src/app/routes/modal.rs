//! "New order" modal: creates a fully described order in one post.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::{info, warn};

use tracker_auth::Permission;
use tracker_customers::{Customer, CustomerProfile, CustomerType, PersonalSubtype};
use tracker_orders::description::{append_line, inquiry_block, sales_item_line, services_line};
use tracker_orders::{
    InquiryDetails, Invoice, OrderCommand, OrderId, OrderType, Priority, SalesItem, StartOrder,
    parse_amount,
};

use crate::app::forms::FormFields;
use crate::app::routes::common::{detail_url, guard, parse_customer_id};
use crate::app::{errors, services::AppServices};
use crate::context::{BranchContext, PrincipalContext};

/// Used when a service order names no known service and no duration.
const DEFAULT_SERVICE_MINUTES: u32 = 50;
const MODAL_TYPES: [&str; 4] = ["service", "sales", "inquiry", "upload"];

/// Order content derived from the type-specific part of the form.
#[derive(Debug, Default)]
struct Draft {
    description: String,
    estimated_duration: Option<u32>,
    item: Option<SalesItem>,
    inquiry: Option<InquiryDetails>,
    amounts: Option<(i64, i64, i64)>,
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn resolve_customer(
    services: &AppServices,
    branch: &BranchContext,
    form: &FormFields,
) -> Result<Customer, Response> {
    let branch_id = branch.branch_id();
    if let Some(raw) = form.get("customer_id") {
        return parse_customer_id(raw)
            .and_then(|id| services.directory().get_customer(branch_id, &id))
            .ok_or_else(|| errors::workflow_error(StatusCode::NOT_FOUND, "Customer not found"));
    }

    let customer_type = form.get("customer_type").and_then(CustomerType::parse);
    let personal_subtype = form
        .get("personal_subtype")
        .and_then(PersonalSubtype::parse)
        .or_else(|| {
            customer_type
                .is_none_or(|t| t == CustomerType::Personal)
                .then_some(PersonalSubtype::Owner)
        });
    let profile = CustomerProfile {
        full_name: form.string("customer_name").unwrap_or_default(),
        phone: form.string("customer_phone").unwrap_or_default(),
        email: form.string("customer_email"),
        address: form.string("customer_address"),
        customer_type,
        personal_subtype,
        organization_name: form.string("organization_name"),
        tax_number: form.string("tax_number"),
    };
    services
        .directory()
        .create_or_get_customer(branch_id, &profile, Utc::now())
        .map(|(customer, _)| customer)
        .map_err(|e| errors::workflow_error(StatusCode::BAD_REQUEST, e.user_message()))
}

fn service_draft(services: &AppServices, form: &FormFields, mut draft: Draft) -> Draft {
    let selection = form.all("service_selection");
    let minutes = services.catalog().read(|c| c.service_minutes(&selection));
    draft.estimated_duration = Some(if minutes > 0 {
        minutes
    } else {
        draft.estimated_duration.unwrap_or(DEFAULT_SERVICE_MINUTES)
    });
    if !selection.is_empty() {
        draft.description = append_line(&draft.description, &services_line(OrderType::Service, &selection));
    }
    draft
}

fn sales_draft(services: &AppServices, form: &FormFields, mut draft: Draft) -> Result<Draft, String> {
    let item_name = form
        .string("item_name")
        .ok_or("Item name is required for sales orders")?;
    let quantity = match form.get("quantity") {
        Some(raw) => raw.parse::<u32>().map_err(|_| format!("Invalid quantity '{raw}'"))?,
        None => 1,
    };
    let item = SalesItem {
        item_name,
        brand: form.string("brand"),
        quantity: Some(quantity),
        tire_type: form.string("tire_type"),
    };

    let tire_services = form.all("tire_services");
    let addon_minutes = services.catalog().read(|c| c.addon_minutes(&tire_services));
    if addon_minutes > 0 {
        draft.estimated_duration = Some(draft.estimated_duration.unwrap_or(0) + addon_minutes);
    }

    draft.description = append_line(&draft.description, &sales_item_line(&item));
    if !tire_services.is_empty() {
        draft.description = append_line(&draft.description, &services_line(OrderType::Sales, &tire_services));
    }
    draft.item = Some(item);
    Ok(draft)
}

fn inquiry_draft(form: &FormFields, mut draft: Draft) -> Result<Draft, String> {
    let follow_up_date = match form.get("follow_up_date") {
        Some(raw) => Some(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| format!("Invalid follow-up date '{raw}'"))?,
        ),
        None => None,
    };
    let inquiry = InquiryDetails {
        inquiry_type: form.string("inquiry_type"),
        questions: form.string("questions"),
        contact_preference: form.string("contact_preference"),
        follow_up_date,
    };
    draft.description = append_line(&draft.description, &inquiry_block(&inquiry));
    draft.inquiry = Some(inquiry);
    Ok(draft)
}

fn upload_draft(form: &FormFields, mut draft: Draft) -> Result<Draft, String> {
    let amount = |key: &str| parse_amount(form.get(key).unwrap_or_default()).map_err(|e| e.user_message());
    draft.amounts = Some((amount("subtotal")?, amount("tax_amount")?, amount("total_amount")?));
    Ok(draft)
}

pub async fn create_from_modal(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Bytes,
) -> Response {
    if let Err(resp) = guard(&branch, &principal, Permission::ORDERS_CREATE) {
        return resp;
    }
    let branch_id = branch.branch_id();
    let now = Utc::now();
    let form = FormFields::parse(&body);

    let modal_type = form.get("order_type").unwrap_or("service").to_ascii_lowercase();
    if !MODAL_TYPES.contains(&modal_type.as_str()) {
        return errors::workflow_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid order type. Valid types: {}", MODAL_TYPES.join(", ")),
        );
    }

    let base = Draft {
        description: form.string("description").unwrap_or_default(),
        estimated_duration: form.number("estimated_duration"),
        ..Draft::default()
    };
    let (order_type, drafted) = match modal_type.as_str() {
        "sales" => (OrderType::Sales, sales_draft(&services, &form, base)),
        "inquiry" => (OrderType::Inquiry, inquiry_draft(&form, base)),
        "upload" => (OrderType::Unspecified, upload_draft(&form, base)),
        _ => (OrderType::Service, Ok(service_draft(&services, &form, base))),
    };
    let mut draft = match drafted {
        Ok(d) => d,
        Err(msg) => return errors::workflow_error(StatusCode::BAD_REQUEST, msg),
    };
    if draft.description.trim().is_empty() {
        draft.description = format!("{} Order", title_case(&modal_type));
    }

    let customer = match resolve_customer(&services, &branch, &form) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let vehicle = match form.get("plate_number") {
        Some(plate) => match services.directory().create_or_get_vehicle(
            branch_id,
            customer.id,
            plate,
            form.string("vehicle_make"),
            form.string("vehicle_model"),
        ) {
            Ok((v, _)) => Some(v),
            Err(e) => return errors::workflow_error(StatusCode::BAD_REQUEST, e.user_message()),
        },
        None => None,
    };

    let command = OrderCommand::StartOrder(StartOrder {
        branch_id,
        order_id: OrderId::new(),
        order_number: services.numbers().next_order_number(branch_id, now),
        order_type,
        customer_id: customer.id,
        vehicle_id: vehicle.as_ref().map(|v| v.id),
        description: draft.description.clone(),
        priority: form.get("priority").map(Priority::parse).unwrap_or_default(),
        estimated_duration: draft.estimated_duration,
        item: draft.item.clone(),
        inquiry: draft.inquiry.clone(),
        occurred_at: now,
    });
    let order = match services.engine().execute(command) {
        Ok(o) => o,
        Err(e) => return errors::workflow_dispatch_error(e),
    };
    if let Err(e) = services.directory().record_visit(branch_id, &customer.id, now) {
        warn!(%branch_id, customer_id = %customer.id, error = %e, "failed to record visit");
    }

    // Stock follows the sale; a missing or short item must not undo the order.
    if let Some(item) = &draft.item {
        let brand = item.brand.as_deref().unwrap_or(tracker_orders::details::UNBRANDED);
        let qty = i64::from(item.quantity.unwrap_or(1));
        if let Err(e) = services
            .catalog()
            .write(|c| c.adjust_inventory(&item.item_name, brand, -qty))
        {
            warn!(%branch_id, order_id = %order.id, item = %item.item_name, error = %e, "inventory not decremented");
        }
    }

    let invoice = draft.amounts.map(|amounts| {
        let invoice = Invoice::new(
            branch_id,
            services.numbers().next_invoice_number(branch_id, now),
            order.id,
            customer.id,
            order.vehicle_id,
            amounts,
            principal.display_name().to_string(),
            now,
        )
        .with_description_lines(&order.description);
        services.invoices().record(invoice)
    });

    info!(
        %branch_id,
        order_id = %order.id,
        order_number = %order.order_number,
        order_type = %order.order_type,
        invoice = ?invoice.as_ref().map(|i| i.invoice_number.as_str()),
        "order created from modal"
    );

    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": format!("Order {} created", order.order_number),
            "summary": {
                "order_id": order.id.to_string(),
                "order_number": order.order_number,
                "type": order.order_type.as_str(),
                "customer": customer.full_name,
                "plate_number": vehicle.as_ref().map(|v| v.plate_number.clone()),
                "estimated_duration": order.estimated_duration,
                "invoice_number": invoice.as_ref().map(|i| i.invoice_number.clone()),
                "total_amount": invoice.as_ref().map(|i| i.total_amount),
            },
            "redirect_url": detail_url(order.id),
        })),
    )
        .into_response()
}
