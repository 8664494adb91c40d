use axum::{
    Router,
    routing::{get, post},
};

pub mod catalog;
pub mod common;
pub mod dashboard;
pub mod detail;
pub mod extraction;
pub mod lifecycle;
pub mod modal;
pub mod start;
pub mod system;

/// Router for all authenticated (branch-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/stream", get(system::stream))
        .route("/api/orders/start", post(start::start_order))
        .route("/api/orders/check-plate", post(start::check_plate))
        .route("/api/service-types", get(catalog::service_types))
        .route("/api/labour-codes/lookup", get(catalog::lookup_labour_code))
        .route("/api/orders/started/kpis", get(dashboard::kpis))
        .route("/api/orders/quick-stop", post(lifecycle::quick_stop))
        .route("/api/orders/:id/overrun-reason", post(lifecycle::overrun_reason))
        .route("/api/orders/update-from-extraction", post(extraction::update_from_extraction))
        .route("/api/orders/create-from-modal", post(modal::create_from_modal))
        .route("/orders/started", get(dashboard::started_orders))
        .route("/orders/started/", get(dashboard::started_orders))
        .route(
            "/orders/started/:id",
            get(detail::started_order_detail).post(detail::started_order_action),
        )
        .route(
            "/orders/started/:id/",
            get(detail::started_order_detail).post(detail::started_order_action),
        )
}
