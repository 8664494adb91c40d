use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;

use tracker_auth::Permission;
use tracker_infra::queries::{BoardQuery, SortKey, StatusFilter, board_kpis, started_board};

use crate::app::routes::common::guard;
use crate::app::{dto, services::AppServices};
use crate::context::{BranchContext, PrincipalContext};

/// Started-orders dashboard, grouped by plate.
pub async fn started_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::DashboardQuery>,
) -> Response {
    if let Err(resp) = guard(&branch, &principal, Permission::ORDERS_READ) {
        return resp;
    }
    let branch_id = branch.branch_id();
    let now = Utc::now();

    let board_query = BoardQuery {
        status: StatusFilter::parse(query.status.as_deref()),
        search: query.search.clone(),
        sort: SortKey::parse(query.sort_by.as_deref()),
    };

    let orders = services.engine().list(branch_id);
    let kpis = board_kpis(&orders, now, services.policy().overdue_after_minutes);
    let rows = orders
        .into_iter()
        .map(|o| services.board_row(branch_id, o, now))
        .collect();
    let groups = started_board(rows, &board_query);

    (
        StatusCode::OK,
        Json(json!({
            "status": query.status.as_deref().unwrap_or("started"),
            "sort_by": board_query.sort.as_str(),
            "search": board_query.search,
            "groups": groups.iter().map(dto::plate_group_to_json).collect::<Vec<_>>(),
            "kpis": kpis,
            "overdue_after_minutes": services.policy().overdue_after_minutes,
            "messages": services.flash().drain(principal.principal_id()),
        })),
    )
        .into_response()
}

pub async fn kpis(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = guard(&branch, &principal, Permission::ORDERS_READ) {
        return resp;
    }
    let orders = services.engine().list(branch.branch_id());
    let kpis = board_kpis(&orders, Utc::now(), services.policy().overdue_after_minutes);
    (StatusCode::OK, Json(kpis)).into_response()
}
