use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use tracker_auth::Permission;
use tracker_catalog::LabourCategory;

use crate::app::routes::common::guard;
use crate::app::{dto, errors, services::AppServices};
use crate::context::{BranchContext, PrincipalContext};

const SEARCH_LIMIT: usize = 20;

pub async fn service_types(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = guard(&branch, &principal, Permission::CATALOG_READ) {
        return resp;
    }

    let payload = services.catalog().read(|c| {
        json!({
            "service_types": c.active_service_types().iter().map(|s| json!({
                "id": s.id,
                "name": s.name,
                "estimated_minutes": s.estimated_minutes,
            })).collect::<Vec<_>>(),
            "addons": c.active_addons().iter().map(|a| json!({
                "id": a.id,
                "name": a.name,
                "estimated_minutes": a.estimated_minutes,
            })).collect::<Vec<_>>(),
            "inventory_items": c.active_inventory().into_iter()
                .map(|i| dto::inventory_item_to_json(c, i))
                .collect::<Vec<_>>(),
            "labour_codes": c.active_labour_codes().into_iter()
                .map(dto::labour_code_to_json)
                .collect::<Vec<_>>(),
        })
    });
    (StatusCode::OK, Json(payload)).into_response()
}

/// Exact code match first, then item name (optionally within a category),
/// then free-text search.
pub async fn lookup_labour_code(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::LabourLookupQuery>,
) -> Response {
    if let Err(resp) = guard(&branch, &principal, Permission::CATALOG_READ) {
        return resp;
    }

    let category = match query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(raw) => match LabourCategory::parse(raw) {
            Some(c) => Some(c),
            None => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_category",
                    format!("unknown labour category '{raw}'"),
                );
            }
        },
        None => None,
    };

    let code = query.code.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let item_name = query.item_name.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let text = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty());

    if code.is_none() && item_name.is_none() && text.is_none() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "one of code, item_name or q is required",
        );
    }

    let payload = services.catalog().read(|c| {
        let hit = code
            .and_then(|code| c.lookup_by_code(code))
            .or_else(|| item_name.and_then(|name| c.lookup_by_name(name, category)));
        match (hit, text) {
            (Some(lc), _) => json!({ "found": true, "labour_code": dto::labour_code_to_json(lc) }),
            (None, Some(text)) => {
                let results: Vec<_> = c
                    .search_by_description(text, category, SEARCH_LIMIT)
                    .into_iter()
                    .map(dto::labour_code_to_json)
                    .collect();
                json!({ "found": !results.is_empty(), "results": results })
            }
            (None, None) => json!({ "found": false }),
        }
    });
    (StatusCode::OK, Json(payload)).into_response()
}
