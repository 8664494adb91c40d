use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use tracker_auth::AuthzError;
use tracker_core::DomainError;
use tracker_infra::DispatchError;

/// `outer: inner: root`, walking `source()`.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut next = err.source();
    while let Some(cause) = next {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        next = cause.source();
    }
    out
}

pub fn dispatch_error_to_response(err: DispatchError) -> Response {
    match err {
        DispatchError::Concurrency(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DispatchError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DispatchError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DispatchError::InvalidState(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_state", msg)
        }
        DispatchError::Unauthorized => json_error(StatusCode::FORBIDDEN, "unauthorized", "unauthorized"),
        DispatchError::NotFound(what) => json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found")),
        DispatchError::BranchIsolation(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        DispatchError::Deserialize(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "deserialize_error", msg)
        }
        DispatchError::Store(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string()),
        DispatchError::Publish(msg) => json_error(StatusCode::BAD_GATEWAY, "publish_error", msg),
        DispatchError::Projection(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "projection_error", msg)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    dispatch_error_to_response(err.into())
}

pub fn forbidden(err: AuthzError) -> Response {
    json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// `{ "success": false, "error": ... }`, the contract of the form-posting workflow endpoints.
pub fn workflow_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "error": message.into(),
        })),
    )
        .into_response()
}

pub fn workflow_dispatch_error(err: DispatchError) -> Response {
    let status = match &err {
        DispatchError::Validation(_) => StatusCode::BAD_REQUEST,
        DispatchError::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DispatchError::NotFound(_) | DispatchError::BranchIsolation(_) => StatusCode::NOT_FOUND,
        DispatchError::Concurrency(_) | DispatchError::Conflict(_) => StatusCode::CONFLICT,
        DispatchError::Unauthorized => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    workflow_error(status, err.user_message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_infra::event_store::EventStoreError;

    #[test]
    fn error_chain_includes_store_cause() {
        let err = DispatchError::Store(EventStoreError::Unavailable("engine lock poisoned".into()));
        assert_eq!(
            error_chain(&err),
            "event store failure: event store unavailable: engine lock poisoned"
        );
        assert_eq!(error_chain(&DispatchError::Validation("bad".into())), "bad");
    }
}
