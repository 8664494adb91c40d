//! Double-submit CSRF protection.
//!
//! `GET /csrf` hands out a random token and sets it as the `csrftoken` cookie.
//! Every unsafe request must echo the cookie value back, either in the
//! `X-CSRFToken` header or in the `csrfmiddlewaretoken` form field.

use axum::{
    Json,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;
use uuid::Uuid;

use crate::app::errors::json_error;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "x-csrftoken";
pub const CSRF_FORM_FIELD: &str = "csrfmiddlewaretoken";

const MAX_FORM_BYTES: usize = 1 << 20;

pub fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Non-empty `csrftoken` value from the `Cookie` header(s).
pub fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == CSRF_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

fn rejected(req_path: &str, reason: &'static str) -> Response {
    warn!(path = %req_path, reason, "csrf check failed");
    json_error(StatusCode::FORBIDDEN, "csrf_failed", reason)
}

pub async fn csrf_middleware(req: Request<Body>, next: Next) -> Response {
    if req.method().is_safe() {
        return next.run(req).await;
    }
    let path = req.uri().path().to_string();

    let Some(expected) = cookie_token(req.headers()) else {
        return rejected(&path, "missing csrf cookie");
    };

    let header_token = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);
    if header_token == Some(expected.as_str()) {
        return next.run(req).await;
    }

    if !is_form(req.headers()) {
        return rejected(&path, "csrf token mismatch");
    }

    // The body is consumed to read the form field, then handed on unchanged.
    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_FORM_BYTES).await {
        Ok(b) => b,
        Err(_) => return rejected(&path, "unreadable form body"),
    };
    let submitted = url::form_urlencoded::parse(&bytes)
        .find(|(k, _)| k == CSRF_FORM_FIELD)
        .map(|(_, v)| v.trim().to_string());

    if submitted.as_deref() == Some(expected.as_str()) {
        next.run(Request::from_parts(parts, Body::from(bytes))).await
    } else {
        rejected(&path, "csrf token mismatch")
    }
}

/// `GET /csrf`
pub async fn issue_token() -> Response {
    let token = new_token();
    let cookie = format!("{CSRF_COOKIE}={token}; Path=/; SameSite=Lax");
    (
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({ "csrf_token": token })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_token_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("sessionid=abc; csrftoken=t0k3n ; theme=dark"),
        );
        assert_eq!(cookie_token(&headers).as_deref(), Some("t0k3n"));
    }

    #[test]
    fn empty_or_missing_cookie_is_no_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(cookie_token(&headers), None);
        headers.insert(header::COOKIE, HeaderValue::from_static("csrftoken="));
        assert_eq!(cookie_token(&headers), None);
    }

    #[test]
    fn tokens_are_unique_hex() {
        let (a, b) = (new_token(), new_token());
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
