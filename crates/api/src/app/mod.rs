//! HTTP application wiring.
//!
//! - `services.rs`: engine, directory, catalog and the realtime relay
//! - `routes/`: handlers, one file per screen or workflow
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `forms.rs`: urlencoded form access
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::{csrf, middleware};

pub mod dto;
pub mod errors;
pub mod forms;
pub mod routes;
pub mod services;

/// Router over a fresh in-memory deployment with the default policy and a
/// seeded catalog.
pub fn build_app(jwt_secret: String) -> Router {
    let services = Arc::new(services::AppServices::new(Default::default(), true));
    build_router(services, jwt_secret)
}

/// Protected routes run auth first, then the CSRF check.
pub fn build_router(services: Arc<services::AppServices>, jwt_secret: String) -> Router {
    let jwt = Arc::new(tracker_auth::Hs256JwtValidator::new(jwt_secret.into_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn(csrf::csrf_middleware))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/csrf", get(csrf::issue_token))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
