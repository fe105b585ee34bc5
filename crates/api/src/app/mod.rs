//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: session provider, command registry, mapper and processor
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request bodies, UI forms and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &AppConfig) -> Router {
    let services = Arc::new(services::AppServices::new(config));
    let sessions = services.sessions().clone();

    let transactional = routes::router().layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn(middleware::current_employee_middleware))
            .layer(Extension(services))
            .layer(axum::middleware::from_fn_with_state(
                sessions,
                middleware::unit_of_work_middleware,
            )),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(transactional)
}
