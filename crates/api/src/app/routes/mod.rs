use axum::{routing::get, Router};

pub mod common;
pub mod employees;
pub mod loans;
pub mod sales;
pub mod system;
pub mod teams;

/// Router for every endpoint that runs inside a unit of work.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/employees", employees::router())
        .nest("/teams", teams::router())
        .nest("/loans", loans::router())
        .nest("/sales", sales::router())
}
