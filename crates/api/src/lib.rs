//! HTTP API: configuration, request-scoped unit of work, routing and response mapping.

pub mod app;
pub mod config;
pub mod constants;
pub mod context;
pub mod middleware;
