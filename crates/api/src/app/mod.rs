//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: repository wiring behind the `Ebonite` client
//! - `routes/`: HTTP routes + handlers (one file per entity kind)
//! - `dto.rs`: request bodies and query/path parsing helpers
//! - `errors.rs`: consistent `{"errormsg": ...}` error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: AppServices) -> Router {
    let services = Arc::new(services);

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
