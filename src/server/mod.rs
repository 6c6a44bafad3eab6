//! HTTP server for the panel namespace

mod routes;

pub use routes::{create_router, create_router_with_name, status_for, AppState};
