use axum::{Router, routing::MethodRouter, routing::get};

pub mod crops;
pub mod fields;
pub mod inventory;
pub mod system;
pub mod tasks;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .merge(fields::router())
        .merge(crops::router())
        .merge(inventory::router())
        .merge(tasks::router())
        .merge(users::router())
}

/// Register `path` with and without a trailing slash.
pub(crate) fn route_both(router: Router, path: &str, method_router: MethodRouter) -> Router {
    router
        .route(path, method_router.clone())
        .route(&format!("{path}/"), method_router)
}
