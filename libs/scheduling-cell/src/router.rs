// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::post,
};

use crate::handlers;
use crate::services::SchedulingService;

pub fn scheduling_routes(service: Arc<SchedulingService>) -> Router {
    Router::new()
        .route("/availability/check", post(handlers::check_availability))
        .route("/availability/bulk-check", post(handlers::check_bulk_availability))
        .route("/conflicts/resolve", post(handlers::resolve_conflicts))
        .with_state(service)
}
