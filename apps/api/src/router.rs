use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use slot_cell::router::slot_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Carelink booking API is running!" }))
        .nest("/slots", slot_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
}
