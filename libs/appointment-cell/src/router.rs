// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    // All appointment operations require authentication
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/request", post(handlers::request_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/approve", post(handlers::approve_appointment))
        .route("/{appointment_id}/reject", post(handlers::reject_appointment))
        .route("/patients/{patient_id}", get(handlers::get_patient_appointments))
        .route("/doctors/{doctor_id}", get(handlers::get_doctor_appointments))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
