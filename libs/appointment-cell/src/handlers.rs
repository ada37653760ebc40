// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, ApproveAppointmentRequest, BookSlotRequest, RejectAppointmentRequest,
    RequestAppointmentRequest,
};
use crate::services::approval::AppointmentApprovalService;
use crate::services::booking::AppointmentBookingService;

fn map_appointment_error(error: AppointmentError) -> AppError {
    match error {
        AppointmentError::NotFound => {
            AppError::NotFound("Appointment not found".to_string())
        },
        AppointmentError::PatientNotFound => {
            AppError::NotFound("Patient not found".to_string())
        },
        AppointmentError::DoctorNotFound => {
            AppError::NotFound("Doctor not found".to_string())
        },
        AppointmentError::ServiceNotFound => {
            AppError::NotFound("Service not found".to_string())
        },
        // An unavailable slot is indistinguishable from a missing one at
        // the boundary: both surface as not-found
        AppointmentError::SlotNotFound | AppointmentError::SlotNotAvailable => {
            AppError::NotFound("Slot not found or no longer available".to_string())
        },
        AppointmentError::NoDoctorForService => {
            AppError::NotFound("No doctors available for this service".to_string())
        },
        AppointmentError::InvalidStatusTransition(status) => {
            AppError::BadRequest(format!("Cannot transition from current status: {}", status))
        },
        AppointmentError::InvalidTime(msg) => AppError::BadRequest(msg),
        AppointmentError::ValidationError(msg) => AppError::Validation(msg),
        AppointmentError::DatabaseError(msg) => AppError::Internal(msg),
        AppointmentError::ExternalServiceError(msg) => AppError::Internal(msg),
    }
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    // Patients book for themselves; admins can book on a patient's behalf
    let is_patient = request.patient_id.to_string() == user.id;
    if !is_patient && !user.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to book appointment for this patient".to_string(),
        ));
    }

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service.book_slot(request, token).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn request_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RequestAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let is_patient = request.patient_id.to_string() == user.id;
    if !is_patient && !user.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to request appointment for this patient".to_string(),
        ));
    }

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service.request_appointment(request, token).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment request submitted"
    })))
}

// ==============================================================================
// APPROVAL HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn approve_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<ApproveAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let approval_service = AppointmentApprovalService::new(&state);

    let appointment = approval_service.get_appointment(appointment_id, token).await
        .map_err(map_appointment_error)?;

    let is_doctor = appointment.doctor_id.to_string() == user.id;
    if !is_doctor && !user.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to approve this appointment".to_string(),
        ));
    }

    let confirmed = approval_service.approve(appointment_id, request, token).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": confirmed,
        "message": "Appointment approved"
    })))
}

#[axum::debug_handler]
pub async fn reject_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RejectAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let approval_service = AppointmentApprovalService::new(&state);

    let appointment = approval_service.get_appointment(appointment_id, token).await
        .map_err(map_appointment_error)?;

    let is_doctor = appointment.doctor_id.to_string() == user.id;
    if !is_doctor && !user.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to reject this appointment".to_string(),
        ));
    }

    let rejected = approval_service.reject(appointment_id, request, token).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": rejected,
        "message": "Appointment rejected"
    })))
}

// ==============================================================================
// READ HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service.get_appointment(appointment_id, token).await
        .map_err(map_appointment_error)?;

    let is_patient = appointment.patient_id.to_string() == user.id;
    let is_doctor = appointment.doctor_id.to_string() == user.id;
    if !is_patient && !is_doctor && !user.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to view this appointment".to_string(),
        ));
    }

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let is_patient = patient_id.to_string() == user.id;
    if !is_patient && !user.is_staff() {
        return Err(AppError::Auth(
            "Not authorized to view this patient's appointments".to_string(),
        ));
    }

    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service.list_for_patient(patient_id, token).await
        .map_err(map_appointment_error)?;

    let count = appointments.len();
    Ok(Json(json!({
        "appointments": appointments,
        "count": count
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let is_doctor = doctor_id.to_string() == user.id;
    if !is_doctor && !user.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to view this doctor's appointments".to_string(),
        ));
    }

    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service.list_for_doctor(doctor_id, token).await
        .map_err(map_appointment_error)?;

    let count = appointments.len();
    Ok(Json(json!({
        "appointments": appointments,
        "count": count
    })))
}
