// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// A patient's reservation against a concrete slot, or a free-form request
/// when `slot_id` is null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub service_id: Uuid,
    pub slot_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub modality: Modality,
    pub patient_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub meeting_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Online,
    InPerson,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::Online => write!(f, "online"),
            Modality::InPerson => write!(f, "in_person"),
        }
    }
}

// ==============================================================================
// REFERENCE RECORDS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub service_id: Uuid,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
    pub modality_default: Modality,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSlotRequest {
    pub patient_id: Uuid,
    pub slot_id: Uuid,
    pub service_id: Uuid,
    pub modality: Option<Modality>,
    pub patient_notes: Option<String>,
}

/// Slot-less request path: the patient states a preference and the clinic
/// assigns the first doctor offering the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestAppointmentRequest {
    pub patient_id: Uuid,
    pub service_id: Uuid,
    pub modality: Option<Modality>,
    pub preferred_date: Option<NaiveDate>,
    pub preferred_time: Option<NaiveTime>,
    pub patient_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApproveAppointmentRequest {
    pub new_date: Option<NaiveDate>,
    pub new_time: Option<NaiveTime>,
}

impl ApproveAppointmentRequest {
    pub fn reschedule(&self) -> Option<(NaiveDate, NaiveTime)> {
        match (self.new_date, self.new_time) {
            (Some(date), Some(time)) => Some((date, time)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectAppointmentRequest {
    pub rejection_reason: String,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Service not found")]
    ServiceNotFound,

    #[error("Slot not found")]
    SlotNotFound,

    #[error("Slot is no longer available")]
    SlotNotAvailable,

    #[error("No doctor offers this service")]
    NoDoctorForService,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}
