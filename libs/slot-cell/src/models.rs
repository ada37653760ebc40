// libs/slot-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A doctor's declared window of availability for a specific service.
/// Consumed (marked unavailable) by a successful booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_appointments: i32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AvailabilitySlot {
    /// Half-open [start, end) intersection against another window on the
    /// same doctor/date.
    pub fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        start < self.end_time && end > self.start_time
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSlotRequest {
    /// Omitted when a doctor creates their own slot; admins must name one.
    pub doctor_id: Option<Uuid>,
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_appointments: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotQuery {
    pub doctor_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub only_available: Option<bool>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SlotError {
    #[error("Slot not found")]
    NotFound,

    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("Slot overlaps an existing availability window")]
    Overlap,

    #[error("Slot is referenced by pending or confirmed appointments")]
    InUse,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}
