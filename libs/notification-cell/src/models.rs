// libs/notification-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingReceived,
    AdminBookingAlert,
    AppointmentApproved,
    AppointmentRejected,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::BookingReceived => write!(f, "booking_received"),
            NotificationKind::AdminBookingAlert => write!(f, "admin_booking_alert"),
            NotificationKind::AppointmentApproved => write!(f, "appointment_approved"),
            NotificationKind::AppointmentRejected => write!(f, "appointment_rejected"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    Queued,
    Sent,
    Failed,
}

impl fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutboxStatus::Queued => write!(f, "queued"),
            OutboxStatus::Sent => write!(f, "sent"),
            OutboxStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A persisted email waiting for the dispatch worker. The row outlives the
/// request that produced it, so a relay outage never reaches the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub kind: NotificationKind,
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
    pub status: OutboxStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub appointment_id: Uuid,
    pub kind: NotificationKind,
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
}

#[derive(Debug, Clone, Default)]
pub struct DispatchStats {
    pub sent: usize,
    pub retried: usize,
    pub failed: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Mail relay is not configured")]
    NotConfigured,

    #[error("Mail relay error: {0}")]
    RelayError(String),

    #[error("Database error: {0}")]
    Database(String),
}
