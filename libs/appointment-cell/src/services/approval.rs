// libs/appointment-cell/src/services/approval.rs
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};
use notification_cell::{templates, NewNotification, NotificationKind, NotificationOutboxService};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, ApproveAppointmentRequest, Modality,
    RejectAppointmentRequest,
};
use crate::services::directory::DirectoryService;
use crate::services::lifecycle::AppointmentLifecycle;
use crate::services::meeting::MeetingRoomClient;

pub struct AppointmentApprovalService {
    supabase: Arc<SupabaseClient>,
    directory: DirectoryService,
    lifecycle: AppointmentLifecycle,
    outbox: NotificationOutboxService,
    meeting_client: Option<MeetingRoomClient>,
}

impl AppointmentApprovalService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));

        // Provisioning stays optional: an unconfigured endpoint downgrades
        // online confirmations to link-less, it never blocks them
        let meeting_client = match MeetingRoomClient::new(config) {
            Ok(client) => Some(client),
            Err(_) => {
                warn!("Meeting room provisioning not configured; online appointments get no link");
                None
            }
        };

        Self {
            directory: DirectoryService::new(Arc::clone(&supabase)),
            lifecycle: AppointmentLifecycle::new(),
            outbox: NotificationOutboxService::with_client(Arc::clone(&supabase)),
            meeting_client,
            supabase,
        }
    }

    /// Confirm a pending appointment, optionally moving it to a new
    /// date/time. A reschedule recomputes the end from the service's fixed
    /// duration.
    pub async fn approve(
        &self,
        appointment_id: Uuid,
        request: ApproveAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!("Approving appointment {}", appointment_id);

        let current = self.get_appointment(appointment_id, auth_token).await?;
        self.lifecycle.validate_status_transition(
            &current.status,
            &AppointmentStatus::Confirmed,
        )?;

        let mut update_data = serde_json::Map::new();
        update_data.insert("status".to_string(), json!(AppointmentStatus::Confirmed.to_string()));

        if let Some((new_date, new_time)) = request.reschedule() {
            let service = self.directory.get_service(current.service_id, auth_token).await?;
            let new_end = new_time + ChronoDuration::minutes(service.duration_minutes as i64);

            update_data.insert("date".to_string(), json!(new_date));
            update_data.insert("start_time".to_string(),
                json!(new_time.format("%H:%M:%S").to_string()));
            update_data.insert("end_time".to_string(),
                json!(new_end.format("%H:%M:%S").to_string()));
        }

        let mut confirmed = self.update_appointment_record(
            appointment_id,
            Value::Object(update_data),
            auth_token,
        ).await?;

        // Best-effort side call: a failed provisioning never un-confirms
        if confirmed.modality == Modality::Online && confirmed.meeting_link.is_none() {
            match self.provision_meeting_link(&confirmed, auth_token).await {
                Ok(link) => confirmed.meeting_link = Some(link),
                Err(e) => warn!(
                    "Meeting room provisioning failed for appointment {}: {}",
                    confirmed.id, e
                ),
            }
        }

        self.enqueue_approval_notification(&confirmed, auth_token).await;

        info!("Appointment {} confirmed", confirmed.id);
        Ok(confirmed)
    }

    /// Reject a pending appointment. The reason is mandatory and stored on
    /// the row.
    pub async fn reject(
        &self,
        appointment_id: Uuid,
        request: RejectAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!("Rejecting appointment {}", appointment_id);

        let reason = request.rejection_reason.trim();
        if reason.is_empty() {
            return Err(AppointmentError::ValidationError(
                "A rejection reason is required".to_string(),
            ));
        }

        let current = self.get_appointment(appointment_id, auth_token).await?;
        self.lifecycle.validate_status_transition(
            &current.status,
            &AppointmentStatus::Rejected,
        )?;

        // TODO: product decision pending on whether rejecting a slot-backed
        // appointment should flip the slot back to available.
        let update_data = json!({
            "status": AppointmentStatus::Rejected.to_string(),
            "rejection_reason": reason,
        });

        let rejected = self.update_appointment_record(
            appointment_id,
            update_data,
            auth_token,
        ).await?;

        self.enqueue_rejection_notification(&rejected, reason, auth_token).await;

        info!("Appointment {} rejected", rejected.id);
        Ok(rejected)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    // ==============================================================================
    // PRIVATE HELPERS
    // ==============================================================================

    async fn update_appointment_record(
        &self,
        appointment_id: Uuid,
        mut update_data: Value,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        if let Some(map) = update_data.as_object_mut() {
            map.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
        }

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(representation_headers()),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::DatabaseError(
                "Failed to update appointment".to_string(),
            ));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse updated appointment: {}", e)))
    }

    async fn provision_meeting_link(
        &self,
        appointment: &Appointment,
        auth_token: &str,
    ) -> Result<String, AppointmentError> {
        let client = self.meeting_client.as_ref()
            .ok_or_else(|| AppointmentError::ExternalServiceError(
                "Meeting room provisioning is not configured".to_string(),
            ))?;

        let link = client.provision_room(appointment.id).await?;

        let update_data = json!({
            "meeting_link": link,
            "updated_at": Utc::now().to_rfc3339()
        });
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment.id);
        let _: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(representation_headers()),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Ok(link)
    }

    async fn enqueue_approval_notification(&self, appointment: &Appointment, auth_token: &str) {
        let display = match self.load_display_fields(appointment, auth_token).await {
            Ok(display) => display,
            Err(e) => {
                warn!("Skipping approval notification for {}: {}", appointment.id, e);
                return;
            }
        };

        let (subject, html) = templates::appointment_approved(
            &display.patient_name,
            &display.doctor_name,
            &display.service_name,
            &appointment.date.to_string(),
            &appointment.start_time.format("%H:%M").to_string(),
            appointment.meeting_link.as_deref(),
        );

        let result = self.outbox.enqueue(
            NewNotification {
                appointment_id: appointment.id,
                kind: NotificationKind::AppointmentApproved,
                recipient: display.patient_email,
                subject,
                html_body: html,
            },
            auth_token,
        ).await;

        if let Err(e) = result {
            warn!("Failed to enqueue approval notification: {}", e);
        }
    }

    async fn enqueue_rejection_notification(
        &self,
        appointment: &Appointment,
        reason: &str,
        auth_token: &str,
    ) {
        let display = match self.load_display_fields(appointment, auth_token).await {
            Ok(display) => display,
            Err(e) => {
                warn!("Skipping rejection notification for {}: {}", appointment.id, e);
                return;
            }
        };

        let (subject, html) = templates::appointment_rejected(
            &display.patient_name,
            &display.service_name,
            &appointment.date.to_string(),
            reason,
        );

        let result = self.outbox.enqueue(
            NewNotification {
                appointment_id: appointment.id,
                kind: NotificationKind::AppointmentRejected,
                recipient: display.patient_email,
                subject,
                html_body: html,
            },
            auth_token,
        ).await;

        if let Err(e) = result {
            warn!("Failed to enqueue rejection notification: {}", e);
        }
    }

    async fn load_display_fields(
        &self,
        appointment: &Appointment,
        auth_token: &str,
    ) -> Result<DisplayFields, AppointmentError> {
        let patient = self.directory.get_patient(appointment.patient_id, auth_token).await?;
        let doctor = self.directory.get_doctor(appointment.doctor_id, auth_token).await?;
        let service = self.directory.get_service(appointment.service_id, auth_token).await?;

        Ok(DisplayFields {
            patient_name: patient.full_name(),
            patient_email: patient.email,
            doctor_name: doctor.full_name(),
            service_name: service.name,
        })
    }
}

struct DisplayFields {
    patient_name: String,
    patient_email: String,
    doctor_name: String,
    service_name: String,
}
