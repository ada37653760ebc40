// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, NaiveDate, NaiveTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};
use notification_cell::{templates, NewNotification, NotificationKind, NotificationOutboxService};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookSlotRequest, Doctor, Modality,
    Patient, RequestAppointmentRequest, Service,
};
use crate::services::directory::DirectoryService;

// Blunt fallback for slot-less requests with no stated preference
const FALLBACK_START_TIME: (u32, u32) = (10, 0);

pub struct AppointmentBookingService {
    supabase: Arc<SupabaseClient>,
    directory: DirectoryService,
    outbox: NotificationOutboxService,
    admin_email: String,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));

        Self {
            directory: DirectoryService::new(Arc::clone(&supabase)),
            outbox: NotificationOutboxService::with_client(Arc::clone(&supabase)),
            admin_email: config.admin_notify_email.clone(),
            supabase,
        }
    }

    /// Book a concrete availability slot. The slot row is the source of
    /// truth for doctor, date and times; the claim is a single conditional
    /// update so two racing bookings cannot both win.
    pub async fn book_slot(
        &self,
        request: BookSlotRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!("Booking slot {} for patient {}", request.slot_id, request.patient_id);

        let patient = self.directory.get_patient(request.patient_id, auth_token).await?;
        let service = self.directory.get_service(request.service_id, auth_token).await?;

        let slot = self.get_slot(request.slot_id, auth_token).await?;
        if !slot.is_available {
            return Err(AppointmentError::SlotNotAvailable);
        }

        let doctor = self.directory.get_doctor(slot.doctor_id, auth_token).await?;

        self.claim_slot(request.slot_id, auth_token).await?;

        let modality = request.modality.clone()
            .unwrap_or_else(|| service.modality_default.clone());

        let appointment = self.create_appointment_record(
            &patient,
            &doctor,
            &service,
            Some(request.slot_id),
            slot.date,
            slot.start_time,
            slot.end_time,
            modality,
            request.patient_notes.clone(),
            auth_token,
        ).await?;

        self.enqueue_booking_notifications(&appointment, &patient, &doctor, &service, auth_token)
            .await;

        info!("Appointment {} created in pending state", appointment.id);
        Ok(appointment)
    }

    /// Slot-less request path: first doctor offering the service, fixed
    /// fallback window when the patient states no preference.
    pub async fn request_appointment(
        &self,
        request: RequestAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Appointment request for patient {} on service {}",
            request.patient_id, request.service_id
        );

        let patient = self.directory.get_patient(request.patient_id, auth_token).await?;
        let service = self.directory.get_service(request.service_id, auth_token).await?;
        let doctor = self.directory
            .first_doctor_for_service(request.service_id, auth_token)
            .await?;

        let (date, start_time) = self.resolve_requested_window(&request);
        let end_time = start_time + ChronoDuration::minutes(service.duration_minutes as i64);

        let modality = request.modality.clone()
            .unwrap_or_else(|| service.modality_default.clone());

        let appointment = self.create_appointment_record(
            &patient,
            &doctor,
            &service,
            None,
            date,
            start_time,
            end_time,
            modality,
            request.patient_notes.clone(),
            auth_token,
        ).await?;

        self.enqueue_booking_notifications(&appointment, &patient, &doctor, &service, auth_token)
            .await;

        info!("Appointment request {} created in pending state", appointment.id);
        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

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

    pub async fn list_for_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.list_appointments(&format!("patient_id=eq.{}", patient_id), auth_token).await
    }

    pub async fn list_for_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.list_appointments(&format!("doctor_id=eq.{}", doctor_id), auth_token).await
    }

    // ==============================================================================
    // PRIVATE HELPERS
    // ==============================================================================

    async fn list_appointments(
        &self,
        filter: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?{}&order=date.desc,start_time.desc",
            filter
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Appointment>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointments: {}", e)))
    }

    async fn get_slot(
        &self,
        slot_id: Uuid,
        auth_token: &str,
    ) -> Result<SlotRow, AppointmentError> {
        let path = format!("/rest/v1/availability_slots?id=eq.{}", slot_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::SlotNotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse slot: {}", e)))
    }

    /// Conditional update keyed on `is_available=eq.true`: the losing side
    /// of a race gets zero rows back and no appointment is created.
    async fn claim_slot(
        &self,
        slot_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let path = format!(
            "/rest/v1/availability_slots?id=eq.{}&is_available=eq.true",
            slot_id
        );
        let update_data = json!({
            "is_available": false,
            "updated_at": Utc::now().to_rfc3339()
        });

        let claimed: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(representation_headers()),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if claimed.is_empty() {
            warn!("Slot {} was claimed by a concurrent booking", slot_id);
            return Err(AppointmentError::SlotNotAvailable);
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_appointment_record(
        &self,
        patient: &Patient,
        doctor: &Doctor,
        service: &Service,
        slot_id: Option<Uuid>,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        modality: Modality,
        patient_notes: Option<String>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let now = Utc::now();
        let appointment_data = json!({
            "patient_id": patient.id,
            "doctor_id": doctor.id,
            "service_id": service.id,
            "slot_id": slot_id,
            "date": date,
            "start_time": start_time.format("%H:%M:%S").to_string(),
            "end_time": end_time.format("%H:%M:%S").to_string(),
            "status": AppointmentStatus::Pending.to_string(),
            "modality": modality.to_string(),
            "patient_notes": patient_notes,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(appointment_data),
            Some(representation_headers()),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::DatabaseError(
                "Failed to create appointment".to_string(),
            ));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse created appointment: {}", e)))
    }

    fn resolve_requested_window(
        &self,
        request: &RequestAppointmentRequest,
    ) -> (NaiveDate, NaiveTime) {
        let date = request.preferred_date
            .unwrap_or_else(|| Utc::now().date_naive() + ChronoDuration::days(1));
        let start_time = request.preferred_time.unwrap_or_else(|| {
            NaiveTime::from_hms_opt(FALLBACK_START_TIME.0, FALLBACK_START_TIME.1, 0).unwrap()
        });
        (date, start_time)
    }

    /// Best-effort fan-out: one email to the patient, one to the admin
    /// inbox. Enqueue failures are logged and never reach the caller.
    async fn enqueue_booking_notifications(
        &self,
        appointment: &Appointment,
        patient: &Patient,
        doctor: &Doctor,
        service: &Service,
        auth_token: &str,
    ) {
        let date = appointment.date.to_string();
        let start = appointment.start_time.format("%H:%M").to_string();

        let (patient_subject, patient_html) = templates::booking_received(
            &patient.full_name(),
            &doctor.full_name(),
            &service.name,
            &date,
            &start,
        );
        let (admin_subject, admin_html) = templates::admin_booking_alert(
            &patient.full_name(),
            &doctor.full_name(),
            &service.name,
            &date,
            &start,
        );

        let patient_send = self.outbox.enqueue(
            NewNotification {
                appointment_id: appointment.id,
                kind: NotificationKind::BookingReceived,
                recipient: patient.email.clone(),
                subject: patient_subject,
                html_body: patient_html,
            },
            auth_token,
        );
        let admin_send = self.outbox.enqueue(
            NewNotification {
                appointment_id: appointment.id,
                kind: NotificationKind::AdminBookingAlert,
                recipient: self.admin_email.clone(),
                subject: admin_subject,
                html_body: admin_html,
            },
            auth_token,
        );

        let (patient_result, admin_result) = futures::join!(patient_send, admin_send);

        if let Err(e) = patient_result {
            warn!("Failed to enqueue patient booking notification: {}", e);
        }
        if let Err(e) = admin_result {
            warn!("Failed to enqueue admin booking notification: {}", e);
        }
    }
}

/// Availability slot row as stored by the slot registry. Only the fields
/// the booking path reads are modeled here.
#[derive(Debug, Clone, serde::Deserialize)]
struct SlotRow {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
}
