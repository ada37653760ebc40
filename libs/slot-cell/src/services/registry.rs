// libs/slot-cell/src/services/registry.rs
use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};

use crate::models::{AvailabilitySlot, CreateSlotRequest, SlotError, SlotQuery};

pub struct SlotRegistryService {
    supabase: Arc<SupabaseClient>,
}

impl SlotRegistryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Create an availability window for a doctor. Fails when the range is
    /// empty or when it intersects an existing window for the same
    /// doctor and date.
    pub async fn create_slot(
        &self,
        doctor_id: Uuid,
        request: CreateSlotRequest,
        auth_token: &str,
    ) -> Result<AvailabilitySlot, SlotError> {
        debug!("Creating slot for doctor {} on {}", doctor_id, request.date);

        if request.start_time >= request.end_time {
            return Err(SlotError::InvalidTimeRange(
                "Start time must be before end time".to_string(),
            ));
        }

        let max_appointments = request.max_appointments.unwrap_or(1);
        if max_appointments < 1 {
            return Err(SlotError::Validation(
                "max_appointments must be at least 1".to_string(),
            ));
        }

        self.check_overlap(doctor_id, &request, auth_token).await?;

        let now = Utc::now();
        let slot_data = json!({
            "doctor_id": doctor_id,
            "service_id": request.service_id,
            "date": request.date,
            "start_time": request.start_time.format("%H:%M:%S").to_string(),
            "end_time": request.end_time.format("%H:%M:%S").to_string(),
            "max_appointments": max_appointments,
            "is_available": true,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/availability_slots",
            Some(auth_token),
            Some(slot_data),
            Some(representation_headers()),
        ).await.map_err(|e| SlotError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(SlotError::Database("Failed to create slot".to_string()));
        }

        let slot: AvailabilitySlot = serde_json::from_value(result[0].clone())
            .map_err(|e| SlotError::Database(format!("Failed to parse created slot: {}", e)))?;

        debug!("Slot created with ID: {}", slot.id);
        Ok(slot)
    }

    pub async fn get_slot(
        &self,
        slot_id: Uuid,
        auth_token: &str,
    ) -> Result<AvailabilitySlot, SlotError> {
        let path = format!("/rest/v1/availability_slots?id=eq.{}", slot_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| SlotError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(SlotError::NotFound);
        }

        let slot: AvailabilitySlot = serde_json::from_value(result[0].clone())
            .map_err(|e| SlotError::Database(format!("Failed to parse slot: {}", e)))?;

        Ok(slot)
    }

    /// List slots, optionally filtered by doctor, service, date and
    /// availability. Ordered for display in booking pages.
    pub async fn list_slots(
        &self,
        query: SlotQuery,
        auth_token: &str,
    ) -> Result<Vec<AvailabilitySlot>, SlotError> {
        let mut query_parts = Vec::new();

        if let Some(doctor_id) = query.doctor_id {
            query_parts.push(format!("doctor_id=eq.{}", doctor_id));
        }
        if let Some(service_id) = query.service_id {
            query_parts.push(format!("service_id=eq.{}", service_id));
        }
        if let Some(date) = query.date {
            query_parts.push(format!("date=eq.{}", date));
        }
        if query.only_available.unwrap_or(false) {
            query_parts.push("is_available=eq.true".to_string());
        }

        let path = format!(
            "/rest/v1/availability_slots?{}&order=date.asc,start_time.asc",
            query_parts.join("&")
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| SlotError::Database(e.to_string()))?;

        let slots: Vec<AvailabilitySlot> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<AvailabilitySlot>, _>>()
            .map_err(|e| SlotError::Database(format!("Failed to parse slots: {}", e)))?;

        Ok(slots)
    }

    /// Delete an availability window. Refused while pending or confirmed
    /// appointments still reference it.
    pub async fn delete_slot(
        &self,
        slot_id: Uuid,
        auth_token: &str,
    ) -> Result<(), SlotError> {
        debug!("Deleting slot: {}", slot_id);

        // Ensure the slot exists so a bad id surfaces as 404, not a no-op
        self.get_slot(slot_id, auth_token).await?;

        let referencing_path = format!(
            "/rest/v1/appointments?slot_id=eq.{}&status=in.(pending,confirmed)&limit=1",
            slot_id
        );
        let referencing: Vec<Value> = self.supabase.request(
            Method::GET,
            &referencing_path,
            Some(auth_token),
            None,
        ).await.map_err(|e| SlotError::Database(e.to_string()))?;

        if !referencing.is_empty() {
            warn!("Refusing to delete slot {} with live appointments", slot_id);
            return Err(SlotError::InUse);
        }

        let path = format!("/rest/v1/availability_slots?id=eq.{}", slot_id);
        let _: Vec<Value> = self.supabase.request(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| SlotError::Database(e.to_string()))?;

        Ok(())
    }

    async fn check_overlap(
        &self,
        doctor_id: Uuid,
        request: &CreateSlotRequest,
        auth_token: &str,
    ) -> Result<(), SlotError> {
        let path = format!(
            "/rest/v1/availability_slots?doctor_id=eq.{}&date=eq.{}",
            doctor_id, request.date
        );

        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| SlotError::Database(e.to_string()))?;

        for row in existing {
            let slot: AvailabilitySlot = serde_json::from_value(row)
                .map_err(|e| SlotError::Database(format!("Failed to parse slot: {}", e)))?;

            if slot.overlaps(request.start_time, request.end_time) {
                warn!(
                    "Slot overlap for doctor {} on {}: requested {}-{} intersects {}-{}",
                    doctor_id, request.date,
                    request.start_time, request.end_time,
                    slot.start_time, slot.end_time
                );
                return Err(SlotError::Overlap);
            }
        }

        Ok(())
    }
}
