// libs/appointment-cell/src/services/directory.rs
use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{AppointmentError, Doctor, Patient, Service};

/// Read-mostly lookups for the reference records the workflow touches.
pub struct DirectoryService {
    supabase: Arc<SupabaseClient>,
}

impl DirectoryService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn get_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Patient, AppointmentError> {
        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::PatientNotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse patient: {}", e)))
    }

    pub async fn get_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Doctor, AppointmentError> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::DoctorNotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse doctor: {}", e)))
    }

    pub async fn get_service(
        &self,
        service_id: Uuid,
        auth_token: &str,
    ) -> Result<Service, AppointmentError> {
        let path = format!("/rest/v1/services?id=eq.{}", service_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::ServiceNotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse service: {}", e)))
    }

    /// First doctor offering the service, in storage order. The request
    /// path deliberately does no ranking.
    pub async fn first_doctor_for_service(
        &self,
        service_id: Uuid,
        auth_token: &str,
    ) -> Result<Doctor, AppointmentError> {
        debug!("Looking up a doctor for service {}", service_id);

        let path = format!("/rest/v1/doctors?service_id=eq.{}&limit=1", service_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::NoDoctorForService);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse doctor: {}", e)))
    }
}
