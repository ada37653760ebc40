use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub mail_relay_base_url: String,
    pub meeting_rooms_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            mail_relay_base_url: "http://localhost:54322".to_string(),
            meeting_rooms_base_url: "http://localhost:54323".to_string(),
        }
    }
}

impl TestConfig {
    /// Config pointed at a mock Supabase server.
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            supabase_service_key: "test-service-key".to_string(),
            mail_relay_base_url: self.mail_relay_base_url.clone(),
            mail_relay_api_token: "test-relay-token".to_string(),
            mail_from_address: "no-reply@carelink.test".to_string(),
            admin_notify_email: "admin@carelink.test".to_string(),
            meeting_rooms_base_url: self.meeting_rooms_base_url.clone(),
            meeting_rooms_api_token: "test-meeting-token".to_string(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned PostgREST row bodies for wiremock-backed tests.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn patient_response(patient_id: &str, email: &str, first_name: &str) -> serde_json::Value {
        json!({
            "id": patient_id,
            "first_name": first_name,
            "last_name": "Tester",
            "email": email
        })
    }

    pub fn doctor_response(doctor_id: &str, email: &str, first_name: &str, service_id: &str) -> serde_json::Value {
        json!({
            "id": doctor_id,
            "first_name": first_name,
            "last_name": "Practitioner",
            "email": email,
            "service_id": service_id
        })
    }

    pub fn service_response(service_id: &str, name: &str, duration_minutes: i32) -> serde_json::Value {
        json!({
            "id": service_id,
            "name": name,
            "duration_minutes": duration_minutes,
            "modality_default": "in_person"
        })
    }

    pub fn slot_response(
        slot_id: &str,
        doctor_id: &str,
        service_id: &str,
        date: &str,
        start_time: &str,
        end_time: &str,
        is_available: bool,
    ) -> serde_json::Value {
        json!({
            "id": slot_id,
            "doctor_id": doctor_id,
            "service_id": service_id,
            "date": date,
            "start_time": start_time,
            "end_time": end_time,
            "max_appointments": 1,
            "is_available": is_available,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn appointment_response(
        appointment_id: &str,
        patient_id: &str,
        doctor_id: &str,
        service_id: &str,
        slot_id: Option<&str>,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": appointment_id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "service_id": service_id,
            "slot_id": slot_id,
            "date": "2025-01-10",
            "start_time": "09:00:00",
            "end_time": "10:00:00",
            "status": status,
            "modality": "in_person",
            "patient_notes": null,
            "rejection_reason": null,
            "meeting_link": null,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }
}
