// libs/appointment-cell/src/services/meeting.rs
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::AppointmentError;

#[derive(Debug, Deserialize)]
struct MeetingRoomResponse {
    room_url: String,
}

/// Client for the external meeting-room provisioning endpoint. Used
/// best-effort on confirmation of online appointments.
pub struct MeetingRoomClient {
    client: Client,
    base_url: String,
    api_token: String,
}

impl MeetingRoomClient {
    pub fn new(config: &AppConfig) -> Result<Self, AppointmentError> {
        if !config.is_meeting_rooms_configured() {
            return Err(AppointmentError::ExternalServiceError(
                "Meeting room provisioning is not configured".to_string(),
            ));
        }

        Ok(Self {
            client: Client::new(),
            base_url: config.meeting_rooms_base_url.clone(),
            api_token: config.meeting_rooms_api_token.clone(),
        })
    }

    /// Request a meeting room for an appointment and return its join URL.
    pub async fn provision_room(
        &self,
        appointment_id: Uuid,
    ) -> Result<String, AppointmentError> {
        let url = format!("{}/rooms", self.base_url);

        let request_body = json!({
            "reference": appointment_id,
        });

        debug!("Requesting meeting room from {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppointmentError::ExternalServiceError(e.to_string()))?;

        let status = response.status();
        let response_text = response.text().await
            .map_err(|e| AppointmentError::ExternalServiceError(e.to_string()))?;

        if !status.is_success() {
            error!("Meeting room provisioning failed: {} - {}", status, response_text);
            return Err(AppointmentError::ExternalServiceError(format!(
                "HTTP {}: {}",
                status, response_text
            )));
        }

        let room: MeetingRoomResponse = serde_json::from_str(&response_text)
            .map_err(|e| AppointmentError::ExternalServiceError(
                format!("Failed to parse meeting room response: {}", e),
            ))?;

        info!("Meeting room provisioned for appointment {}", appointment_id);
        Ok(room.room_url)
    }
}
