// libs/notification-cell/src/services/mailer.rs
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::models::NotificationError;

/// HTTP client for the transactional mail relay. One attempt per call;
/// retry policy belongs to the outbox, not the transport.
#[derive(Debug)]
pub struct MailRelayClient {
    client: Client,
    base_url: String,
    api_token: String,
    from_address: String,
}

impl MailRelayClient {
    pub fn new(config: &AppConfig) -> Result<Self, NotificationError> {
        if !config.is_mailer_configured() {
            return Err(NotificationError::NotConfigured);
        }

        Ok(Self {
            client: Client::new(),
            base_url: config.mail_relay_base_url.clone(),
            api_token: config.mail_relay_api_token.clone(),
            from_address: config.mail_from_address.clone(),
        })
    }

    pub async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), NotificationError> {
        let url = format!("{}/send", self.base_url);

        let request_body = json!({
            "from": self.from_address,
            "to": to,
            "subject": subject,
            "html": html_body
        });

        debug!("Sending email to {} via {}", to, url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| NotificationError::RelayError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let response_text = response.text().await.unwrap_or_default();
            error!("Mail relay send failed: {} - {}", status, response_text);
            return Err(NotificationError::RelayError(format!(
                "HTTP {}: {}",
                status, response_text
            )));
        }

        info!("Email delivered to relay for {}", to);
        Ok(())
    }
}
