// libs/notification-cell/src/services/outbox.rs
use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};

use crate::models::{
    DispatchStats, NewNotification, NotificationError, OutboxEntry, OutboxStatus,
};
use crate::services::mailer::MailRelayClient;

const MAX_ATTEMPTS: i32 = 3;
const DISPATCH_BATCH_SIZE: i32 = 20;

pub struct NotificationOutboxService {
    supabase: Arc<SupabaseClient>,
}

impl NotificationOutboxService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Persist a notification for the dispatch worker. Callers on the
    /// primary write path treat failures as log-only.
    pub async fn enqueue(
        &self,
        notification: NewNotification,
        auth_token: &str,
    ) -> Result<OutboxEntry, NotificationError> {
        let now = Utc::now();
        let entry_data = json!({
            "appointment_id": notification.appointment_id,
            "kind": notification.kind.to_string(),
            "recipient": notification.recipient,
            "subject": notification.subject,
            "html_body": notification.html_body,
            "status": OutboxStatus::Queued.to_string(),
            "attempts": 0,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/notification_outbox",
            Some(auth_token),
            Some(entry_data),
            Some(representation_headers()),
        ).await.map_err(|e| NotificationError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(NotificationError::Database(
                "Failed to enqueue notification".to_string(),
            ));
        }

        let entry: OutboxEntry = serde_json::from_value(result[0].clone())
            .map_err(|e| NotificationError::Database(format!("Failed to parse outbox entry: {}", e)))?;

        debug!("Notification {} queued for {}", entry.id, entry.recipient);
        Ok(entry)
    }

    /// Drain one batch of queued notifications through the relay. Every
    /// failure is recorded on the row; nothing propagates past the stats.
    pub async fn dispatch_due(
        &self,
        mailer: &MailRelayClient,
        auth_token: &str,
    ) -> Result<DispatchStats, NotificationError> {
        let path = format!(
            "/rest/v1/notification_outbox?status=eq.queued&order=created_at.asc&limit={}",
            DISPATCH_BATCH_SIZE
        );
        let rows: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| NotificationError::Database(e.to_string()))?;

        let mut stats = DispatchStats::default();

        for row in rows {
            let entry: OutboxEntry = match serde_json::from_value(row) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unparseable outbox row: {}", e);
                    continue;
                }
            };

            match mailer.send_email(&entry.recipient, &entry.subject, &entry.html_body).await {
                Ok(()) => {
                    self.mark_entry(&entry, OutboxStatus::Sent, None, auth_token).await?;
                    stats.sent += 1;
                },
                Err(e) => {
                    let attempts = entry.attempts + 1;
                    let status = if attempts >= MAX_ATTEMPTS {
                        stats.failed += 1;
                        OutboxStatus::Failed
                    } else {
                        stats.retried += 1;
                        OutboxStatus::Queued
                    };
                    warn!(
                        "Notification {} attempt {} failed: {}",
                        entry.id, attempts, e
                    );
                    self.mark_entry(&entry, status, Some(e.to_string()), auth_token).await?;
                },
            }
        }

        if stats.sent + stats.retried + stats.failed > 0 {
            info!(
                "Outbox dispatch: {} sent, {} retried, {} failed",
                stats.sent, stats.retried, stats.failed
            );
        }

        Ok(stats)
    }

    pub async fn get_entries_for_appointment(
        &self,
        appointment_id: uuid::Uuid,
        auth_token: &str,
    ) -> Result<Vec<OutboxEntry>, NotificationError> {
        let path = format!(
            "/rest/v1/notification_outbox?appointment_id=eq.{}&order=created_at.asc",
            appointment_id
        );
        let rows: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| NotificationError::Database(e.to_string()))?;

        let entries: Vec<OutboxEntry> = rows.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<OutboxEntry>, _>>()
            .map_err(|e| NotificationError::Database(format!("Failed to parse outbox entries: {}", e)))?;

        Ok(entries)
    }

    async fn mark_entry(
        &self,
        entry: &OutboxEntry,
        status: OutboxStatus,
        last_error: Option<String>,
        auth_token: &str,
    ) -> Result<(), NotificationError> {
        // Conditional on status so a competing dispatcher cannot double-mark
        let path = format!(
            "/rest/v1/notification_outbox?id=eq.{}&status=eq.queued",
            entry.id
        );
        let update_data = json!({
            "status": status.to_string(),
            "attempts": entry.attempts + 1,
            "last_error": last_error,
            "updated_at": Utc::now().to_rfc3339()
        });

        let _: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(representation_headers()),
        ).await.map_err(|e| NotificationError::Database(e.to_string()))?;

        Ok(())
    }
}
