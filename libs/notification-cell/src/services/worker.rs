// libs/notification-cell/src/services/worker.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{error, info};

use shared_config::AppConfig;

use crate::models::NotificationError;
use crate::services::mailer::MailRelayClient;
use crate::services::outbox::NotificationOutboxService;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;

/// Background loop draining the notification outbox. Runs with the
/// service role token so delivery is independent of any caller session.
pub struct NotificationWorker {
    outbox: NotificationOutboxService,
    mailer: MailRelayClient,
    service_token: String,
    poll_interval: Duration,
    is_shutdown: Arc<RwLock<bool>>,
}

impl NotificationWorker {
    pub fn new(config: &AppConfig) -> Result<Self, NotificationError> {
        let mailer = MailRelayClient::new(config)?;

        Ok(Self {
            outbox: NotificationOutboxService::new(config),
            mailer,
            service_token: config.supabase_service_key.clone(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            is_shutdown: Arc::new(RwLock::new(false)),
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn shutdown_handle(&self) -> Arc<RwLock<bool>> {
        Arc::clone(&self.is_shutdown)
    }

    pub async fn run(&self) {
        info!(
            "Notification worker started (poll interval {}s)",
            self.poll_interval.as_secs()
        );

        let mut ticker = tokio::time::interval(self.poll_interval);

        loop {
            ticker.tick().await;

            if *self.is_shutdown.read().await {
                info!("Notification worker shutting down");
                break;
            }

            if let Err(e) = self.outbox.dispatch_due(&self.mailer, &self.service_token).await {
                error!("Outbox dispatch pass failed: {}", e);
            }
        }
    }
}
