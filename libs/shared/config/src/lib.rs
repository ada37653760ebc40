use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub supabase_service_key: String,
    pub mail_relay_base_url: String,
    pub mail_relay_api_token: String,
    pub mail_from_address: String,
    pub admin_notify_email: String,
    pub meeting_rooms_base_url: String,
    pub meeting_rooms_api_token: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            mail_relay_base_url: env::var("MAIL_RELAY_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("MAIL_RELAY_BASE_URL not set, using empty value");
                    String::new()
                }),
            mail_relay_api_token: env::var("MAIL_RELAY_API_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("MAIL_RELAY_API_TOKEN not set, using empty value");
                    String::new()
                }),
            mail_from_address: env::var("MAIL_FROM_ADDRESS")
                .unwrap_or_else(|_| {
                    warn!("MAIL_FROM_ADDRESS not set, using default");
                    "no-reply@carelink.example".to_string()
                }),
            admin_notify_email: env::var("ADMIN_NOTIFY_EMAIL")
                .unwrap_or_else(|_| {
                    warn!("ADMIN_NOTIFY_EMAIL not set, using empty value");
                    String::new()
                }),
            meeting_rooms_base_url: env::var("MEETING_ROOMS_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("MEETING_ROOMS_BASE_URL not set, using empty value");
                    String::new()
                }),
            meeting_rooms_api_token: env::var("MEETING_ROOMS_API_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("MEETING_ROOMS_API_TOKEN not set, using empty value");
                    String::new()
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_mailer_configured(&self) -> bool {
        !self.mail_relay_base_url.is_empty()
            && !self.mail_relay_api_token.is_empty()
            && !self.admin_notify_email.is_empty()
    }

    pub fn is_meeting_rooms_configured(&self) -> bool {
        !self.meeting_rooms_base_url.is_empty()
            && !self.meeting_rooms_api_token.is_empty()
    }
}
