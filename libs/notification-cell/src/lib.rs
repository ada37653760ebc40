pub mod models;
pub mod services;

pub use models::{
    DispatchStats, NewNotification, NotificationError, NotificationKind, OutboxEntry,
    OutboxStatus,
};
pub use services::mailer::MailRelayClient;
pub use services::outbox::NotificationOutboxService;
pub use services::worker::NotificationWorker;
pub use services::templates;
