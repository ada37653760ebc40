pub mod mailer;
pub mod outbox;
pub mod templates;
pub mod worker;
