use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use assert_matches::assert_matches;

use notification_cell::{
    MailRelayClient, NewNotification, NotificationError, NotificationKind,
    NotificationOutboxService, OutboxStatus,
};
use shared_utils::test_utils::TestConfig;

fn outbox_row(entry_id: Uuid, attempts: i32) -> serde_json::Value {
    json!({
        "id": entry_id,
        "appointment_id": Uuid::new_v4(),
        "kind": "booking_received",
        "recipient": "patient@example.com",
        "subject": "We received your appointment request",
        "html_body": "<html><body>hello</body></html>",
        "status": "queued",
        "attempts": attempts,
        "last_error": null,
        "created_at": "2025-01-01T00:00:00Z",
        "updated_at": "2025-01-01T00:00:00Z"
    })
}

fn config_for(supabase: &MockServer, relay: &MockServer) -> shared_config::AppConfig {
    let mut test_config = TestConfig::with_supabase_url(&supabase.uri());
    test_config.mail_relay_base_url = relay.uri();
    test_config.to_app_config()
}

#[tokio::test]
async fn enqueue_persists_a_queued_row() {
    let mock_server = MockServer::start().await;
    let entry_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/notification_outbox"))
        .and(body_partial_json(json!({
            "kind": "booking_received",
            "status": "queued",
            "attempts": 0
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([outbox_row(entry_id, 0)])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let outbox = NotificationOutboxService::new(&config);

    let entry = outbox.enqueue(
        NewNotification {
            appointment_id: Uuid::new_v4(),
            kind: NotificationKind::BookingReceived,
            recipient: "patient@example.com".to_string(),
            subject: "We received your appointment request".to_string(),
            html_body: "<html><body>hello</body></html>".to_string(),
        },
        "token",
    ).await.unwrap();

    assert_eq!(entry.id, entry_id);
    assert_eq!(entry.status, OutboxStatus::Queued);
    assert_eq!(entry.attempts, 0);
}

#[tokio::test]
async fn dispatch_sends_queued_mail_and_marks_it_sent() {
    let supabase = MockServer::start().await;
    let relay = MockServer::start().await;
    let entry_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/notification_outbox"))
        .and(query_param("status", "eq.queued"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([outbox_row(entry_id, 0)])))
        .mount(&supabase)
        .await;

    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "msg-1" })))
        .expect(1)
        .mount(&relay)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/notification_outbox"))
        .and(query_param("id", format!("eq.{}", entry_id)))
        .and(query_param("status", "eq.queued"))
        .and(body_partial_json(json!({ "status": "sent", "attempts": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&supabase)
        .await;

    let config = config_for(&supabase, &relay);
    let outbox = NotificationOutboxService::new(&config);
    let mailer = MailRelayClient::new(&config).unwrap();

    let stats = outbox.dispatch_due(&mailer, "service-token").await.unwrap();

    assert_eq!(stats.sent, 1);
    assert_eq!(stats.retried, 0);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn relay_failure_requeues_with_recorded_error() {
    let supabase = MockServer::start().await;
    let relay = MockServer::start().await;
    let entry_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/notification_outbox"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([outbox_row(entry_id, 0)])))
        .mount(&supabase)
        .await;

    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(502).set_body_string("relay outage"))
        .mount(&relay)
        .await;

    // First failure stays queued for the next pass
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/notification_outbox"))
        .and(body_partial_json(json!({ "status": "queued", "attempts": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&supabase)
        .await;

    let config = config_for(&supabase, &relay);
    let outbox = NotificationOutboxService::new(&config);
    let mailer = MailRelayClient::new(&config).unwrap();

    let stats = outbox.dispatch_due(&mailer, "service-token").await.unwrap();

    assert_eq!(stats.sent, 0);
    assert_eq!(stats.retried, 1);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn delivery_gives_up_after_the_last_attempt() {
    let supabase = MockServer::start().await;
    let relay = MockServer::start().await;
    let entry_id = Uuid::new_v4();

    // Two attempts already burned; this pass is the third and final one
    Mock::given(method("GET"))
        .and(path("/rest/v1/notification_outbox"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([outbox_row(entry_id, 2)])))
        .mount(&supabase)
        .await;

    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(502).set_body_string("relay outage"))
        .mount(&relay)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/notification_outbox"))
        .and(body_partial_json(json!({ "status": "failed", "attempts": 3 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&supabase)
        .await;

    let config = config_for(&supabase, &relay);
    let outbox = NotificationOutboxService::new(&config);
    let mailer = MailRelayClient::new(&config).unwrap();

    let stats = outbox.dispatch_due(&mailer, "service-token").await.unwrap();

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.retried, 0);
}

#[tokio::test]
async fn mailer_requires_relay_configuration() {
    let mut config = TestConfig::default().to_app_config();
    config.mail_relay_base_url = String::new();
    config.mail_relay_api_token = String::new();

    let result = MailRelayClient::new(&config);
    assert_matches!(result, Err(NotificationError::NotConfigured));
}
