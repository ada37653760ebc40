use axum::extract::{Extension, Path, State};
use axum::Json;
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::handlers;
use appointment_cell::models::{BookSlotRequest, RejectAppointmentRequest};
use shared_models::error::AppError;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

fn auth_header() -> TypedHeader<Authorization<Bearer>> {
    TypedHeader(Authorization::bearer("test-token").unwrap())
}

#[tokio::test]
async fn patients_cannot_book_for_other_patients() {
    let state = TestConfig::default().to_arc();
    let patient = TestUser::patient("patient@example.com");

    let request = BookSlotRequest {
        patient_id: Uuid::new_v4(), // someone else
        slot_id: Uuid::new_v4(),
        service_id: Uuid::new_v4(),
        modality: None,
        patient_notes: None,
    };

    let result = handlers::book_appointment(
        State(state),
        auth_header(),
        Extension(patient.to_user()),
        Json(request),
    ).await;

    assert!(matches!(result, Err(AppError::Auth(_))));
}

#[tokio::test]
async fn patients_cannot_reject_appointments() {
    let mock_server = MockServer::start().await;
    let patient = TestUser::patient("patient@example.com");
    let appointment_id = Uuid::new_v4();

    // The appointment belongs to this patient, but rejection is a
    // doctor/admin action
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &appointment_id.to_string(),
                &patient.id,
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                None,
                "pending",
            )
        ])))
        .mount(&mock_server)
        .await;

    let state = std::sync::Arc::new(
        TestConfig::with_supabase_url(&mock_server.uri()).to_app_config(),
    );

    let result = handlers::reject_appointment(
        State(state),
        Path(appointment_id),
        auth_header(),
        Extension(patient.to_user()),
        Json(RejectAppointmentRequest {
            rejection_reason: "no".to_string(),
        }),
    ).await;

    assert!(matches!(result, Err(AppError::Auth(_))));
}

#[tokio::test]
async fn doctors_can_reject_their_own_appointments() {
    let mock_server = MockServer::start().await;
    let doctor = TestUser::doctor("doctor@example.com");
    let appointment_id = Uuid::new_v4();
    let service_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &appointment_id.to_string(),
                &Uuid::new_v4().to_string(),
                &doctor.id,
                &service_id.to_string(),
                None,
                "pending",
            )
        ])))
        .mount(&mock_server)
        .await;

    let mut rejected_row = MockSupabaseResponses::appointment_response(
        &appointment_id.to_string(),
        &Uuid::new_v4().to_string(),
        &doctor.id,
        &service_id.to_string(),
        None,
        "rejected",
    );
    rejected_row["rejection_reason"] = json!("Fully booked");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([rejected_row])))
        .mount(&mock_server)
        .await;

    // Notification display lookups and outbox write
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_response(
                &Uuid::new_v4().to_string(),
                "patient@example.com",
                "Pat",
            )
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(
                &doctor.id,
                "doctor@example.com",
                "Dora",
                &service_id.to_string(),
            )
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::service_response(&service_id.to_string(), "Checkup", 30)
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/notification_outbox"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": Uuid::new_v4(),
            "appointment_id": appointment_id,
            "kind": "appointment_rejected",
            "recipient": "patient@example.com",
            "subject": "subject",
            "html_body": "<html></html>",
            "status": "queued",
            "attempts": 0,
            "last_error": null,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        }])))
        .mount(&mock_server)
        .await;

    let state = std::sync::Arc::new(
        TestConfig::with_supabase_url(&mock_server.uri()).to_app_config(),
    );

    let result = handlers::reject_appointment(
        State(state),
        Path(appointment_id),
        auth_header(),
        Extension(doctor.to_user()),
        Json(RejectAppointmentRequest {
            rejection_reason: "Fully booked".to_string(),
        }),
    ).await;

    let Json(body) = result.unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["appointment"]["status"], json!("rejected"));
}
