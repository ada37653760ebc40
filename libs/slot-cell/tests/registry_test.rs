use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use assert_matches::assert_matches;

use slot_cell::{CreateSlotRequest, SlotError, SlotQuery, SlotRegistryService};
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn slot_request(date: &str, start: &str, end: &str) -> CreateSlotRequest {
    CreateSlotRequest {
        doctor_id: None,
        service_id: Uuid::new_v4(),
        date: date.parse::<NaiveDate>().unwrap(),
        start_time: start.parse::<NaiveTime>().unwrap(),
        end_time: end.parse::<NaiveTime>().unwrap(),
        max_appointments: Some(1),
    }
}

#[tokio::test]
async fn create_slot_rejects_empty_time_range() {
    let config = TestConfig::default().to_app_config();
    let registry = SlotRegistryService::new(&config);

    let request = slot_request("2025-01-10", "10:00:00", "09:00:00");
    let result = registry.create_slot(Uuid::new_v4(), request, "token").await;

    assert_matches!(result, Err(SlotError::InvalidTimeRange(_)));
}

#[tokio::test]
async fn create_slot_rejects_overlapping_window() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let service_id = Uuid::new_v4();

    // Existing 09:00-10:00 window for the same doctor/date
    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_slots"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("date", "eq.2025-01-10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(
                &Uuid::new_v4().to_string(),
                &doctor_id.to_string(),
                &service_id.to_string(),
                "2025-01-10",
                "09:00:00",
                "10:00:00",
                true,
            )
        ])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let registry = SlotRegistryService::new(&config);

    // 09:30-10:30 intersects the existing [09:00, 10:00) window
    let request = slot_request("2025-01-10", "09:30:00", "10:30:00");
    let result = registry.create_slot(doctor_id, request, "token").await;

    assert_matches!(result, Err(SlotError::Overlap));
}

#[tokio::test]
async fn create_slot_allows_adjacent_window() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let service_id = Uuid::new_v4();
    let new_slot_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_slots"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(
                &Uuid::new_v4().to_string(),
                &doctor_id.to_string(),
                &service_id.to_string(),
                "2025-01-10",
                "09:00:00",
                "10:00:00",
                true,
            )
        ])))
        .mount(&mock_server)
        .await;

    // Half-open ranges make 10:00-11:00 butt cleanly against 09:00-10:00
    Mock::given(method("POST"))
        .and(path("/rest/v1/availability_slots"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::slot_response(
                &new_slot_id.to_string(),
                &doctor_id.to_string(),
                &service_id.to_string(),
                "2025-01-10",
                "10:00:00",
                "11:00:00",
                true,
            )
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let registry = SlotRegistryService::new(&config);

    let request = slot_request("2025-01-10", "10:00:00", "11:00:00");
    let slot = registry.create_slot(doctor_id, request, "token").await.unwrap();

    assert_eq!(slot.id, new_slot_id);
    assert!(slot.is_available);
}

#[tokio::test]
async fn get_slot_maps_empty_result_to_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let registry = SlotRegistryService::new(&config);

    let result = registry.get_slot(Uuid::new_v4(), "token").await;
    assert_matches!(result, Err(SlotError::NotFound));
}

#[tokio::test]
async fn delete_slot_refuses_when_appointments_reference_it() {
    let mock_server = MockServer::start().await;
    let slot_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();
    let service_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(
                &slot_id.to_string(),
                &doctor_id.to_string(),
                &service_id.to_string(),
                "2025-01-10",
                "09:00:00",
                "10:00:00",
                false,
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("slot_id", format!("eq.{}", slot_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                &doctor_id.to_string(),
                &service_id.to_string(),
                Some(&slot_id.to_string()),
                "pending",
            )
        ])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let registry = SlotRegistryService::new(&config);

    let result = registry.delete_slot(slot_id, "token").await;
    assert_matches!(result, Err(SlotError::InUse));
}

#[tokio::test]
async fn delete_slot_succeeds_when_unreferenced() {
    let mock_server = MockServer::start().await;
    let slot_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(
                &slot_id.to_string(),
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                "2025-01-10",
                "09:00:00",
                "10:00:00",
                true,
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/availability_slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let registry = SlotRegistryService::new(&config);

    assert!(registry.delete_slot(slot_id, "token").await.is_ok());
}

#[tokio::test]
async fn list_slots_applies_availability_filter() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_slots"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("is_available", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(
                &Uuid::new_v4().to_string(),
                &doctor_id.to_string(),
                &Uuid::new_v4().to_string(),
                "2025-01-10",
                "09:00:00",
                "10:00:00",
                true,
            )
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let registry = SlotRegistryService::new(&config);

    let query = SlotQuery {
        doctor_id: Some(doctor_id),
        service_id: None,
        date: None,
        only_available: Some(true),
    };
    let slots = registry.list_slots(query, "token").await.unwrap();

    assert_eq!(slots.len(), 1);
    assert!(slots[0].is_available);
}
